//! Integration tests for tally-core
//!
//! These tests exercise the ledger → report → save → export workflow against
//! an on-disk database.

use chrono::NaiveDate;
use tally_core::{
    db::Database,
    export_report, generate_report,
    models::{AllocationInput, NewBudget, NewContribution, NewGoal, NewTransaction, ReportType, TransactionType},
    reports::Trend,
    ExportFormat, Report, ReportParameters,
};
use tempfile::TempDir;

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn open_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tally.db");
    let db = Database::new(path.to_str().unwrap()).expect("Failed to open database");
    (dir, db)
}

fn category_id(db: &Database, user_id: i64, name: &str) -> i64 {
    db.list_categories(user_id, None)
        .unwrap()
        .into_iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("category {} missing", name))
        .id
}

fn record(
    db: &Database,
    user_id: i64,
    kind: TransactionType,
    amount: f64,
    date: NaiveDate,
    category: &str,
    is_recurring: bool,
) {
    let category_id = category_id(db, user_id, category);
    db.create_transaction(
        user_id,
        &NewTransaction {
            kind,
            description: format!("{} payment", category),
            amount,
            date,
            category_id,
            notes: None,
            is_recurring,
            recurrence_pattern: is_recurring.then(|| "monthly".to_string()),
        },
    )
    .expect("Failed to record transaction");
}

fn to_json(report: &Report) -> serde_json::Value {
    serde_json::to_value(report).unwrap()
}

// =============================================================================
// Report generation
// =============================================================================

#[test]
fn test_summary_report_workflow() {
    let (_dir, db) = open_db();
    let user = db.create_user("ana@example.com", "Ana").unwrap();
    let today = ymd(2024, 6, 20);

    record(&db, user.id, TransactionType::Income, 3000.0, ymd(2024, 6, 1), "Salary", true);
    record(&db, user.id, TransactionType::Expense, 1200.0, ymd(2024, 6, 2), "Housing", true);
    record(&db, user.id, TransactionType::Expense, 300.0, ymd(2024, 6, 9), "Food", false);
    record(&db, user.id, TransactionType::Expense, 45.0, ymd(2024, 5, 30), "Food", false);

    let params = ReportParameters {
        period: Some("month".into()),
        ..Default::default()
    };
    let report = generate_report(&db, user.id, ReportType::Summary, &params, today).unwrap();
    assert_eq!(report.report_type(), ReportType::Summary);

    let json = to_json(&report);
    assert_eq!(json["period"]["start_date"], "2024-06-01");
    assert_eq!(json["period"]["end_date"], "2024-06-30");
    assert_eq!(json["period"]["days"], 30);
    assert_eq!(json["summary"]["income"], 3000.0);
    assert_eq!(json["summary"]["expense"], 1500.0);
    assert_eq!(json["summary"]["savings_rate"], 50.0);
    assert_eq!(json["averages"]["daily_income"], 100.0);
    assert_eq!(json["averages"]["daily_expense"], 50.0);
    assert_eq!(json["categories"]["expense"][0]["name"], "Housing");
    assert_eq!(json["transaction_count"], 3);
    assert!(json["generated_at"].is_string());
}

#[test]
fn test_category_report_shares() {
    let (_dir, db) = open_db();
    let user = db.create_user("ana@example.com", "Ana").unwrap();

    record(&db, user.id, TransactionType::Expense, 75.0, ymd(2024, 6, 3), "Food", false);
    record(&db, user.id, TransactionType::Expense, 25.0, ymd(2024, 6, 4), "Food", false);
    record(&db, user.id, TransactionType::Expense, 300.0, ymd(2024, 6, 5), "Housing", false);
    record(&db, user.id, TransactionType::Income, 999.0, ymd(2024, 6, 5), "Salary", false);

    let params = ReportParameters {
        start_date: Some("2024-06-01".into()),
        end_date: Some("2024-06-30".into()),
        ..Default::default()
    };
    let Report::Category(report) =
        generate_report(&db, user.id, ReportType::Category, &params, ymd(2024, 7, 1)).unwrap()
    else {
        panic!("expected category report");
    };

    assert_eq!(report.kind, TransactionType::Expense);
    assert_eq!(report.total_amount, 400.0);
    assert_eq!(report.transaction_count, 3);
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].name, "Housing");
    assert_eq!(report.categories[0].percentage, 75.0);
    assert_eq!(report.categories[1].transaction_count, 2);
    assert_eq!(report.categories[1].transactions.len(), 2);

    let income = ReportParameters {
        category_type: Some("income".into()),
        ..params
    };
    let json = to_json(
        &generate_report(&db, user.id, ReportType::Category, &income, ymd(2024, 7, 1)).unwrap(),
    );
    assert_eq!(json["type"], "income");
    assert_eq!(json["categories"][0]["percentage"], 100.0);
}

#[test]
fn test_monthly_report_identical_months_are_stable() {
    let (_dir, db) = open_db();
    let user = db.create_user("ana@example.com", "Ana").unwrap();

    for month in 1..=6 {
        record(&db, user.id, TransactionType::Income, 3000.0, ymd(2024, month, 5), "Salary", false);
        record(&db, user.id, TransactionType::Expense, 2000.0, ymd(2024, month, 10), "Housing", false);
    }

    let params = ReportParameters {
        start_month: Some("2024-01".into()),
        months_count: Some(6),
        ..Default::default()
    };
    let Report::Monthly(report) =
        generate_report(&db, user.id, ReportType::Monthly, &params, ymd(2024, 7, 15)).unwrap()
    else {
        panic!("expected monthly report");
    };

    assert_eq!(report.trends.income, Trend::Stable);
    assert_eq!(report.trends.expense, Trend::Stable);
    assert_eq!(report.trends.balance, Trend::Stable);
    assert_eq!(report.monthly_data.len(), 6);
    assert_eq!(report.monthly_data[0].month_name, "Jan 2024");
    assert_eq!(report.period.end_date, ymd(2024, 6, 30));
    assert_eq!(report.summary.total_balance, 6000.0);
    assert_eq!(report.summary.avg_monthly_income, 3000.0);
    // Ties keep the first month
    assert_eq!(report.summary.best_month.as_ref().unwrap().month, 1);
    assert_eq!(report.summary.worst_month.as_ref().unwrap().month, 1);
}

#[test]
fn test_budget_report_counts_allocated_categories_in_window() {
    let (_dir, db) = open_db();
    let user = db.create_user("ana@example.com", "Ana").unwrap();
    let food = category_id(&db, user.id, "Food");

    db.create_budget(
        user.id,
        &NewBudget {
            name: "Groceries".to_string(),
            amount: 1000.0,
            start_date: ymd(2024, 5, 15),
            end_date: ymd(2024, 6, 30),
            description: None,
            categories: vec![AllocationInput { category_id: food, amount: 600.0 }],
        },
    )
    .unwrap();

    // Before the report window
    record(&db, user.id, TransactionType::Expense, 500.0, ymd(2024, 5, 20), "Food", false);
    record(&db, user.id, TransactionType::Expense, 700.0, ymd(2024, 6, 10), "Food", false);
    // Unallocated category
    record(&db, user.id, TransactionType::Expense, 250.0, ymd(2024, 6, 11), "Transport", false);

    let params = ReportParameters {
        start_date: Some("2024-06-01".into()),
        end_date: Some("2024-06-30".into()),
        ..Default::default()
    };
    let json = to_json(
        &generate_report(&db, user.id, ReportType::Budget, &params, ymd(2024, 6, 15)).unwrap(),
    );

    assert_eq!(json["budget_count"], 1);
    let item = &json["budgets"][0];
    assert_eq!(item["period"]["start_date"], "2024-06-01");
    assert_eq!(item["period"]["days"], 30);
    assert_eq!(item["total_spent"], 700.0);
    assert_eq!(item["percentage"], 70.0);
    assert_eq!(item["status"], "on_track");
    assert_eq!(item["categories"][0]["spent"], 700.0);
    assert_eq!(item["categories"][0]["percentage"], 100.0);
    assert_eq!(item["categories"][0]["status"], "exceeded");
}

#[test]
fn test_goals_report_after_contribution() {
    let (_dir, db) = open_db();
    let user = db.create_user("ana@example.com", "Ana").unwrap();
    let today = ymd(2024, 6, 1);

    let vacation = db
        .create_goal(
            user.id,
            &NewGoal {
                name: "Vacation".to_string(),
                target_amount: 1000.0,
                current_amount: 900.0,
                deadline: Some(ymd(2024, 12, 31)),
                description: None,
                category: None,
                icon: None,
            },
        )
        .unwrap();
    db.create_goal(
        user.id,
        &NewGoal {
            name: "New laptop".to_string(),
            target_amount: 1000.0,
            current_amount: 400.0,
            deadline: Some(ymd(2024, 6, 21)),
            description: None,
            category: None,
            icon: None,
        },
    )
    .unwrap();

    let outcome = db
        .add_goal_contribution(
            user.id,
            vacation.id,
            &NewContribution { amount: 200.0, date: Some(today), notes: None },
        )
        .unwrap();
    assert_eq!(outcome.goal.current_amount, 1100.0);
    assert!(outcome.goal.is_completed);
    assert_eq!(outcome.goal.completed_date, Some(today));

    let json = to_json(
        &generate_report(&db, user.id, ReportType::Goals, &ReportParameters::default(), today)
            .unwrap(),
    );
    assert_eq!(json["summary"]["total_goals"], 2);
    assert_eq!(json["summary"]["completed_goals"], 1);
    assert_eq!(json["summary"]["at_risk_goals"], 1);
    assert_eq!(json["summary"]["completion_rate"], 50.0);

    let laptop = &json["goals"][1]["progress"];
    assert_eq!(laptop["percentage"], 40.0);
    assert_eq!(laptop["days_remaining"], 20);
    assert_eq!(laptop["remaining_amount"], 600.0);
    assert_eq!(laptop["daily_amount_needed"], 30.0);
    assert_eq!(laptop["status"], "at_risk");

    let completed = &json["goals"][0]["progress"];
    assert_eq!(completed["status"], "completed");
    assert!(completed.get("days_remaining").is_none());
}

#[test]
fn test_cash_flow_forecast() {
    let (_dir, db) = open_db();
    let user = db.create_user("ana@example.com", "Ana").unwrap();

    record(&db, user.id, TransactionType::Income, 3000.0, ymd(2024, 5, 1), "Salary", true);
    record(&db, user.id, TransactionType::Expense, 1200.0, ymd(2024, 5, 3), "Housing", true);
    record(&db, user.id, TransactionType::Expense, 80.0, ymd(2024, 5, 9), "Food", false);

    let params = ReportParameters {
        months: Some(3),
        ..Default::default()
    };
    let json = to_json(
        &generate_report(&db, user.id, ReportType::CashFlowForecast, &params, ymd(2024, 6, 20))
            .unwrap(),
    );

    assert_eq!(json["period"]["start_date"], "2024-06-01");
    assert_eq!(json["period"]["months"], 3);
    assert_eq!(json["summary"]["recurring_transactions_count"], 2);
    assert_eq!(json["summary"]["total_projected_income"], 9000.0);
    assert_eq!(json["summary"]["total_projected_balance"], 5400.0);
    assert_eq!(json["monthly_forecast"][2]["month_name"], "Aug 2024");
    assert_eq!(json["monthly_forecast"][0]["recurring_items"][0]["date"], "2024-06-15");
}

#[test]
fn test_every_report_type_generates_for_empty_ledger() {
    let (_dir, db) = open_db();
    let user = db.create_user("ana@example.com", "Ana").unwrap();

    for report_type in ReportType::all() {
        let report = generate_report(
            &db,
            user.id,
            *report_type,
            &ReportParameters::default(),
            ymd(2024, 2, 29),
        )
        .unwrap();
        assert_eq!(report.report_type(), *report_type);
    }
}

// =============================================================================
// Save and export
// =============================================================================

#[test]
fn test_saved_report_round_trip_and_export() {
    let (_dir, db) = open_db();
    let user = db.create_user("ana@example.com", "Ana").unwrap();
    record(&db, user.id, TransactionType::Income, 2500.25, ymd(2024, 6, 1), "Salary", false);
    record(&db, user.id, TransactionType::Expense, 410.1, ymd(2024, 6, 4), "Food", false);
    record(&db, user.id, TransactionType::Expense, 95.0, ymd(2024, 6, 7), "Transport", false);

    let params = ReportParameters {
        period: Some("month".into()),
        ..Default::default()
    };
    let report = generate_report(&db, user.id, ReportType::Summary, &params, ymd(2024, 6, 20)).unwrap();
    let data = serde_json::to_string(&report).unwrap();

    let saved = db
        .save_report(
            user.id,
            "June summary",
            report.report_type(),
            &serde_json::to_value(&params).unwrap(),
            &data,
            report.generated_at(),
        )
        .unwrap();
    let fetched = db.get_report(user.id, saved.id).unwrap().unwrap();
    assert_eq!(fetched.data.get(), data);
    assert_eq!(fetched.parameters["period"], "month");

    let csv = export_report(&fetched, ExportFormat::Csv).unwrap();
    let text = String::from_utf8(csv.bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "id,name,icon,total");
    assert!(lines[1].contains(",Food,"));
    assert!(lines[2].contains(",Transport,"));
    assert_eq!(lines.len(), 3);

    let json = export_report(&fetched, ExportFormat::Json).unwrap();
    let reparsed: serde_json::Value = serde_json::from_slice(&json.bytes).unwrap();
    assert_eq!(reparsed, serde_json::from_str::<serde_json::Value>(&data).unwrap());
}

#[test]
fn test_database_reopens_with_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");
    let path = path.to_str().unwrap();

    let user_id = {
        let db = Database::new(path).unwrap();
        let user = db.create_user("ana@example.com", "Ana").unwrap();
        record(&db, user.id, TransactionType::Expense, 12.5, ymd(2024, 6, 1), "Food", false);
        user.id
    };

    let db = Database::new(path).unwrap();
    assert_eq!(db.list_categories(user_id, None).unwrap().len(), 12);
    let totals = db
        .aggregate_transactions(
            user_id,
            &tally_core::db::AggregateFilter::new(ymd(2024, 6, 1), ymd(2024, 6, 30)),
        )
        .unwrap();
    assert_eq!(totals.expense_total, 12.5);
}
