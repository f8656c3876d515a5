//! Cash-flow projection from recurring entries
//!
//! Each recurring entry is projected once per month on day 15, whatever its
//! recurrence pattern says.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::dates::{add_months, first_day_of_month, month_label};
use crate::db::Database;
use crate::error::Result;
use crate::models::{Transaction, TransactionType};

const PROJECTION_DAY: u32 = 15;

#[derive(Debug, Clone, Serialize)]
pub struct RecurringItem {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastMonth {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub projected_income: f64,
    pub projected_expense: f64,
    pub projected_balance: f64,
    pub recurring_items: Vec<RecurringItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastPeriod {
    pub start_date: NaiveDate,
    pub months: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary {
    pub total_projected_income: f64,
    pub total_projected_expense: f64,
    pub total_projected_balance: f64,
    pub recurring_transactions_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub period: ForecastPeriod,
    pub summary: ForecastSummary,
    pub monthly_forecast: Vec<ForecastMonth>,
    pub generated_at: DateTime<Utc>,
}

/// Project `months` months of recurring entries starting this month
pub fn cash_flow_forecast(
    db: &Database,
    user_id: i64,
    today: NaiveDate,
    months: u32,
) -> Result<ForecastReport> {
    let recurring = db.recurring_transactions(user_id)?;
    let start_date = first_day_of_month(today);

    let monthly_forecast: Vec<ForecastMonth> = (0..months)
        .map(|offset| project_month(add_months(start_date, offset as i32), &recurring))
        .collect();

    let total_projected_income: f64 = monthly_forecast.iter().map(|m| m.projected_income).sum();
    let total_projected_expense: f64 = monthly_forecast.iter().map(|m| m.projected_expense).sum();

    Ok(ForecastReport {
        period: ForecastPeriod { start_date, months },
        summary: ForecastSummary {
            total_projected_income,
            total_projected_expense,
            total_projected_balance: total_projected_income - total_projected_expense,
            recurring_transactions_count: recurring.len(),
        },
        monthly_forecast,
        generated_at: Utc::now(),
    })
}

fn project_month(month_start: NaiveDate, recurring: &[Transaction]) -> ForecastMonth {
    let date = month_start.with_day(PROJECTION_DAY).unwrap_or(month_start);
    let mut projected_income = 0.0;
    let mut projected_expense = 0.0;

    let recurring_items = recurring
        .iter()
        .map(|t| {
            match t.kind {
                TransactionType::Income => projected_income += t.amount,
                TransactionType::Expense => projected_expense += t.amount,
            }
            RecurringItem {
                description: t.description.clone(),
                kind: t.kind,
                amount: t.amount,
                category_id: t.category_id,
                date,
            }
        })
        .collect();

    ForecastMonth {
        year: month_start.year(),
        month: month_start.month(),
        month_name: month_label(month_start),
        projected_income,
        projected_expense,
        projected_balance: projected_income - projected_expense,
        recurring_items,
    }
}
