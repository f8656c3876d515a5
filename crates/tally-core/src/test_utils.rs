//! Test fixtures for tally-core and dependent crates
//!
//! Builders for in-memory models (for the pure calculators) and for seeded
//! databases (for persistence and API tests).

use chrono::{NaiveDate, Utc};

use crate::db::Database;
use crate::models::{
    Budget, CategoryRef, Goal, NewTransaction, Transaction, TransactionType, User,
};

/// An unsaved ledger entry in the given category
pub fn entry(kind: TransactionType, amount: f64, category_id: i64, category: &str) -> Transaction {
    let now = Utc::now();
    Transaction {
        id: 0,
        user_id: 1,
        kind,
        description: format!("{} entry", category),
        amount,
        date: now.date_naive(),
        category_id,
        category: Some(CategoryRef {
            id: category_id,
            name: category.to_string(),
            icon: None,
            color: None,
        }),
        notes: None,
        is_recurring: false,
        recurrence_pattern: None,
        created_at: now,
        updated_at: now,
    }
}

/// An unsaved budget covering June 2024
pub fn budget(amount: f64) -> Budget {
    let now = Utc::now();
    Budget {
        id: 1,
        user_id: 1,
        name: "Monthly budget".to_string(),
        amount,
        start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
        end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or_default(),
        description: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// An unsaved goal; completion follows the amounts
pub fn goal(target_amount: f64, current_amount: f64, deadline: Option<NaiveDate>) -> Goal {
    let now = Utc::now();
    Goal {
        id: 1,
        user_id: 1,
        name: "Emergency fund".to_string(),
        target_amount,
        current_amount,
        deadline,
        description: None,
        category: None,
        icon: None,
        is_active: true,
        is_completed: current_amount >= target_amount,
        completed_date: None,
        created_at: now,
        updated_at: now,
    }
}

/// Fresh database with one user
pub fn db_with_user() -> (Database, User) {
    let db = Database::in_memory().expect("create test database");
    let user = db
        .create_user("test@example.com", "Test User")
        .expect("create test user");
    (db, user)
}

/// Id of the default category with `name`
pub fn default_category(db: &Database, name: &str) -> i64 {
    let conn = db.conn().expect("connection");
    conn.query_row(
        "SELECT id FROM categories WHERE name = ? AND is_default = 1",
        [name],
        |row| row.get(0),
    )
    .unwrap_or_else(|_| panic!("default category {} missing", name))
}

/// Insert a ledger entry in a default category
pub fn add_entry(
    db: &Database,
    user_id: i64,
    kind: TransactionType,
    amount: f64,
    date: NaiveDate,
    category: &str,
) -> Transaction {
    let category_id = default_category(db, category);
    db.create_transaction(
        user_id,
        &NewTransaction {
            kind,
            description: format!("{} on {}", category, date),
            amount,
            date,
            category_id,
            notes: None,
            is_recurring: false,
            recurrence_pattern: None,
        },
    )
    .expect("create test transaction")
}

/// Shorthand for building dates in tests
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}
