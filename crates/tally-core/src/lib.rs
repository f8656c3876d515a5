//! Tally Core Library
//!
//! Shared functionality for the Tally personal finance tool:
//! - Database access and migrations
//! - Categories, ledger entries, budgets and savings goals
//! - Date-range resolution and ledger aggregation
//! - Budget and goal progress calculators
//! - Report generators, saved reports and schedules
//! - JSON and CSV export of saved reports

pub mod aggregate;
pub mod calc;
pub mod dates;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod progress;
pub mod reports;
pub mod validate;

/// Fixtures shared by unit and API tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{LedgerTotals, TransactionSummary};
pub use dates::Period;
pub use db::{AuditEntry, Database, TransactionFilter};
pub use error::{Error, Result};
pub use export::{export_report, ExportFormat, ExportedReport};
pub use progress::{BudgetProgress, GoalProgress, GoalStatus};
pub use reports::{generate_report, Report, ReportParameters};
