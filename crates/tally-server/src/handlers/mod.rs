//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::AppError;
use tally_core::dates::parse_date;
use tally_core::models::TransactionType;

pub mod audit;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod goals;
pub mod reports;
pub mod transactions;

// Re-export all handlers for use in router
pub use audit::*;
pub use auth::*;
pub use budgets::*;
pub use categories::*;
pub use goals::*;
pub use reports::*;
pub use transactions::*;

/// Deserialize a nullable field so that absent, `null` and a value differ
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`: absent
/// gives `None`, `null` gives `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse a required date field
pub(crate) fn date_field(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    parse_date(value).ok_or_else(|| AppError::validation(field, "invalid date"))
}

/// Parse an optional date field
pub(crate) fn optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    value.map(|v| date_field(field, v)).transpose()
}

/// Parse an `income`/`expense` token
pub(crate) fn kind_field(field: &str, value: &str) -> Result<TransactionType, AppError> {
    value
        .parse()
        .map_err(|_| AppError::validation(field, "must be 'income' or 'expense'"))
}
