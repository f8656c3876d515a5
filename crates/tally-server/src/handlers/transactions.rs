//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{date_field, double_option, kind_field, optional_date};
use crate::{current_user, read_json, AppError, AppState, SuccessResponse};
use tally_core::dates::Period;
use tally_core::db::TransactionFilter;
use tally_core::models::{NewTransaction, Transaction, TransactionPage, TransactionUpdate};
use tally_core::validate::{sanitize_optional, sanitize_text};
use tally_core::TransactionSummary;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category_id: Option<i64>,
    /// Custom start date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Custom end date (YYYY-MM-DD)
    pub end_date: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    /// Search query (description or notes)
    pub search: Option<String>,
    pub is_recurring: Option<bool>,
    /// Sort field, `-` prefix for descending
    pub sort: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub category_id: i64,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub is_recurring: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub recurrence_pattern: Option<Option<String>>,
}

/// GET /api/transactions - Filtered, paginated ledger listing
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionQuery>,
    request: Request,
) -> Result<Json<TransactionPage>, AppError> {
    let user_id = current_user(&request)?;

    let kind = params
        .kind
        .as_deref()
        .map(|k| kind_field("type", k))
        .transpose()?;
    let from = optional_date("start_date", params.start_date.as_deref())?;
    let to = optional_date("end_date", params.end_date.as_deref())?;

    let filter = TransactionFilter::new(user_id)
        .kind(kind)
        .category_id(params.category_id)
        .date_range(from, to)
        .amount_range(params.min_amount, params.max_amount)
        .search(params.search.as_deref())
        .is_recurring(params.is_recurring)
        .sort(params.sort.as_deref());

    let page = state
        .db
        .list_transactions(filter, params.page, params.per_page)?;

    state.db.log_audit(
        user_id,
        "list",
        Some("transaction"),
        None,
        Some(&format!("page={}, count={}", page.page, page.transactions.len())),
    )?;

    Ok(Json(page))
}

/// GET /api/transactions/summary - Totals for a named period
pub async fn get_transactions_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryQuery>,
    request: Request,
) -> Result<Json<TransactionSummary>, AppError> {
    let user_id = current_user(&request)?;
    let period = params
        .period
        .as_deref()
        .map(Period::parse)
        .unwrap_or_default();

    let summary = state
        .db
        .transactions_summary(user_id, period, Utc::now().date_naive())?;

    state.db.log_audit(
        user_id,
        "summary",
        Some("transaction"),
        None,
        Some(&format!("period={}", period)),
    )?;

    Ok(Json(summary))
}

/// POST /api/transactions - Record a ledger entry
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let user_id = current_user(&request)?;
    let req: CreateTransactionRequest = read_json(request).await?;

    let new = NewTransaction {
        kind: kind_field("type", &req.kind)?,
        description: sanitize_text(&req.description, 200),
        amount: req.amount,
        date: date_field("date", &req.date)?,
        category_id: req.category_id,
        notes: sanitize_optional(req.notes.as_deref(), 1000),
        is_recurring: req.is_recurring,
        recurrence_pattern: sanitize_optional(req.recurrence_pattern.as_deref(), 50),
    };
    let transaction = state.db.create_transaction(user_id, &new)?;

    state.db.log_audit(
        user_id,
        "create",
        Some("transaction"),
        Some(transaction.id),
        Some(&format!("type={}, amount={}", transaction.kind, transaction.amount)),
    )?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET /api/transactions/:id - Get a single ledger entry
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Transaction>, AppError> {
    let user_id = current_user(&request)?;

    let transaction = state
        .db
        .get_transaction(user_id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Transaction {} not found", id)))?;

    state
        .db
        .log_audit(user_id, "view", Some("transaction"), Some(id), None)?;

    Ok(Json(transaction))
}

/// PUT /api/transactions/:id - Update fields of a ledger entry
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Transaction>, AppError> {
    let user_id = current_user(&request)?;
    let req: UpdateTransactionRequest = read_json(request).await?;

    let update = TransactionUpdate {
        kind: req.kind.as_deref().map(|k| kind_field("type", k)).transpose()?,
        description: req.description.map(|d| sanitize_text(&d, 200)),
        amount: req.amount,
        date: optional_date("date", req.date.as_deref())?,
        category_id: req.category_id,
        notes: req.notes.map(|n| sanitize_optional(n.as_deref(), 1000)),
        is_recurring: req.is_recurring,
        recurrence_pattern: req
            .recurrence_pattern
            .map(|p| sanitize_optional(p.as_deref(), 50)),
    };
    let transaction = state.db.update_transaction(user_id, id, &update)?;

    state
        .db
        .log_audit(user_id, "update", Some("transaction"), Some(id), None)?;

    Ok(Json(transaction))
}

/// DELETE /api/transactions/:id - Delete a ledger entry
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_id = current_user(&request)?;

    state.db.delete_transaction(user_id, id)?;

    state
        .db
        .log_audit(user_id, "delete", Some("transaction"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
