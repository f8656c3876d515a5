//! Budget handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{date_field, double_option, optional_date};
use crate::{current_user, read_json, AppError, AppState, SuccessResponse};
use tally_core::models::{AllocationInput, Budget, BudgetAllocation, BudgetDetail, BudgetUpdate, NewBudget};
use tally_core::validate::{sanitize_optional, sanitize_text};
use tally_core::BudgetProgress;

#[derive(Debug, Deserialize)]
pub struct BudgetQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub name: String,
    pub amount: f64,
    pub start_date: String,
    pub end_date: String,
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<AllocationInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
    /// Replaces every allocation when present
    pub categories: Option<Vec<AllocationInput>>,
}

/// GET /api/budgets - List budgets, newest period first
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BudgetQuery>,
    request: Request,
) -> Result<Json<Vec<Budget>>, AppError> {
    let user_id = current_user(&request)?;

    let budgets = state.db.list_budgets(user_id, params.include_inactive)?;

    state.db.log_audit(
        user_id,
        "list",
        Some("budget"),
        None,
        Some(&format!("count={}", budgets.len())),
    )?;

    Ok(Json(budgets))
}

/// GET /api/budgets/current - Active budgets whose window contains today
pub async fn get_current_budgets(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<Budget>>, AppError> {
    let user_id = current_user(&request)?;

    let budgets = state
        .db
        .current_budgets(user_id, Utc::now().date_naive())?;

    state.db.log_audit(
        user_id,
        "list",
        Some("budget"),
        None,
        Some(&format!("current, count={}", budgets.len())),
    )?;

    Ok(Json(budgets))
}

/// POST /api/budgets - Create a budget with its allocations
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<BudgetDetail>), AppError> {
    let user_id = current_user(&request)?;
    let req: CreateBudgetRequest = read_json(request).await?;

    let new = NewBudget {
        name: sanitize_text(&req.name, 100),
        amount: req.amount,
        start_date: date_field("start_date", &req.start_date)?,
        end_date: date_field("end_date", &req.end_date)?,
        description: sanitize_optional(req.description.as_deref(), 500),
        categories: req.categories,
    };
    let detail = state.db.create_budget(user_id, &new)?;

    state.db.log_audit(
        user_id,
        "create",
        Some("budget"),
        Some(detail.budget.id),
        Some(&format!(
            "amount={}, allocations={}",
            detail.budget.amount,
            detail.categories.len()
        )),
    )?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/budgets/:id - Budget with its allocations
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<BudgetDetail>, AppError> {
    let user_id = current_user(&request)?;

    let detail = state
        .db
        .get_budget_detail(user_id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Budget {} not found", id)))?;

    state
        .db
        .log_audit(user_id, "view", Some("budget"), Some(id), None)?;

    Ok(Json(detail))
}

/// PUT /api/budgets/:id - Update a budget
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<BudgetDetail>, AppError> {
    let user_id = current_user(&request)?;
    let req: UpdateBudgetRequest = read_json(request).await?;

    let update = BudgetUpdate {
        name: req.name.map(|n| sanitize_text(&n, 100)),
        amount: req.amount,
        start_date: optional_date("start_date", req.start_date.as_deref())?,
        end_date: optional_date("end_date", req.end_date.as_deref())?,
        description: req.description.map(|d| sanitize_optional(d.as_deref(), 500)),
        is_active: req.is_active,
        categories: req.categories,
    };
    let detail = state.db.update_budget(user_id, id, &update)?;

    state
        .db
        .log_audit(user_id, "update", Some("budget"), Some(id), None)?;

    Ok(Json(detail))
}

/// DELETE /api/budgets/:id - Delete a budget and its allocations
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_id = current_user(&request)?;

    state.db.delete_budget(user_id, id)?;

    state
        .db
        .log_audit(user_id, "delete", Some("budget"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/budgets/:id/progress - Spending against the budget and each allocation
pub async fn get_budget_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<BudgetProgress>, AppError> {
    let user_id = current_user(&request)?;

    let progress = state.db.budget_progress(user_id, id)?;

    state.db.log_audit(
        user_id,
        "progress",
        Some("budget"),
        Some(id),
        Some(&format!("status={:?}", progress.status)),
    )?;

    Ok(Json(progress))
}

/// GET /api/budgets/:id/categories - Allocations of one budget
pub async fn get_budget_categories(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Vec<BudgetAllocation>>, AppError> {
    let user_id = current_user(&request)?;

    let allocations = state.db.budget_allocations(user_id, id)?;

    state
        .db
        .log_audit(user_id, "view", Some("budget_categories"), Some(id), None)?;

    Ok(Json(allocations))
}
