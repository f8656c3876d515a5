//! Savings goal handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{double_option, optional_date};
use crate::{current_user, read_json, AppError, AppState, SuccessResponse};
use tally_core::models::{ContributionResult, Goal, GoalContribution, GoalUpdate, NewContribution, NewGoal};
use tally_core::progress::goal_progress;
use tally_core::reports::GoalWithProgress;
use tally_core::validate::{sanitize_optional, sanitize_text};

#[derive(Debug, Deserialize)]
pub struct GoalQuery {
    #[serde(default)]
    pub include_completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    pub deadline: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ContributionRequest {
    pub amount: f64,
    /// Defaults to today
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/goals - List active goals
pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GoalQuery>,
    request: Request,
) -> Result<Json<Vec<Goal>>, AppError> {
    let user_id = current_user(&request)?;

    let goals = state.db.list_goals(user_id, params.include_completed)?;

    state.db.log_audit(
        user_id,
        "list",
        Some("goal"),
        None,
        Some(&format!("count={}", goals.len())),
    )?;

    Ok(Json(goals))
}

/// POST /api/goals - Create a savings goal
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    let user_id = current_user(&request)?;
    let req: CreateGoalRequest = read_json(request).await?;

    let new = NewGoal {
        name: sanitize_text(&req.name, 100),
        target_amount: req.target_amount,
        current_amount: req.current_amount,
        deadline: optional_date("deadline", req.deadline.as_deref())?,
        description: sanitize_optional(req.description.as_deref(), 500),
        category: sanitize_optional(req.category.as_deref(), 50),
        icon: sanitize_optional(req.icon.as_deref(), 50),
    };
    let goal = state.db.create_goal(user_id, &new)?;

    state.db.log_audit(
        user_id,
        "create",
        Some("goal"),
        Some(goal.id),
        Some(&format!("target={}", goal.target_amount)),
    )?;

    Ok((StatusCode::CREATED, Json(goal)))
}

/// GET /api/goals/:id - Get a single goal
pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Goal>, AppError> {
    let user_id = current_user(&request)?;

    let goal = state
        .db
        .get_goal(user_id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Goal {} not found", id)))?;

    state
        .db
        .log_audit(user_id, "view", Some("goal"), Some(id), None)?;

    Ok(Json(goal))
}

/// PUT /api/goals/:id - Update a goal
pub async fn update_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Goal>, AppError> {
    let user_id = current_user(&request)?;
    let req: UpdateGoalRequest = read_json(request).await?;

    let deadline = match req.deadline {
        Some(value) => Some(optional_date("deadline", value.as_deref())?),
        None => None,
    };

    let update = GoalUpdate {
        name: req.name.map(|n| sanitize_text(&n, 100)),
        target_amount: req.target_amount,
        current_amount: req.current_amount,
        deadline,
        description: req.description.map(|d| sanitize_optional(d.as_deref(), 500)),
        category: req.category.map(|c| sanitize_optional(c.as_deref(), 50)),
        icon: req.icon.map(|i| sanitize_optional(i.as_deref(), 50)),
        is_active: req.is_active,
    };
    let goal = state.db.update_goal(user_id, id, &update)?;

    state.db.log_audit(
        user_id,
        "update",
        Some("goal"),
        Some(id),
        Some(&format!("completed={}", goal.is_completed)),
    )?;

    Ok(Json(goal))
}

/// DELETE /api/goals/:id - Delete a goal and its contributions
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_id = current_user(&request)?;

    state.db.delete_goal(user_id, id)?;

    state
        .db
        .log_audit(user_id, "delete", Some("goal"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/goals/:id/progress - Goal with its progress as of today
pub async fn get_goal_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<GoalWithProgress>, AppError> {
    let user_id = current_user(&request)?;

    let goal = state
        .db
        .get_goal(user_id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Goal {} not found", id)))?;
    let progress = goal_progress(&goal, Utc::now().date_naive());

    state.db.log_audit(
        user_id,
        "progress",
        Some("goal"),
        Some(id),
        Some(&format!("status={:?}", progress.status)),
    )?;

    Ok(Json(GoalWithProgress { goal, progress }))
}

/// GET /api/goals/:id/contributions - Contributions, newest first
pub async fn list_contributions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Vec<GoalContribution>>, AppError> {
    let user_id = current_user(&request)?;

    let contributions = state.db.list_goal_contributions(user_id, id)?;

    state.db.log_audit(
        user_id,
        "list",
        Some("goal_contribution"),
        Some(id),
        Some(&format!("count={}", contributions.len())),
    )?;

    Ok(Json(contributions))
}

/// POST /api/goals/:id/contributions - Add money toward a goal
pub async fn add_contribution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<(StatusCode, Json<ContributionResult>), AppError> {
    let user_id = current_user(&request)?;
    let req: ContributionRequest = read_json(request).await?;

    let new = NewContribution {
        amount: req.amount,
        date: optional_date("date", req.date.as_deref())?,
        notes: sanitize_optional(req.notes.as_deref(), 500),
    };
    let outcome = state.db.add_goal_contribution(user_id, id, &new)?;

    state.db.log_audit(
        user_id,
        "contribute",
        Some("goal"),
        Some(id),
        Some(&format!(
            "amount={}, completed={}",
            outcome.contribution.amount, outcome.goal.is_completed
        )),
    )?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
