//! Category handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{double_option, kind_field};
use crate::{current_user, read_json, AppError, AppState, SuccessResponse};
use tally_core::models::{Category, CategoryUpdate, NewCategory};
use tally_core::validate::{sanitize_optional, sanitize_text};

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
}

/// GET /api/categories - Default categories plus the caller's own
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategoryQuery>,
    request: Request,
) -> Result<Json<Vec<Category>>, AppError> {
    let user_id = current_user(&request)?;
    let kind = params
        .kind
        .as_deref()
        .map(|k| kind_field("type", k))
        .transpose()?;

    let categories = state.db.list_categories(user_id, kind)?;

    state.db.log_audit(
        user_id,
        "list",
        Some("category"),
        None,
        Some(&format!("count={}", categories.len())),
    )?;

    Ok(Json(categories))
}

/// POST /api/categories - Create a user category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let user_id = current_user(&request)?;
    let req: CreateCategoryRequest = read_json(request).await?;

    let new = NewCategory {
        name: sanitize_text(&req.name, 50),
        kind: kind_field("type", &req.kind)?,
        icon: sanitize_optional(req.icon.as_deref(), 50),
        color: sanitize_optional(req.color.as_deref(), 20),
    };
    let category = state.db.create_category(user_id, &new)?;

    state.db.log_audit(
        user_id,
        "create",
        Some("category"),
        Some(category.id),
        Some(&format!("name={}", category.name)),
    )?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/:id - Update a user category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Category>, AppError> {
    let user_id = current_user(&request)?;
    let req: UpdateCategoryRequest = read_json(request).await?;

    let update = CategoryUpdate {
        name: req.name.map(|n| sanitize_text(&n, 50)),
        icon: req.icon.map(|i| sanitize_optional(i.as_deref(), 50)),
        color: req.color.map(|c| sanitize_optional(c.as_deref(), 20)),
    };
    let category = state.db.update_category(user_id, id, &update)?;

    state
        .db
        .log_audit(user_id, "update", Some("category"), Some(id), None)?;

    Ok(Json(category))
}

/// DELETE /api/categories/:id - Delete an unused user category
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_id = current_user(&request)?;

    state.db.delete_category(user_id, id)?;

    state
        .db
        .log_audit(user_id, "delete", Some("category"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
