//! Authentication-related handlers

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::Json;
use serde::Serialize;

use crate::{current_user, AppError, AppState};
use tally_core::models::User;

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The authenticated user
    pub user: User,
    /// How the user was authenticated
    pub auth_method: String,
}

/// GET /api/me - Get the currently authenticated user
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<MeResponse>, AppError> {
    let user_id = current_user(&request)?;

    let user = state
        .db
        .get_user(user_id)?
        .ok_or_else(|| AppError::not_found(&format!("User {} not found", user_id)))?;

    state
        .db
        .log_audit(user_id, "view", Some("user"), Some(user_id), None)?;

    let auth_method = if state.config.require_auth {
        "bearer_token"
    } else {
        "none"
    };

    Ok(Json(MeResponse {
        user,
        auth_method: auth_method.to_string(),
    }))
}
