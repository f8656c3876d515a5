//! Audit log handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{current_user, AppError, AppState};
use tally_core::AuditEntry;

/// Largest page of audit entries returned at once
const MAX_AUDIT_LIMIT: i64 = 1000;

/// Query parameters for audit log
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
}

fn default_audit_limit() -> i64 {
    100
}

/// GET /api/audit - List the caller's audit log entries
pub async fn list_audit_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQuery>,
    request: Request,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let user_id = current_user(&request)?;
    let limit = params.limit.clamp(1, MAX_AUDIT_LIMIT);

    let entries = state.db.list_audit_log(user_id, limit)?;

    // Audit log - viewing the audit log itself
    state.db.log_audit(
        user_id,
        "list",
        Some("audit_log"),
        None,
        Some(&format!("limit={}", limit)),
    )?;

    Ok(Json(entries))
}
