//! Report generation, saved report and schedule handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::double_option;
use crate::{current_user, read_json, AppError, AppState, SuccessResponse};
use tally_core::models::{
    DeliveryMethod, Frequency, NewSchedule, ReportSchedule, ReportType, SavedReport,
    SavedReportSummary, ScheduleUpdate,
};
use tally_core::reports::{generate_report as build_report, parse_report_type, ReportParameters};
use tally_core::validate::{sanitize_optional, sanitize_text};
use tally_core::{export_report, ExportFormat};

/// Largest page of saved reports returned at once
const MAX_SAVED_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    #[serde(rename = "type")]
    pub report_type: String,
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub save: bool,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SavedReportsQuery {
    #[serde(default = "default_saved_limit")]
    pub limit: i64,
}

fn default_saved_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub name: String,
    pub report_type: String,
    pub frequency: String,
    pub delivery_method: String,
    pub email: Option<String>,
    pub parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub report_type: Option<String>,
    pub frequency: Option<String>,
    pub delivery_method: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    pub parameters: Option<Value>,
    pub is_active: Option<bool>,
}

fn report_type_field(field: &str, value: &str) -> Result<ReportType, AppError> {
    value
        .parse()
        .map_err(|_| AppError::validation(field, "unknown report type"))
}

fn frequency_field(value: &str) -> Result<Frequency, AppError> {
    value
        .parse()
        .map_err(|_| AppError::validation("frequency", "must be 'daily', 'weekly' or 'monthly'"))
}

fn delivery_field(value: &str) -> Result<DeliveryMethod, AppError> {
    value
        .parse()
        .map_err(|_| AppError::validation("delivery_method", "must be 'email' or 'download'"))
}

/// POST /api/reports/generate - Generate a report and optionally save it
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Value>, AppError> {
    let user_id = current_user(&request)?;
    let req: GenerateReportRequest = read_json(request).await?;

    let report_type = parse_report_type(&req.report_type)?;
    let raw_parameters = req
        .parameters
        .unwrap_or_else(|| Value::Object(Default::default()));
    let parameters: ReportParameters = serde_json::from_value(raw_parameters.clone())
        .map_err(|e| AppError::validation("parameters", &e.to_string()))?;

    let report = build_report(
        &state.db,
        user_id,
        report_type,
        &parameters,
        Utc::now().date_naive(),
    )?;
    let data = serde_json::to_string(&report)?;
    let mut body: Value = serde_json::from_str(&data)?;

    let mut saved_id = None;
    if req.save {
        if let Some(name) = req.name.as_deref() {
            let saved = state.db.save_report(
                user_id,
                name,
                report_type,
                &raw_parameters,
                &data,
                report.generated_at(),
            )?;
            if let Value::Object(map) = &mut body {
                map.insert("report_id".to_string(), Value::from(saved.id));
                map.insert("saved".to_string(), Value::Bool(true));
            }
            saved_id = Some(saved.id);
        }
    }

    state.db.log_audit(
        user_id,
        "report",
        Some("report"),
        saved_id,
        Some(&format!("type={}, saved={}", report_type, saved_id.is_some())),
    )?;

    Ok(Json(body))
}

/// GET /api/reports/saved - Saved reports without their data, newest first
pub async fn list_saved_reports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SavedReportsQuery>,
    request: Request,
) -> Result<Json<Vec<SavedReportSummary>>, AppError> {
    let user_id = current_user(&request)?;
    let limit = params.limit.clamp(1, MAX_SAVED_LIMIT);

    let reports = state.db.list_reports(user_id, limit)?;

    state.db.log_audit(
        user_id,
        "list",
        Some("report"),
        None,
        Some(&format!("count={}", reports.len())),
    )?;

    Ok(Json(reports))
}

/// GET /api/reports/saved/:id - A saved report with its stored data
pub async fn get_saved_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SavedReport>, AppError> {
    let user_id = current_user(&request)?;

    let report = state
        .db
        .get_report(user_id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Report {} not found", id)))?;

    state
        .db
        .log_audit(user_id, "view", Some("report"), Some(id), None)?;

    Ok(Json(report))
}

/// DELETE /api/reports/saved/:id - Delete a saved report
pub async fn delete_saved_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_id = current_user(&request)?;

    state.db.delete_report(user_id, id)?;

    state
        .db
        .log_audit(user_id, "delete", Some("report"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/reports/saved/:id/export - Download a saved report as JSON or CSV
pub async fn export_saved_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ExportQuery>,
    request: Request,
) -> Result<Response, AppError> {
    let user_id = current_user(&request)?;
    let format: ExportFormat = params
        .format
        .as_deref()
        .unwrap_or("json")
        .parse()
        .map_err(|_| AppError::validation("format", "must be 'json' or 'csv'"))?;

    let report = state
        .db
        .get_report(user_id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Report {} not found", id)))?;
    let exported = export_report(&report, format)?;

    state.db.log_audit(
        user_id,
        "export",
        Some("report"),
        Some(id),
        Some(&format!("format={}", format.extension())),
    )?;

    let disposition = format!("attachment; filename=\"{}\"", exported.filename);
    Ok((
        [
            (header::CONTENT_TYPE, exported.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.bytes,
    )
        .into_response())
}

/// GET /api/reports/schedules - Active schedules, soonest first
pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<ReportSchedule>>, AppError> {
    let user_id = current_user(&request)?;

    let schedules = state.db.list_report_schedules(user_id)?;

    state.db.log_audit(
        user_id,
        "list",
        Some("report_schedule"),
        None,
        Some(&format!("count={}", schedules.len())),
    )?;

    Ok(Json(schedules))
}

/// POST /api/reports/schedules - Create a report schedule
pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<ReportSchedule>), AppError> {
    let user_id = current_user(&request)?;
    let req: CreateScheduleRequest = read_json(request).await?;

    let new = NewSchedule {
        name: sanitize_text(&req.name, 100),
        report_type: report_type_field("report_type", &req.report_type)?,
        frequency: frequency_field(&req.frequency)?,
        delivery_method: delivery_field(&req.delivery_method)?,
        email: sanitize_optional(req.email.as_deref(), 254),
        parameters: req
            .parameters
            .unwrap_or_else(|| Value::Object(Default::default())),
    };
    let schedule = state
        .db
        .create_report_schedule(user_id, &new, Utc::now())?;

    state.db.log_audit(
        user_id,
        "create",
        Some("report_schedule"),
        Some(schedule.id),
        Some(&format!(
            "type={}, frequency={}",
            schedule.report_type, schedule.frequency
        )),
    )?;

    Ok((StatusCode::CREATED, Json(schedule)))
}

/// PUT /api/reports/schedules/:id - Update a report schedule
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<ReportSchedule>, AppError> {
    let user_id = current_user(&request)?;
    let req: UpdateScheduleRequest = read_json(request).await?;

    let update = ScheduleUpdate {
        name: req.name.map(|n| sanitize_text(&n, 100)),
        report_type: req
            .report_type
            .as_deref()
            .map(|t| report_type_field("report_type", t))
            .transpose()?,
        frequency: req.frequency.as_deref().map(frequency_field).transpose()?,
        delivery_method: req
            .delivery_method
            .as_deref()
            .map(delivery_field)
            .transpose()?,
        email: req.email.map(|e| sanitize_optional(e.as_deref(), 254)),
        parameters: req.parameters,
        is_active: req.is_active,
    };
    let schedule = state
        .db
        .update_report_schedule(user_id, id, &update, Utc::now())?;

    state
        .db
        .log_audit(user_id, "update", Some("report_schedule"), Some(id), None)?;

    Ok(Json(schedule))
}

/// DELETE /api/reports/schedules/:id - Delete a report schedule
pub async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_id = current_user(&request)?;

    state.db.delete_report_schedule(user_id, id)?;

    state
        .db
        .log_audit(user_id, "delete", Some("report_schedule"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
