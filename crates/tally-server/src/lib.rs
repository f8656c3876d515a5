//! Tally Web Server
//!
//! Axum-based REST API for the Tally personal finance backend.
//!
//! Security features:
//! - Bearer JWT authentication (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input sanitizing and validation with field-level error details
//! - Audit logging for every API access (reads and writes)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use tally_core::db::Database;

mod handlers;

/// Maximum accepted JSON request body (64 KB)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Header naming the acting user when authentication is disabled
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Authorization header for bearer tokens
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// HS256 secret for bearer tokens; required when auth is on
    pub jwt_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            jwt_secret: None,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// The user a request acts as, set by the auth middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

/// Bearer token claims; `sub` is the user id
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Mint a bearer token for `user_id` valid for `ttl_hours`
pub fn issue_token(secret: &str, user_id: i64, ttl_hours: i64) -> anyhow::Result<String> {
    let exp = chrono::Duration::try_hours(ttl_hours)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| anyhow::anyhow!("Token lifetime of {} hours is out of range", ttl_hours))?;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp().max(0) as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Validate a bearer token and return its user id
fn validate_token(token: &str, secret: &str) -> Result<i64, String> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| format!("JWT validation failed: {}", e))?;

    data.claims
        .sub
        .parse()
        .map_err(|_| "JWT subject is not a user id".to_string())
}

/// Authentication middleware - resolves the acting user
///
/// With auth enabled, a `Bearer` token signed with the configured secret is
/// required and must name an existing user. With auth disabled, the user is
/// taken from the `X-User-Id` header, defaulting to user 1.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if !state.config.require_auth {
        let user_id = request
            .headers()
            .get(DEV_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        request.extensions_mut().insert(AuthUser(user_id));
        return next.run(request).await;
    }

    let Some(secret) = state.config.jwt_secret.as_deref() else {
        error!(path = %path, "Authentication required but no JWT secret configured");
        return unauthorized();
    };

    let token = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    let Some(token) = token else {
        warn!(path = %path, "Unauthorized request - no bearer token");
        return unauthorized();
    };

    let user_id = match validate_token(token, secret) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, path = %path, "Invalid bearer token");
            return unauthorized();
        }
    };

    match state.db.get_user(user_id) {
        Ok(Some(_)) => {
            info!(user_id, path = %path, "Authenticated via bearer token");
            request.extensions_mut().insert(AuthUser(user_id));
            next.run(request).await
        }
        Ok(None) => {
            warn!(user_id, path = %path, "Token names an unknown user");
            unauthorized()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// The acting user set by the auth middleware
pub fn current_user(request: &Request) -> Result<i64, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .map(|user| user.0)
        .ok_or_else(|| AppError::unauthorized("Authentication required"))
}

/// Read and parse a JSON request body
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    request: Request,
) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me))
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/summary", get(handlers::get_transactions_summary))
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // Budgets
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::create_budget),
        )
        .route("/budgets/current", get(handlers::get_current_budgets))
        .route(
            "/budgets/:id",
            get(handlers::get_budget)
                .put(handlers::update_budget)
                .delete(handlers::delete_budget),
        )
        .route("/budgets/:id/progress", get(handlers::get_budget_progress))
        .route("/budgets/:id/categories", get(handlers::get_budget_categories))
        // Goals
        .route("/goals", get(handlers::list_goals).post(handlers::create_goal))
        .route(
            "/goals/:id",
            get(handlers::get_goal)
                .put(handlers::update_goal)
                .delete(handlers::delete_goal),
        )
        .route("/goals/:id/progress", get(handlers::get_goal_progress))
        .route(
            "/goals/:id/contributions",
            get(handlers::list_contributions).post(handlers::add_contribution),
        )
        // Reports
        .route("/reports/generate", axum::routing::post(handlers::generate_report))
        .route("/reports/saved", get(handlers::list_saved_reports))
        .route(
            "/reports/saved/:id",
            get(handlers::get_saved_report).delete(handlers::delete_saved_report),
        )
        .route("/reports/saved/:id/export", get(handlers::export_saved_report))
        .route(
            "/reports/schedules",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route(
            "/reports/schedules/:id",
            put(handlers::update_schedule).delete(handlers::delete_schedule),
        )
        // Audit
        .route("/audit", get(handlers::list_audit_log));

    // Build CORS layer
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
}

/// Start the server with the given configuration
pub async fn serve(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("Authentication disabled - do not expose to network!");
    } else if config.jwt_secret.is_none() {
        anyhow::bail!("Authentication is enabled but no JWT secret is configured");
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    /// Per-field validation messages
    details: Option<serde_json::Value>,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            details: None,
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: &str) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::with_status(StatusCode::CONFLICT, msg)
    }

    /// A 400 naming the offending field
    pub fn validation(field: &str, msg: &str) -> Self {
        Self {
            details: Some(serde_json::json!({ field: msg })),
            ..Self::with_status(StatusCode::BAD_REQUEST, &format!("Invalid {}: {}", field, msg))
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = match self.details {
            Some(details) => serde_json::json!({
                "error": self.message,
                "details": details,
            }),
            None => serde_json::json!({
                "error": self.message
            }),
        };

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        use tally_core::Error as CoreError;

        let err = err.into();
        match err.downcast_ref::<CoreError>() {
            Some(CoreError::Validation { field, message }) => Self::validation(field, message),
            Some(CoreError::NotFound(what)) => Self::not_found(&format!("Not found: {}", what)),
            Some(CoreError::Conflict(msg)) => Self::conflict(msg),
            Some(CoreError::InvalidData(msg)) => Self::bad_request(msg),
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                details: None,
                // Keep full error for logging
                internal: Some(err),
            },
        }
    }
}

#[cfg(test)]
mod tests;
