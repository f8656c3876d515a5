//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::json;
use tally_core::dates::{date_range, Period};
use tally_core::models::TransactionType;
use tally_core::test_utils::{add_entry, db_with_user, default_category};
use tower::ServiceExt;

const TEST_SECRET: &str = "test-secret";

fn setup_test_app() -> Router {
    setup_test_app_with(|_| {})
}

/// Router over a database with user 1 plus whatever `seed` adds
fn setup_test_app_with(seed: impl FnOnce(&Database)) -> Router {
    let (db, _user) = db_with_user();
    seed(&db);
    let config = ServerConfig {
        require_auth: false,
        allowed_origins: vec![],
        ..Default::default()
    };
    create_router(db, config)
}

fn setup_auth_app() -> Router {
    let (db, _user) = db_with_user();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        jwt_secret: Some(TEST_SECRET.to_string()),
    };
    create_router(db, config)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn today() -> String {
    Utc::now().date_naive().to_string()
}

async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn create_expense(app: &Router, category_id: i64, amount: f64) -> serde_json::Value {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/transactions",
            json!({
                "type": "expense",
                "description": "Weekly groceries",
                "amount": amount,
                "date": today(),
                "category_id": category_id,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    get_body_json(response).await
}

// ========== Auth API Tests ==========

#[tokio::test]
async fn test_get_me_without_auth() {
    let app = setup_test_app();

    let response = send(&app, get("/api/me")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["user"]["id"], 1);
    assert_eq!(json["user"]["email"], "test@example.com");
    assert_eq!(json["auth_method"], "none");
}

#[tokio::test]
async fn test_auth_required_without_token() {
    let app = setup_auth_app();

    let response = send(&app, get("/api/me")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn test_auth_with_valid_token() {
    let app = setup_auth_app();
    let token = issue_token(TEST_SECRET, 1, 1).unwrap();

    let response = send(
        &app,
        Request::builder()
            .uri("/api/me")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["user"]["id"], 1);
    assert_eq!(json["auth_method"], "bearer_token");
}

#[test]
fn test_issue_token_rejects_out_of_range_lifetime() {
    assert!(issue_token(TEST_SECRET, 1, i64::MAX).is_err());
    assert!(issue_token(TEST_SECRET, 1, 24 * 365).is_ok());
}

#[tokio::test]
async fn test_auth_rejects_bad_tokens() {
    let app = setup_auth_app();

    let wrong_secret = issue_token("another-secret", 1, 1).unwrap();
    let unknown_user = issue_token(TEST_SECRET, 99, 1).unwrap();
    for token in [wrong_secret, unknown_user, "garbage".to_string()] {
        let response = send(
            &app,
            Request::builder()
                .uri("/api/categories")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = setup_test_app();

    let response = send(&app, get("/api/me")).await;
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.get("content-security-policy").is_some());
}

// ========== Category API Tests ==========

#[tokio::test]
async fn test_list_categories_by_type() {
    let app = setup_test_app();

    let response = send(&app, get("/api/categories")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await.as_array().unwrap().len(), 12);

    let response = send(&app, get("/api/categories?type=income")).await;
    let json = get_body_json(response).await;
    let categories = json.as_array().unwrap();
    assert_eq!(categories.len(), 4);
    assert!(categories.iter().all(|c| c["type"] == "income"));

    let response = send(&app, get("/api/categories?type=savings")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_crud() {
    let app = setup_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/categories",
            json!({"name": "  <Pets>  ", "type": "expense", "icon": "paw"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = get_body_json(response).await;
    assert_eq!(created["name"], "Pets");
    assert_eq!(created["is_default"], false);
    let id = created["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/categories/{}", id),
            json!({"name": "Pet care", "icon": null}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = get_body_json(response).await;
    assert_eq!(updated["name"], "Pet care");
    assert!(updated["icon"].is_null());

    let response = send(&app, delete(&format!("/api/categories/{}", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["success"], true);

    let response = send(&app, delete(&format!("/api/categories/{}", id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_default_category_is_read_only() {
    let mut food = 0;
    let app = setup_test_app_with(|db| food = default_category(db, "Food"));

    let response = send(
        &app,
        json_request("PUT", &format!("/api/categories/{}", food), json!({"name": "Meals"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, delete(&format!("/api/categories/{}", food))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ========== Transaction API Tests ==========

#[tokio::test]
async fn test_create_transaction() {
    let mut food = 0;
    let app = setup_test_app_with(|db| food = default_category(db, "Food"));

    let created = create_expense(&app, food, 42.5).await;
    assert_eq!(created["type"], "expense");
    assert_eq!(created["amount"], 42.5);
    assert_eq!(created["category"]["name"], "Food");
    assert_eq!(created["date"], today());
}

#[tokio::test]
async fn test_create_transaction_validation_names_field() {
    let mut food = 0;
    let app = setup_test_app_with(|db| food = default_category(db, "Food"));

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/transactions",
            json!({
                "type": "expense",
                "description": "Coffee",
                "amount": 0.0,
                "date": today(),
                "category_id": food,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["details"]["amount"].is_string());

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/transactions",
            json!({
                "type": "expense",
                "description": "Coffee",
                "amount": 3.5,
                "date": "2024-02-30",
                "category_id": food,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["details"]["date"].is_string());

    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/transactions")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get_body_json(response).await["error"], "Invalid JSON");
}

#[tokio::test]
async fn test_income_in_expense_category_rejected() {
    let mut food = 0;
    let app = setup_test_app_with(|db| food = default_category(db, "Food"));

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/transactions",
            json!({
                "type": "income",
                "description": "Refund",
                "amount": 10.0,
                "date": today(),
                "category_id": food,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(get_body_json(response).await["details"]["category_id"].is_string());
}

#[tokio::test]
async fn test_transaction_of_other_user_is_not_found() {
    let mut food = 0;
    let app = setup_test_app_with(|db| {
        food = default_category(db, "Food");
        db.create_user("other@example.com", "Other").unwrap();
    });

    let created = create_expense(&app, food, 12.0).await;
    let id = created["id"].as_i64().unwrap();

    let response = send(
        &app,
        Request::builder()
            .uri(format!("/api/transactions/{}", id))
            .header(DEV_USER_HEADER, "2")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get(&format!("/api/transactions/{}", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_and_delete_transaction() {
    let mut food = 0;
    let app = setup_test_app_with(|db| food = default_category(db, "Food"));

    let created = create_expense(&app, food, 20.0).await;
    let id = created["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/transactions/{}", id),
            json!({"amount": 25.0, "notes": "split with a friend"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = get_body_json(response).await;
    assert_eq!(updated["amount"], 25.0);
    assert_eq!(updated["notes"], "split with a friend");
    assert_eq!(updated["description"], "Weekly groceries");

    let response = send(&app, delete(&format!("/api/transactions/{}", id))).await;
    assert_eq!(get_body_json(response).await["success"], true);

    let response = send(&app, get(&format!("/api/transactions/{}", id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_transactions_filters_and_pages() {
    let mut food = 0;
    let app = setup_test_app_with(|db| {
        food = default_category(db, "Food");
        let today = Utc::now().date_naive();
        for amount in [5.0, 15.0, 25.0] {
            add_entry(db, 1, TransactionType::Expense, amount, today, "Food");
        }
        add_entry(db, 1, TransactionType::Income, 1000.0, today, "Salary");
    });

    let response = send(&app, get("/api/transactions?type=expense&sort=amount")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 3);
    let amounts: Vec<f64> = json["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["amount"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![5.0, 15.0, 25.0]);

    let response = send(
        &app,
        get(&format!("/api/transactions?category_id={}&min_amount=10&per_page=1&page=2", food)),
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["pages"], 2);
    assert_eq!(json["transactions"].as_array().unwrap().len(), 1);

    let response = send(&app, get("/api/transactions?start_date=yesterday")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, get("/api/transactions?page=9223372036854775807")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["details"]["page"].is_string());
}

#[tokio::test]
async fn test_transactions_summary() {
    let app = setup_test_app_with(|db| {
        let today = Utc::now().date_naive();
        add_entry(db, 1, TransactionType::Income, 1000.0, today, "Salary");
        add_entry(db, 1, TransactionType::Expense, 250.0, today, "Food");
    });

    let response = send(&app, get("/api/transactions/summary?period=month")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["income"], 1000.0);
    assert_eq!(json["expense"], 250.0);
    assert_eq!(json["balance"], 750.0);
    assert_eq!(json["transaction_count"], 2);
    assert_eq!(json["period"]["name"], "month");
}

// ========== Budget API Tests ==========

#[tokio::test]
async fn test_budget_progress_over_api() {
    let mut food = 0;
    let app = setup_test_app_with(|db| food = default_category(db, "Food"));
    let (start, end) = date_range(Period::Month, Utc::now().date_naive());

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/budgets",
            json!({
                "name": "Household",
                "amount": 500.0,
                "start_date": start.to_string(),
                "end_date": end.to_string(),
                "categories": [{"category_id": food, "amount": 300.0}],
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let budget = get_body_json(response).await;
    assert_eq!(budget["categories"].as_array().unwrap().len(), 1);
    let id = budget["id"].as_i64().unwrap();

    create_expense(&app, food, 150.0).await;

    let response = send(&app, get(&format!("/api/budgets/{}/progress", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let progress = get_body_json(response).await;
    assert_eq!(progress["total_spent"], 150.0);
    assert_eq!(progress["remaining"], 350.0);
    assert_eq!(progress["status"], "on_track");
    assert_eq!(progress["categories"][0]["spent"], 150.0);
    assert_eq!(progress["categories"][0]["percentage"], 50.0);

    let response = send(&app, get("/api/budgets/current")).await;
    assert_eq!(get_body_json(response).await.as_array().unwrap().len(), 1);

    let response = send(&app, get(&format!("/api/budgets/{}/categories", id))).await;
    let allocations = get_body_json(response).await;
    assert_eq!(allocations[0]["category"]["name"], "Food");
}

#[tokio::test]
async fn test_budget_rejects_reversed_dates() {
    let app = setup_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/budgets",
            json!({
                "name": "Backwards",
                "amount": 100.0,
                "start_date": "2024-06-30",
                "end_date": "2024-06-01",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(get_body_json(response).await["details"]["end_date"].is_string());
}

#[tokio::test]
async fn test_deactivated_budget_hidden_by_default() {
    let app = setup_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/budgets",
            json!({
                "name": "Old budget",
                "amount": 100.0,
                "start_date": "2024-01-01",
                "end_date": "2024-01-31",
            }),
        ),
    )
    .await;
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_request("PUT", &format!("/api/budgets/{}", id), json!({"is_active": false})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/api/budgets")).await;
    assert!(get_body_json(response).await.as_array().unwrap().is_empty());

    let response = send(&app, get("/api/budgets?include_inactive=true")).await;
    assert_eq!(get_body_json(response).await.as_array().unwrap().len(), 1);
}

// ========== Goal API Tests ==========

#[tokio::test]
async fn test_goal_contribution_completes_goal() {
    let app = setup_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/goals",
            json!({"name": "New laptop", "target_amount": 1000.0, "current_amount": 900.0}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let goal = get_body_json(response).await;
    assert_eq!(goal["is_completed"], false);
    let id = goal["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/api/goals/{}/contributions", id),
            json!({"amount": 100.0, "notes": "bonus"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let outcome = get_body_json(response).await;
    assert_eq!(outcome["goal"]["current_amount"], 1000.0);
    assert_eq!(outcome["goal"]["is_completed"], true);
    assert_eq!(outcome["goal"]["completed_date"], today());
    assert_eq!(outcome["contribution"]["amount"], 100.0);

    let response = send(&app, get(&format!("/api/goals/{}/progress", id))).await;
    let json = get_body_json(response).await;
    assert_eq!(json["progress"]["percentage"], 100.0);
    assert_eq!(json["progress"]["status"], "completed");

    let response = send(&app, get(&format!("/api/goals/{}/contributions", id))).await;
    assert_eq!(get_body_json(response).await.as_array().unwrap().len(), 1);

    // Completed goals are hidden unless asked for
    let response = send(&app, get("/api/goals")).await;
    assert!(get_body_json(response).await.as_array().unwrap().is_empty());
    let response = send(&app, get("/api/goals?include_completed=true")).await;
    assert_eq!(get_body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_contribution_to_missing_goal() {
    let app = setup_test_app();

    let response = send(
        &app,
        json_request("POST", "/api/goals/404/contributions", json!({"amount": 10.0})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/goals",
            json!({"name": "Trip", "target_amount": 500.0}),
        ),
    )
    .await;
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/api/goals/{}/contributions", id),
            json!({"amount": -5.0}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(get_body_json(response).await["details"]["amount"].is_string());
}

// ========== Report API Tests ==========

#[tokio::test]
async fn test_generate_summary_report() {
    let app = setup_test_app_with(|db| {
        let today = Utc::now().date_naive();
        add_entry(db, 1, TransactionType::Income, 1000.0, today, "Salary");
        add_entry(db, 1, TransactionType::Expense, 250.0, today, "Food");
    });

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/reports/generate",
            json!({"type": "summary", "parameters": {"period": "month"}}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["summary"]["income"], 1000.0);
    assert_eq!(json["summary"]["expense"], 250.0);
    assert_eq!(json["summary"]["savings_rate"], 75.0);
    assert!(json.get("report_id").is_none());
    assert!(json["generated_at"].is_string());
}

#[tokio::test]
async fn test_generate_report_rejects_unknown_type() {
    let app = setup_test_app();

    let response = send(
        &app,
        json_request("POST", "/api/reports/generate", json!({"type": "weekly"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(get_body_json(response).await["details"]["type"].is_string());

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/reports/generate",
            json!({"type": "monthly", "parameters": {"months_count": 0}}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(get_body_json(response).await["details"]["months_count"].is_string());
}

#[tokio::test]
async fn test_saved_report_round_trip_and_export() {
    let app = setup_test_app_with(|db| {
        let today = Utc::now().date_naive();
        add_entry(db, 1, TransactionType::Expense, 80.0, today, "Food");
        add_entry(db, 1, TransactionType::Expense, 20.0, today, "Transport");
    });

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/reports/generate",
            json!({"type": "summary", "save": true, "name": "My summary"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let generated = get_body_json(response).await;
    assert_eq!(generated["saved"], true);
    let id = generated["report_id"].as_i64().unwrap();

    let response = send(&app, get("/api/reports/saved")).await;
    let listing = get_body_json(response).await;
    assert_eq!(listing[0]["id"], id);
    assert_eq!(listing[0]["type"], "summary");
    assert!(listing[0].get("data").is_none());

    let response = send(&app, get(&format!("/api/reports/saved/{}", id))).await;
    let saved = get_body_json(response).await;
    assert_eq!(saved["name"], "My summary");
    assert_eq!(saved["data"]["summary"], generated["summary"]);

    let response = send(&app, get(&format!("/api/reports/saved/{}/export?format=csv", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/csv");
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"My_summary.csv\""
    );
    let csv = get_body_text(response).await;
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("id,name,icon,total"));
    assert!(lines.next().unwrap().contains("Food"));

    let response = send(&app, get(&format!("/api/reports/saved/{}/export", id))).await;
    assert_eq!(response.headers().get("content-type").unwrap(), "application/json");
    let exported = get_body_json(response).await;
    assert_eq!(exported["summary"], generated["summary"]);

    let response = send(&app, get(&format!("/api/reports/saved/{}/export?format=pdf", id))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, delete(&format!("/api/reports/saved/{}", id))).await;
    assert_eq!(get_body_json(response).await["success"], true);
    let response = send(&app, get(&format!("/api/reports/saved/{}", id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_schedule_lifecycle() {
    let app = setup_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/reports/schedules",
            json!({
                "name": "Weekly digest",
                "report_type": "summary",
                "frequency": "weekly",
                "delivery_method": "email",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(get_body_json(response).await["details"]["email"].is_string());

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/reports/schedules",
            json!({
                "name": "Weekly digest",
                "report_type": "summary",
                "frequency": "weekly",
                "delivery_method": "email",
                "email": "me@example.com",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let schedule = get_body_json(response).await;
    assert_eq!(schedule["frequency"], "weekly");
    assert!(schedule["next_run"].is_string());
    let id = schedule["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/reports/schedules/{}", id),
            json!({"frequency": "hourly"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/reports/schedules/{}", id),
            json!({"frequency": "monthly"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["frequency"], "monthly");

    let response = send(&app, get("/api/reports/schedules")).await;
    assert_eq!(get_body_json(response).await.as_array().unwrap().len(), 1);

    let response = send(&app, delete(&format!("/api/reports/schedules/{}", id))).await;
    assert_eq!(get_body_json(response).await["success"], true);

    let response = send(&app, get("/api/reports/schedules")).await;
    assert!(get_body_json(response).await.as_array().unwrap().is_empty());
}

// ========== Audit API Tests ==========

#[tokio::test]
async fn test_audit_log_records_writes() {
    let mut food = 0;
    let app = setup_test_app_with(|db| food = default_category(db, "Food"));

    let created = create_expense(&app, food, 9.99).await;

    let response = send(&app, get("/api/audit?limit=10")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let entries = get_body_json(response).await;
    let entries = entries.as_array().unwrap();
    assert!(entries.iter().any(|e| e["action"] == "create"
        && e["entity_type"] == "transaction"
        && e["entity_id"] == created["id"]));
}
