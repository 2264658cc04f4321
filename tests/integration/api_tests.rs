use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rollcall::api::{ApiClient, ApiError, EntryLogger, LogResult, RecordId};
use rollcall::dashboard::DashboardStats;
use rollcall::registration::{InternRegistration, VisitorRegistration};
use serde_json::{json, Value};

type Posted = Arc<Mutex<Vec<(String, Value)>>>;

async fn log_entry(Query(query): Query<HashMap<String, String>>) -> Response {
    let code = query.get("auth_code").cloned().unwrap_or_default();
    match code.as_str() {
        "GOOD" => Json(json!({"status": "success", "name": "Jane", "internId": "I42"})).into_response(),
        "DUP" => Json(json!({"status": "warning", "message": "Entry already logged today"}))
            .into_response(),
        "GARBAGE" => Json(json!({"unexpected": true})).into_response(),
        "DOWN" => (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response(),
        "MISSING" => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Intern not found"})),
        )
            .into_response(),
        // Echo anything else so callers can check query encoding
        other => Json(json!({"status": "error", "message": format!("unknown code {other}")}))
            .into_response(),
    }
}

async fn interns() -> Json<Value> {
    Json(json!([
        {"internId": "I42", "name": "Jane", "email": "jane@example.com",
         "aadhaarNumber": "123412341234", "mobileNumber": "9876543210"},
        {"internId": "I7", "name": "Ravi", "email": "ravi@example.com"}
    ]))
}

async fn entry_logs() -> Json<Value> {
    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    Json(json!([
        {"logId": 1, "internId": "I42", "timestamp": "2024-01-05T09:00:00", "status": "entered"},
        {"logId": 2, "internId": "I42", "timestamp": format!("{today}T09:00:00"), "status": "entered"}
    ]))
}

async fn visitors() -> Json<Value> {
    Json(json!([
        {"id": "V-1", "name": "Asha", "visitorId": "VIS1", "email": "asha@example.com",
         "phone": "9876543210", "aadhaar": "123412341234", "purpose": "Interview",
         "entryTime": "2025-03-01T10:00:00"}
    ]))
}

async fn register(State(posted): State<Posted>, Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Email already registered"})),
        )
            .into_response();
    }
    posted.lock().unwrap().push(("interns".to_string(), body));
    StatusCode::OK.into_response()
}

async fn register_visitor(State(posted): State<Posted>, Json(body): Json<Value>) -> StatusCode {
    posted.lock().unwrap().push(("new-comers".to_string(), body));
    StatusCode::CREATED
}

async fn qr_code(Path(intern_id): Path<String>) -> Response {
    if intern_id == "NOPE" {
        return (StatusCode::NOT_FOUND, "").into_response();
    }
    let mut body = b"\x89PNG\r\n\x1a\n".to_vec();
    body.extend_from_slice(intern_id.as_bytes());
    ([("content-type", "image/png")], body).into_response()
}

/// Serve the mock backend on an ephemeral port and return its API base URL.
async fn spawn_backend() -> (String, Posted) {
    let posted: Posted = Arc::default();
    let app = Router::new()
        .route("/api/log-entry", get(log_entry))
        .route("/api/interns", get(interns))
        .route("/api/interns/register", post(register))
        .route("/api/interns/:intern_id/qr-code", get(qr_code))
        .route("/api/entry-logs", get(entry_logs))
        .route("/api/new-comers", get(visitors).post(register_visitor))
        .with_state(Arc::clone(&posted));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), posted)
}

async fn client() -> (ApiClient, Posted) {
    let (url, posted) = spawn_backend().await;
    (ApiClient::new(&url, Duration::from_secs(5)).unwrap(), posted)
}

#[tokio::test]
async fn test_log_entry_success_and_warning() {
    let (client, _) = client().await;

    let success = client.log_entry("GOOD").await.unwrap();
    assert_eq!(
        success,
        LogResult::Success {
            name: "Jane".to_string(),
            intern_id: "I42".to_string(),
        }
    );

    let warning = client.log_entry("DUP").await.unwrap();
    assert_eq!(
        warning,
        LogResult::Warning {
            message: "Entry already logged today".to_string(),
        }
    );
}

#[tokio::test]
async fn test_log_entry_encodes_code_in_query() {
    let (client, _) = client().await;

    let result = client.log_entry("A&B =C").await.unwrap();
    assert_eq!(
        result,
        LogResult::Error {
            message: Some("unknown code A&B =C".to_string()),
        }
    );
}

#[tokio::test]
async fn test_log_entry_unexpected_body_is_malformed() {
    let (client, _) = client().await;

    let err = client.log_entry("GARBAGE").await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_log_entry_http_errors_carry_server_message() {
    let (client, _) = client().await;

    match client.log_entry("MISSING").await.unwrap_err() {
        ApiError::Status { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Intern not found");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let err = client.log_entry("DOWN").await.unwrap_err();
    assert_eq!(err.user_message(), "database unavailable");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{addr}/api"), Duration::from_secs(2)).unwrap();
    let err = client.log_entry("GOOD").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_listings_decode() {
    let (client, _) = client().await;

    let interns = client.list_interns().await.unwrap();
    assert_eq!(interns.len(), 2);
    assert_eq!(interns[0].aadhaar_number, "123412341234");
    assert_eq!(interns[1].mobile_number, "");

    let logs = client.list_entry_logs().await.unwrap();
    assert_eq!(logs[0].log_id, RecordId::Number(1));
    assert!(logs.iter().all(|log| log.is_entered()));

    let visitors = client.list_visitors().await.unwrap();
    assert_eq!(visitors[0].id, Some(RecordId::Text("V-1".to_string())));
    assert_eq!(visitors[0].purpose, "Interview");
}

#[tokio::test]
async fn test_register_intern_posts_camel_case() {
    let (client, posted) = client().await;
    let form = InternRegistration {
        intern_id: "I99".to_string(),
        name: "Meera".to_string(),
        email: "meera@example.com".to_string(),
        aadhaar_number: "111122223333".to_string(),
        mobile_number: "9123456780".to_string(),
    };

    client.register_intern(&form).await.unwrap();

    let posted = posted.lock().unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, "interns");
    assert_eq!(
        posted[0].1,
        json!({
            "internId": "I99",
            "name": "Meera",
            "email": "meera@example.com",
            "aadhaarNumber": "111122223333",
            "mobileNumber": "9123456780"
        })
    );
}

#[tokio::test]
async fn test_register_intern_rejection_message() {
    let (client, posted) = client().await;
    let form = InternRegistration {
        email: "taken@example.com".to_string(),
        ..InternRegistration::default()
    };

    let err = client.register_intern(&form).await.unwrap_err();
    assert_eq!(err.user_message(), "Email already registered");
    assert!(posted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_visitor_accepts_created() {
    let (client, posted) = client().await;
    let form = VisitorRegistration {
        name: "Asha".to_string(),
        visitor_id: "VIS1".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        aadhaar: "123412341234".to_string(),
        purpose: "Interview".to_string(),
    };

    client.register_visitor(&form).await.unwrap();

    let posted = posted.lock().unwrap();
    assert_eq!(posted[0].0, "new-comers");
    assert_eq!(posted[0].1["visitorId"], "VIS1");
}

#[tokio::test]
async fn test_qr_code_bytes_and_path_encoding() {
    let (client, _) = client().await;

    let bytes = client.intern_qr_code("I 42/x").await.unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));
    assert!(bytes.ends_with(b"I 42/x"));

    let err = client.intern_qr_code("NOPE").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_dashboard_fetch_counts_today() {
    let (client, _) = client().await;

    let stats = DashboardStats::fetch(&client).await.unwrap();
    assert_eq!(
        stats,
        DashboardStats {
            total_interns: 2,
            total_entries: 2,
            today_entries: 1,
            total_visitors: 1,
        }
    );
}

#[test]
fn test_invalid_base_url_rejected() {
    let err = ApiClient::new("not a url", Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));

    let err = ApiClient::new("ftp://example.com/api", Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));
}
