//! End-to-end runs of `run_app` against a mock backend.
//!
//! `run_app` owns its runtime, so the backend is served from a separate
//! thread with a runtime of its own.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use rollcall::cli::Cli;
use rollcall::error::ExitCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use super::common::qr_image;

type Hits = Arc<Mutex<Vec<String>>>;

fn spawn_backend() -> (String, Hits) {
    let hits: Hits = Arc::default();
    let recorded = Arc::clone(&hits);
    let (addr_tx, addr_rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let log_hits = Arc::clone(&recorded);
            let register_hits = Arc::clone(&recorded);
            let app = Router::new()
                .route(
                    "/api/log-entry",
                    get(move |Query(query): Query<std::collections::HashMap<String, String>>| {
                        let hits = Arc::clone(&log_hits);
                        async move {
                            let code = query.get("auth_code").cloned().unwrap_or_default();
                            hits.lock().unwrap().push(format!("log-entry {code}"));
                            if code == "ABC123" {
                                Json(json!({"status": "success", "name": "Jane", "internId": "I42"}))
                            } else {
                                Json(json!({"status": "error", "message": "Invalid QR Code"}))
                            }
                        }
                    }),
                )
                .route(
                    "/api/interns/register",
                    post(move |Json(body): Json<Value>| {
                        let hits = Arc::clone(&register_hits);
                        async move {
                            hits.lock().unwrap().push(format!("register {}", body["internId"]));
                            StatusCode::OK
                        }
                    }),
                )
                .route(
                    "/api/entry-logs",
                    get(|| async {
                        Json(json!([
                            {"logId": 1, "internId": "I42", "timestamp": "2025-03-01T09:15:00", "status": "entered"},
                            {"logId": 2, "internId": "I7", "timestamp": "2025-03-01T09:20:00", "status": "denied"}
                        ]))
                    }),
                )
                .route(
                    "/api/interns/:intern_id/qr-code",
                    get(|| async { b"\x89PNG\r\n\x1a\nqr".to_vec() }),
                );

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            addr_tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    let addr = addr_rx.recv().unwrap();
    (format!("http://{addr}/api"), hits)
}

/// Parse and run with an empty config file so no user config leaks in.
fn run(config_dir: &Path, api_url: &str, args: &[&str]) -> anyhow::Result<ExitCode> {
    let config = config_dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let config_arg = config.to_string_lossy().into_owned();

    let mut argv = vec![
        "rollcall",
        "--quiet",
        "--no-color",
        "--config",
        config_arg.as_str(),
        "--api-url",
        api_url,
    ];
    argv.extend_from_slice(args);
    rollcall::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_log_command_exit_codes() {
    let (url, hits) = spawn_backend();
    let dir = TempDir::new().unwrap();

    let ok = run(dir.path(), &url, &["log", "  ABC123  "]).unwrap();
    assert_eq!(ok, ExitCode::Success);

    let rejected = run(dir.path(), &url, &["log", "NOPE", "--output", "json"]).unwrap();
    assert_eq!(rejected, ExitCode::GeneralError);

    assert_eq!(
        *hits.lock().unwrap(),
        vec!["log-entry ABC123".to_string(), "log-entry NOPE".to_string()]
    );
}

#[test]
fn test_blank_code_is_rejected_before_request() {
    let (url, hits) = spawn_backend();
    let dir = TempDir::new().unwrap();

    assert!(run(dir.path(), &url, &["log", "   "]).is_err());
    assert!(hits.lock().unwrap().is_empty());
}

#[test]
fn test_invalid_registration_never_reaches_backend() {
    let (url, hits) = spawn_backend();
    let dir = TempDir::new().unwrap();

    let err = run(
        dir.path(),
        &url,
        &[
            "interns",
            "register",
            "--intern-id",
            "I99",
            "--name",
            "Meera",
            "--email",
            "not-an-email",
            "--aadhaar",
            "1234",
            "--mobile",
            "9123456780",
        ],
    )
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidInput);
    let message = format!("{err:#}");
    assert!(message.contains("Email is invalid"), "{message}");
    assert!(message.contains("Aadhaar number must be 12 digits"), "{message}");
    assert!(hits.lock().unwrap().is_empty());
}

#[test]
fn test_valid_registration_is_posted() {
    let (url, hits) = spawn_backend();
    let dir = TempDir::new().unwrap();

    let code = run(
        dir.path(),
        &url,
        &[
            "interns",
            "register",
            "--intern-id",
            " I99 ",
            "--name",
            "Meera",
            "--email",
            "meera@example.com",
            "--aadhaar",
            "111122223333",
            "--mobile",
            "9123456780",
        ],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(*hits.lock().unwrap(), vec![r#"register "I99""#.to_string()]);
}

#[test]
fn test_entries_export_writes_csv() {
    let (url, _) = spawn_backend();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("entries.csv");

    let code = run(
        dir.path(),
        &url,
        &["entries", "export", "--out", &out.to_string_lossy()],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Log ID,Intern ID,Timestamp,Status",
            "1,I42,2025-03-01T09:15:00,entered",
            "2,I7,2025-03-01T09:20:00,denied",
        ]
    );
}

#[test]
fn test_qr_code_download() {
    let (url, _) = spawn_backend();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("qr.png");

    let code = run(
        dir.path(),
        &url,
        &["interns", "qr-code", "I42", "--out", &out.to_string_lossy()],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read(&out).unwrap(), b"\x89PNG\r\n\x1a\nqr");
}

#[test]
fn test_scan_once_over_frame_directory() {
    let (url, hits) = spawn_backend();
    let dir = TempDir::new().unwrap();
    let frames = dir.path().join("frames");
    fs::create_dir(&frames).unwrap();
    qr_image("ABC123", 3).save(frames.join("001.png")).unwrap();

    let code = run(
        dir.path(),
        &url,
        &[
            "scan",
            "--source",
            &frames.to_string_lossy(),
            "--interval-ms",
            "10",
            "--once",
            "--output",
            "json",
        ],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(*hits.lock().unwrap(), vec!["log-entry ABC123".to_string()]);
}

#[test]
fn test_scan_missing_camera_source() {
    let (url, _) = spawn_backend();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("webcam.jpg");

    let err = run(
        dir.path(),
        &url,
        &["scan", "--source", &missing.to_string_lossy()],
    )
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::CameraUnavailable);
    assert!(format!("{err:#}").starts_with("Error accessing camera"));
}
