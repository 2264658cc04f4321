//! HTTP client for the entry logger backend.
//!
//! The backend is an opaque collaborator. This module only knows the
//! endpoints, their wire shapes, and how to turn failures into [`ApiError`].
//!
//! | Operation | Request |
//! |---|---|
//! | [`ApiClient::log_entry`](EntryLogger::log_entry) | `GET /log-entry?auth_code=...` |
//! | [`ApiClient::list_interns`] | `GET /interns` |
//! | [`ApiClient::register_intern`] | `POST /interns/register` |
//! | [`ApiClient::intern_qr_code`] | `GET /interns/{id}/qr-code` |
//! | [`ApiClient::list_entry_logs`] | `GET /entry-logs` |
//! | [`ApiClient::list_visitors`] | `GET /new-comers` |
//! | [`ApiClient::register_visitor`] | `POST /new-comers` |

pub mod entry;
pub mod models;

use std::time::Duration;

use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registration::{InternRegistration, VisitorRegistration};

pub use entry::{EntryLogger, LogResult};
pub use models::{EntryLog, Intern, RecordId, Visitor};

/// Default base URL of the backend API.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Errors returned by backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body
        message: String,
    },

    /// A success response whose body did not match the expected shape.
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed {
        /// URL that was requested
        endpoint: String,
        /// Decoding failure
        reason: String,
    },

    /// The configured base URL cannot be used.
    #[error("invalid API URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ApiError {
    /// Message suitable for an operator notice.
    ///
    /// For HTTP errors this is the server's own message when it sent one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Client for the backend REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if the URL cannot be parsed or
    /// cannot carry path segments, and [`ApiError::Transport`] if the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| ApiError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl {
                url: trimmed.to_string(),
                reason: "expected an http(s) URL".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rollcall/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: url,
        })
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments under the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Fetch all registered interns.
    pub async fn list_interns(&self) -> Result<Vec<Intern>, ApiError> {
        self.get_json(&["interns"], &[]).await
    }

    /// Register a new intern. The backend emails their QR code.
    pub async fn register_intern(&self, form: &InternRegistration) -> Result<(), ApiError> {
        self.post_json(&["interns", "register"], form).await
    }

    /// Download the PNG QR code generated for an intern.
    pub async fn intern_qr_code(&self, intern_id: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["interns", intern_id, "qr-code"]);
        log::debug!("GET {}", url);
        let response = ensure_success(self.http.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch every entry log.
    pub async fn list_entry_logs(&self) -> Result<Vec<EntryLog>, ApiError> {
        self.get_json(&["entry-logs"], &[]).await
    }

    /// Fetch every registered visitor.
    pub async fn list_visitors(&self) -> Result<Vec<Visitor>, ApiError> {
        self.get_json(&["new-comers"], &[]).await
    }

    /// Register a visitor. The backend notifies the CSO.
    pub async fn register_visitor(&self, form: &VisitorRegistration) -> Result<(), ApiError> {
        self.post_json(&["new-comers"], form).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments);
        log::debug!("GET {}", url);
        let response = self.http.get(url.clone()).query(query).send().await?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            log::warn!("Rejecting response from {}: {}", url, e);
            ApiError::Malformed {
                endpoint: url.to_string(),
                reason: e.to_string(),
            }
        })
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(segments);
        log::debug!("POST {}", url);
        let response = self.http.post(url).json(body).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    log::debug!("HTTP {} from backend: {}", status.as_u16(), message);
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Pick the most useful message out of an error response body.
///
/// Preference order: a JSON `message` field, a plain-text body, the status line.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    if let Ok(ErrorBody {
        message: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        if !message.trim().is_empty() {
            return message;
        }
    }

    let text = body.trim();
    if !text.is_empty() && !text.starts_with('{') && !text.starts_with('<') {
        return text.to_string();
    }

    status.to_string()
}
