//! The log-entry endpoint and its strict result type.

use std::future::Future;

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};

/// Outcome reported by `GET /log-entry`.
///
/// The backend sends `{status, name?, internId?, message?}`. Anything that
/// does not fit one of these variants is rejected as
/// [`ApiError::Malformed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LogResult {
    /// The entry was logged.
    Success {
        /// Display name of the intern
        name: String,
        /// Intern identifier
        #[serde(rename = "internId")]
        intern_id: String,
    },
    /// Non-fatal business condition, e.g. already logged today.
    Warning {
        /// Explanation from the backend
        message: String,
    },
    /// The code was rejected.
    Error {
        /// Explanation from the backend, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl LogResult {
    /// Whether the entry was logged.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Something that can log an entry for an auth code.
///
/// The scan controller depends on this seam rather than on [`ApiClient`]
/// directly.
pub trait EntryLogger {
    /// Look up `code` and log an entry for its owner.
    fn log_entry(&self, code: &str) -> impl Future<Output = Result<LogResult, ApiError>> + Send;
}

impl EntryLogger for ApiClient {
    async fn log_entry(&self, code: &str) -> Result<LogResult, ApiError> {
        self.get_json(&["log-entry"], &[("auth_code", code)]).await
    }
}
