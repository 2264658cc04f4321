//! Wire models for the listing endpoints.
//!
//! Field names follow the backend's camelCase JSON.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Identifier that the backend may send as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric id
    Number(i64),
    /// Textual id
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A registered intern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intern {
    pub intern_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub aadhaar_number: String,
    #[serde(default)]
    pub mobile_number: String,
}

/// A registered visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub visitor_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub aadhaar: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<String>,
}

/// One logged entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryLog {
    pub log_id: RecordId,
    pub intern_id: String,
    /// Timestamp exactly as the backend sent it.
    pub timestamp: String,
    pub status: String,
}

impl EntryLog {
    /// Whether the entry was made on `date`.
    ///
    /// Compares the `YYYY-MM-DD` prefix of the raw timestamp, so it follows
    /// whatever zone the backend writes timestamps in.
    #[must_use]
    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.timestamp
            .starts_with(&date.format("%Y-%m-%d").to_string())
    }

    /// Whether the status means the intern entered.
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.status.eq_ignore_ascii_case("entered")
    }

    /// Timestamp rendered in local time for tables.
    #[must_use]
    pub fn display_timestamp(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// Render a backend timestamp for humans, keeping the raw text if it
/// cannot be parsed.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }
    // Zone-less timestamps, e.g. 2025-03-01T09:15:00 or with fractional seconds
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}
