//! JSON output formatter for listings.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "count": 2,
//!   "records": [
//!     { "logId": 1, "internId": "I42", "timestamp": "2025-03-01T09:15:00", "status": "entered" },
//!     { "logId": 2, "internId": "I43", "timestamp": "2025-03-01T09:20:00", "status": "entered" }
//!   ]
//! }
//! ```
//!
//! Records keep the backend's camelCase field names.

use std::io::Write;

use serde::Serialize;

/// JSON output formatter.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a, T: Serialize> {
    /// Number of records
    pub count: usize,
    /// The records themselves
    pub records: &'a [T],
}

impl<'a, T: Serialize> JsonOutput<'a, T> {
    /// Create a new JSON output over `records`.
    #[must_use]
    pub fn new(records: &'a [T]) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)
    }
}
