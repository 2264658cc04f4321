//! Output formatters for backend listings.
//!
//! This module renders interns, visitors and entry logs as:
//! - aligned tables for the terminal
//! - JSON for automation and scripting
//! - CSV for spreadsheet import and dated exports
//!
//! # Example
//!
//! ```no_run
//! use rollcall::api::ApiClient;
//! use rollcall::output::{CsvOutput, TableOutput};
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let client = ApiClient::new("http://localhost:8080/api", Duration::from_secs(10))?;
//! let logs = client.list_entry_logs().await?;
//!
//! println!("{}", TableOutput::new(&logs).render());
//! CsvOutput::new(&logs).write_to(std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

pub mod csv;
pub mod json;
pub mod table;

use chrono::NaiveDate;

use crate::api::models::format_timestamp;
use crate::api::{EntryLog, Intern, Visitor};

// Re-export main types
pub use self::csv::{CsvOutput, CsvOutputError};
pub use self::json::JsonOutput;
pub use self::table::TableOutput;

/// How a table cell should stand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// Good state, e.g. an intern who entered
    Success,
    /// Anything else worth a second look
    Warning,
}

/// A record that renders as one table or CSV row.
pub trait Tabular {
    /// Column headers, shared by tables and CSV.
    const HEADERS: &'static [&'static str];
    /// Plural noun for the record count line.
    const NOUN: &'static str;
    /// Shown instead of an empty table.
    const EMPTY_MESSAGE: &'static str;

    /// Raw field values, as exported.
    fn fields(&self) -> Vec<String>;

    /// Field values for display. Defaults to the raw values.
    fn display_fields(&self) -> Vec<String> {
        self.fields()
    }

    /// Column to highlight and how.
    fn emphasis(&self) -> Option<(usize, Emphasis)> {
        None
    }
}

impl Tabular for Intern {
    const HEADERS: &'static [&'static str] = &["Intern ID", "Name", "Email", "Mobile", "Aadhaar"];
    const NOUN: &'static str = "interns";
    const EMPTY_MESSAGE: &'static str = "No interns registered yet.";

    fn fields(&self) -> Vec<String> {
        vec![
            self.intern_id.clone(),
            self.name.clone(),
            self.email.clone(),
            self.mobile_number.clone(),
            self.aadhaar_number.clone(),
        ]
    }
}

impl Tabular for Visitor {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Name",
        "Visitor ID",
        "Email",
        "Phone",
        "Aadhaar",
        "Purpose",
        "Entry Time",
    ];
    const NOUN: &'static str = "visitors";
    const EMPTY_MESSAGE: &'static str = "No visitor records found.";

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            self.name.clone(),
            self.visitor_id.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.aadhaar.clone(),
            self.purpose.clone(),
            self.entry_time.clone().unwrap_or_default(),
        ]
    }

    fn display_fields(&self) -> Vec<String> {
        let mut fields = self.fields();
        if let Some(entry_time) = &self.entry_time {
            fields[7] = format_timestamp(entry_time);
        }
        fields
    }
}

impl Tabular for EntryLog {
    const HEADERS: &'static [&'static str] = &["Log ID", "Intern ID", "Timestamp", "Status"];
    const NOUN: &'static str = "entries";
    const EMPTY_MESSAGE: &'static str = "No entry logs found.";

    fn fields(&self) -> Vec<String> {
        vec![
            self.log_id.to_string(),
            self.intern_id.clone(),
            self.timestamp.clone(),
            self.status.clone(),
        ]
    }

    fn display_fields(&self) -> Vec<String> {
        let mut fields = self.fields();
        fields[2] = self.display_timestamp();
        fields
    }

    fn emphasis(&self) -> Option<(usize, Emphasis)> {
        let emphasis = if self.is_entered() {
            Emphasis::Success
        } else {
            Emphasis::Warning
        };
        Some((3, emphasis))
    }
}

/// Default file name for a dated export, e.g. `entry_logs_2025-03-01.csv`.
#[must_use]
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y-%m-%d"))
}

/// Default file name for a downloaded intern QR code.
#[must_use]
pub fn qr_code_file_name(intern_id: &str) -> String {
    let safe: String = intern_id
        .chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect();
    format!("{}_qr_code.png", safe)
}
