//! Aligned terminal tables.

use std::fmt::Write;

use yansi::Paint;

use super::{Emphasis, Tabular};

/// Column separator.
const GAP: &str = "  ";

/// Table formatter for the terminal.
pub struct TableOutput<'a, T> {
    records: &'a [T],
}

impl<'a, T: Tabular> TableOutput<'a, T> {
    /// Create a new table over `records`.
    #[must_use]
    pub fn new(records: &'a [T]) -> Self {
        Self { records }
    }

    /// Render the table followed by a count line.
    ///
    /// An empty listing renders as the record type's empty message.
    #[must_use]
    pub fn render(&self) -> String {
        if self.records.is_empty() {
            return T::EMPTY_MESSAGE.to_string();
        }

        let rows: Vec<Vec<String>> = self.records.iter().map(Tabular::display_fields).collect();
        let widths = column_widths(T::HEADERS, &rows);

        let mut out = String::new();
        let header: Vec<String> = T::HEADERS
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(h, *w).bold().to_string())
            .collect();
        let _ = writeln!(out, "{}", header.join(GAP).trim_end());

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let _ = writeln!(out, "{}", rule.join(GAP));

        for (record, row) in self.records.iter().zip(&rows) {
            let emphasis = record.emphasis();
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (cell, w))| {
                    let padded = pad(cell, *w);
                    match emphasis {
                        Some((c, Emphasis::Success)) if c == col => padded.green().to_string(),
                        Some((c, Emphasis::Warning)) if c == col => padded.yellow().to_string(),
                        _ => padded,
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join(GAP).trim_end());
        }

        let _ = write!(out, "{} {}", self.records.len(), T::NOUN);
        out
    }
}

fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}
