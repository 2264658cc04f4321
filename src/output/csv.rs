//! CSV output formatter for listings.
//!
//! Headers match the [`Tabular::HEADERS`] of the record type, and values
//! are written raw (timestamps exactly as the backend sent them). Quoting
//! is handled by the `csv` crate.

use std::fs::File;
use std::io;
use std::path::Path;

use thiserror::Error;

use super::Tabular;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV output formatter.
pub struct CsvOutput<'a, T> {
    records: &'a [T],
}

impl<'a, T: Tabular> CsvOutput<'a, T> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(records: &'a [T]) -> Self {
        Self { records }
    }

    /// Write the header and one row per record to `writer`.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(T::HEADERS)?;
        for record in self.records {
            csv_writer.write_record(record.fields())?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the CSV to a new file at `path`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if the file cannot be created or written.
    pub fn write_file(&self, path: &Path) -> Result<(), CsvOutputError> {
        let file = File::create(path)?;
        self.write_to(io::BufWriter::new(file))?;
        log::debug!(
            "Wrote {} {} to {}",
            self.records.len(),
            T::NOUN,
            path.display()
        );
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
