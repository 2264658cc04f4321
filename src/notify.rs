//! Transient user-facing notices.
//!
//! Notices are fire-and-forget: the scan loop never waits for them to be
//! acknowledged.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use yansi::Paint;

use crate::api::{ApiError, LogResult};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational, e.g. a code was detected
    Info,
    /// An entry was logged
    Success,
    /// Non-fatal business condition, e.g. already logged today
    Warning,
    /// Request failed or the code was rejected
    Error,
}

/// A message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Human-readable message
    pub message: String,
}

impl Notice {
    /// Create an info notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    /// Create a success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    /// Create a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    /// Create an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// The notice shown for the outcome of a log-entry submission.
    #[must_use]
    pub fn for_outcome(outcome: &Result<LogResult, ApiError>) -> Self {
        match outcome {
            Ok(LogResult::Success { name, intern_id }) => {
                Self::success(format!("Entry logged for {name} ({intern_id})"))
            }
            Ok(LogResult::Warning { message }) => Self::warning(message.clone()),
            Ok(LogResult::Error { message }) => Self::error(
                message
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or("Invalid QR Code"),
            ),
            Err(err) => Self::error(format!("Error logging entry: {}", err.user_message())),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Receives notices from the scan loop.
pub trait Notifier {
    /// Surface a notice. Must not block.
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Prints notices to stdout with a colored severity tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    errors_only: bool,
}

impl ConsoleNotifier {
    /// Create a console notifier. Coloring follows the global `yansi` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notifier that prints only error notices when `quiet`.
    #[must_use]
    pub fn with_quiet(quiet: bool) -> Self {
        Self { errors_only: quiet }
    }

    /// Whether a notice of `level` is printed.
    #[must_use]
    pub fn shows(&self, level: NoticeLevel) -> bool {
        !self.errors_only || level == NoticeLevel::Error
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        if !self.shows(notice.level) {
            log::debug!("quiet, dropping notice: {}", notice.message);
            return;
        }
        let tag = match notice.level {
            NoticeLevel::Info => "info".cyan().bold(),
            NoticeLevel::Success => "ok".green().bold(),
            NoticeLevel::Warning => "warn".yellow().bold(),
            NoticeLevel::Error => "error".red().bold(),
        };
        log::debug!("notice ({:?}): {}", notice.level, notice.message);

        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "[{}] {}", tag, notice.message);
        let _ = out.flush();
    }
}

/// Keeps every notice in memory.
///
/// Useful when embedding the scanner behind another UI, and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.to_vec())
            .unwrap_or_default()
    }

    /// Messages received so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.message).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
