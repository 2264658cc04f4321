//! Signal handling for graceful shutdown.
//!
//! This module provides centralized Ctrl+C handling for rollcall. An
//! `AtomicBool` flag records that shutdown was requested, and a
//! [`tokio::sync::Notify`] wakes async code waiting on it, such as the task
//! that turns Ctrl+C into a scan shutdown command.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rollcall::signal::install_handler;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let handler = install_handler()?;
//! handler.wait().await;
//! println!("Shutdown requested, cleaning up...");
//! # Ok(())
//! # }
//! ```
//!
//! When a signal is received the flag is set, "Interrupted. Cleaning up..."
//! is printed to stderr, and the application exits with code 130
//! (128 + SIGINT).

use std::io::Write;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::Notify;

/// Exit code for SIGINT (Ctrl+C) interruption.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Centralized shutdown handler for graceful application termination.
///
/// Clones share the same flag and wake-up channel.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownHandler {
    /// Create a new shutdown handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown and wake every waiter.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Reset the shutdown flag to `false`.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Wait until shutdown is requested.
    ///
    /// Returns immediately if it already was.
    pub async fn wait(&self) {
        loop {
            let mut notified = pin!(self.notify.notified());
            // Register before checking the flag so a concurrent request is not missed.
            notified.as_mut().enable();
            if self.is_shutdown_requested() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();
static INSTALL_LOCK: Mutex<()> = Mutex::new(());

/// Install a Ctrl+C handler that requests shutdown on interrupt.
///
/// Call once, early in startup. Later calls (e.g. from tests running
/// `run_app` in one process) reset and return the already installed
/// handler.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if no handler could be registered
/// and none was installed by this module before.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    // Serializes first installation across threads
    let _guard = INSTALL_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let hooked = handler.clone();

    match ctrlc::set_handler(move || {
        hooked.request_shutdown();

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();

        log::info!("Shutdown signal received");
    }) {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(err) => match GLOBAL_HANDLER.get() {
            Some(existing) => {
                existing.reset();
                Ok(existing.clone())
            }
            None => Err(SignalError::InstallFailed(err)),
        },
    }
}
