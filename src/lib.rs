//! rollcall - attendance client for the intern and visitor entry logger
//!
//! Scans intern QR codes from a camera source and logs entries against the
//! backend, with manual entry as a fallback. Also registers interns and
//! visitors, and lists or exports the records the backend keeps.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod notify;
pub mod output;
pub mod progress;
pub mod registration;
pub mod scanner;
pub mod signal;

use std::io::IsTerminal;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::commands::AppContext;
use crate::config::Config;
use crate::error::ExitCode;

/// Run the application for parsed arguments.
///
/// Initializes logging, color and signal handling, loads the layered
/// configuration and drives the subcommand on a single-threaded runtime.
///
/// # Errors
///
/// Returns any error from configuration or the subcommand.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !std::io::stdout().is_terminal() {
        yansi::disable();
    }

    let shutdown = signal::install_handler()?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
        config.validate()?;
    }
    log::debug!("Effective configuration: {:?}", config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let ctx = AppContext::new(config, cli.quiet);
    let result = runtime.block_on(commands::execute(cli.command, &ctx, &shutdown));

    // A pending stdin read would otherwise hold the runtime open.
    runtime.shutdown_background();
    result
}
