//! Command-line interface definitions for rollcall.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, config, backend URL) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan QR codes from a webcam snapshot that fswebcam keeps refreshing
//! rollcall scan --source /run/webcam/latest.jpg
//!
//! # Log one entry by hand
//! rollcall log ABC123
//!
//! # Export today's entry logs
//! rollcall entries export
//!
//! # Verbose mode against another backend
//! rollcall -v --api-url http://attendance.local:8080/api dashboard
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::registration::{InternRegistration, VisitorRegistration};
use crate::scanner::Facing;

/// Attendance client for the intern and visitor entry logger.
///
/// rollcall scans intern QR codes from a camera source and logs entries
/// against the backend, registers interns and visitors, and lists or
/// exports the records the backend keeps.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long, global = true, value_name = "URL", env = "ROLLCALL_API_URL")]
    pub api_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for rollcall.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan QR codes from a camera source and log entries
    Scan(ScanArgs),
    /// Log an entry for an auth code without a camera
    Log(LogArgs),
    /// Manage interns
    #[command(subcommand)]
    Interns(InternsCommand),
    /// Manage visitors
    #[command(subcommand)]
    Visitors(VisitorsCommand),
    /// List or export entry logs
    #[command(subcommand)]
    Entries(EntriesCommand),
    /// Show attendance counters
    Dashboard(DashboardArgs),
    /// Inspect the effective configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for the scan subcommand.
///
/// While scanning, each line typed on stdin is submitted as a manual code.
/// The lines `:start`, `:stop` and `:quit` control the camera.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Snapshot image file or directory of frames to scan
    #[arg(long, value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// Delay between frame samples in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Preferred camera orientation
    #[arg(long, value_enum)]
    pub facing: Option<Facing>,

    /// Exit after the first logged entry
    #[arg(long)]
    pub once: bool,

    /// Do not start the camera until `:start` is entered
    #[arg(long)]
    pub no_autostart: bool,

    /// Format of the end-of-run summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: SummaryFormat,
}

/// Arguments for the log subcommand.
#[derive(Debug, Args)]
pub struct LogArgs {
    /// Auth code to log (surrounding whitespace is ignored)
    #[arg(value_name = "CODE")]
    pub code: String,

    /// Result format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: SummaryFormat,
}

/// Intern subcommands.
#[derive(Debug, Subcommand)]
pub enum InternsCommand {
    /// List registered interns
    List(ListArgs),
    /// Register a new intern; the backend emails their QR code
    Register(InternRegisterArgs),
    /// Download an intern's QR code as PNG
    QrCode(QrCodeArgs),
}

/// Visitor subcommands.
#[derive(Debug, Subcommand)]
pub enum VisitorsCommand {
    /// List registered visitors
    List(ListArgs),
    /// Register a visitor; the backend notifies the CSO
    Register(VisitorRegisterArgs),
    /// Export visitors to CSV
    Export(ExportArgs),
}

/// Entry log subcommands.
#[derive(Debug, Subcommand)]
pub enum EntriesCommand {
    /// List entry logs
    List(ListArgs),
    /// Export entry logs to CSV
    Export(ExportArgs),
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
}

/// Arguments shared by the list subcommands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments shared by the export subcommands.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Destination file (default: dated name in the current directory)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Arguments for downloading a QR code.
#[derive(Debug, Args)]
pub struct QrCodeArgs {
    /// Intern ID
    #[arg(value_name = "INTERN_ID")]
    pub intern_id: String,

    /// Destination file (default: `<INTERN_ID>_qr_code.png`)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Arguments for the dashboard subcommand.
#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: SummaryFormat,
}

/// Intern registration form.
#[derive(Debug, Args)]
pub struct InternRegisterArgs {
    /// Intern ID
    #[arg(long)]
    pub intern_id: String,
    /// Full name
    #[arg(long)]
    pub name: String,
    /// Email address
    #[arg(long)]
    pub email: String,
    /// 12-digit Aadhaar number
    #[arg(long)]
    pub aadhaar: String,
    /// Mobile number, 10-15 digits
    #[arg(long)]
    pub mobile: String,
}

impl From<InternRegisterArgs> for InternRegistration {
    fn from(args: InternRegisterArgs) -> Self {
        Self {
            intern_id: args.intern_id,
            name: args.name,
            email: args.email,
            aadhaar_number: args.aadhaar,
            mobile_number: args.mobile,
        }
    }
}

/// Visitor registration form.
#[derive(Debug, Args)]
pub struct VisitorRegisterArgs {
    /// Full name
    #[arg(long)]
    pub name: String,
    /// Visitor ID
    #[arg(long)]
    pub visitor_id: String,
    /// Email address
    #[arg(long)]
    pub email: String,
    /// Phone number, 10-15 digits
    #[arg(long)]
    pub phone: String,
    /// 12-digit Aadhaar number
    #[arg(long)]
    pub aadhaar: String,
    /// Purpose of the visit
    #[arg(long)]
    pub purpose: String,
}

impl From<VisitorRegisterArgs> for VisitorRegistration {
    fn from(args: VisitorRegisterArgs) -> Self {
        Self {
            name: args.name,
            visitor_id: args.visitor_id,
            email: args.email,
            phone: args.phone,
            aadhaar: args.aadhaar,
            purpose: args.purpose,
        }
    }
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table for the terminal
    Table,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Output format for single results and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// Human-readable text
    Text,
    /// JSON output for scripting
    Json,
}
