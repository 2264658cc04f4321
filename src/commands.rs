//! Subcommand handlers.
//!
//! Each handler takes its parsed arguments plus the shared [`AppContext`]
//! and returns the exit code for a run that did not fail outright.

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use image::ImageFormat;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::api::{ApiClient, ApiError, EntryLogger, LogResult};
use crate::cli::{
    Commands, ConfigCommand, DashboardArgs, EntriesCommand, ExportArgs, InternsCommand, ListArgs,
    LogArgs, OutputFormat, QrCodeArgs, ScanArgs, SummaryFormat, VisitorsCommand,
};
use crate::config::Config;
use crate::dashboard::DashboardStats;
use crate::error::ExitCode;
use crate::notify::{ConsoleNotifier, Notice, Notifier};
use crate::output::{
    export_file_name, qr_code_file_name, CsvOutput, JsonOutput, TableOutput, Tabular,
};
use crate::progress::FetchSpinner;
use crate::registration::{InternRegistration, VisitorRegistration};
use crate::scanner::{
    Camera, ControllerConfig, DirectoryCamera, QrDecoder, ScanCommand, ScanController, ScanReport,
    SnapshotCamera,
};
use crate::signal::ShutdownHandler;

/// Capacity of the scan command channel.
const COMMAND_BUFFER: usize = 32;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Effective configuration
    pub config: Config,
    /// Quiet mode hides spinners and everything but errors
    pub quiet: bool,
}

impl AppContext {
    /// Create a context.
    #[must_use]
    pub fn new(config: Config, quiet: bool) -> Self {
        Self { config, quiet }
    }

    /// Build a backend client from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL is unusable.
    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.config.api_url, self.config.request_timeout())
            .context("Failed to create API client")
    }

    /// Console notifier honoring quiet mode.
    #[must_use]
    pub fn notifier(&self) -> ConsoleNotifier {
        ConsoleNotifier::with_quiet(self.quiet)
    }

    fn notify(&self, notice: Notice) {
        self.notifier().notify(notice);
    }
}

/// Run a subcommand.
///
/// Every command except `scan` is abandoned on Ctrl+C with
/// [`ExitCode::Interrupted`]; `scan` shuts its session down itself.
///
/// # Errors
///
/// Returns the handler's error.
pub async fn execute(
    command: Commands,
    ctx: &AppContext,
    shutdown: &ShutdownHandler,
) -> Result<ExitCode> {
    if let Commands::Scan(args) = command {
        return scan(args, ctx, shutdown).await;
    }

    tokio::select! {
        result = execute_one_shot(command, ctx) => result,
        _ = shutdown.wait() => {
            log::info!("Interrupted");
            Ok(ExitCode::Interrupted)
        }
    }
}

async fn execute_one_shot(command: Commands, ctx: &AppContext) -> Result<ExitCode> {
    match command {
        Commands::Scan(_) => unreachable!("scan is handled by execute"),
        Commands::Log(args) => log_code(args, ctx).await,
        Commands::Interns(InternsCommand::List(args)) => {
            let client = ctx.client()?;
            let interns = fetch(ctx, "Fetching interns", client.list_interns())
                .await
                .context("Error fetching interns")?;
            print_listing(&interns, &args)
        }
        Commands::Interns(InternsCommand::Register(args)) => {
            register_intern(InternRegistration::from(args), ctx).await
        }
        Commands::Interns(InternsCommand::QrCode(args)) => download_qr_code(args, ctx).await,
        Commands::Visitors(VisitorsCommand::List(args)) => {
            let client = ctx.client()?;
            let visitors = fetch(ctx, "Fetching visitors", client.list_visitors())
                .await
                .context("Error fetching visitors")?;
            print_listing(&visitors, &args)
        }
        Commands::Visitors(VisitorsCommand::Register(args)) => {
            register_visitor(VisitorRegistration::from(args), ctx).await
        }
        Commands::Visitors(VisitorsCommand::Export(args)) => {
            let client = ctx.client()?;
            let visitors = fetch(ctx, "Fetching visitors", client.list_visitors())
                .await
                .context("Error fetching visitors")?;
            let path = export(&visitors, "visitors", &args)?;
            ctx.notify(Notice::success(format!(
                "Visitor records exported successfully to {}",
                path.display()
            )));
            Ok(ExitCode::Success)
        }
        Commands::Entries(EntriesCommand::List(args)) => {
            let client = ctx.client()?;
            let logs = fetch(ctx, "Fetching entry logs", client.list_entry_logs())
                .await
                .context("Error fetching entry logs")?;
            print_listing(&logs, &args)
        }
        Commands::Entries(EntriesCommand::Export(args)) => {
            let client = ctx.client()?;
            let logs = fetch(ctx, "Fetching entry logs", client.list_entry_logs())
                .await
                .context("Error fetching entry logs")?;
            let path = export(&logs, "entry_logs", &args)?;
            ctx.notify(Notice::success(format!(
                "Entry logs exported successfully to {}",
                path.display()
            )));
            Ok(ExitCode::Success)
        }
        Commands::Dashboard(args) => dashboard(args, ctx).await,
        Commands::Config(command) => show_config(command, ctx),
    }
}

async fn fetch<T>(
    ctx: &AppContext,
    message: &str,
    request: impl std::future::Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    FetchSpinner::new(message, ctx.quiet).run(request).await
}

fn print_listing<T: Tabular + Serialize>(records: &[T], args: &ListArgs) -> Result<ExitCode> {
    match args.output {
        OutputFormat::Table => println!("{}", TableOutput::new(records).render()),
        OutputFormat::Json => JsonOutput::new(records)
            .write_to(io::stdout().lock())
            .context("Failed to write JSON")?,
        OutputFormat::Csv => CsvOutput::new(records)
            .write_to(io::stdout().lock())
            .context("Failed to write CSV")?,
    }
    Ok(ExitCode::Success)
}

fn export<T: Tabular>(records: &[T], prefix: &str, args: &ExportArgs) -> Result<PathBuf> {
    let path = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(export_file_name(prefix, Utc::now().date_naive())));
    CsvOutput::new(records)
        .write_file(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

async fn log_code(args: LogArgs, ctx: &AppContext) -> Result<ExitCode> {
    let code = args.code.trim();
    if code.is_empty() {
        bail!("Auth code must not be empty");
    }

    let client = ctx.client()?;
    let outcome = client.log_entry(code).await;

    let exit = match &outcome {
        Ok(LogResult::Success { .. } | LogResult::Warning { .. }) => ExitCode::Success,
        Ok(LogResult::Error { .. }) | Err(_) => ExitCode::GeneralError,
    };

    match args.output {
        SummaryFormat::Text => ctx.notifier().notify(Notice::for_outcome(&outcome)),
        SummaryFormat::Json => {
            #[derive(Serialize)]
            struct LogOutput<'a> {
                code: &'a str,
                #[serde(skip_serializing_if = "Option::is_none")]
                result: Option<&'a LogResult>,
                #[serde(skip_serializing_if = "Option::is_none")]
                error: Option<String>,
            }
            let output = LogOutput {
                code,
                result: outcome.as_ref().ok(),
                error: outcome.as_ref().err().map(ApiError::user_message),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(exit)
}

async fn register_intern(form: InternRegistration, ctx: &AppContext) -> Result<ExitCode> {
    let form = form.normalized();
    form.validate()?;

    let client = ctx.client()?;
    client
        .register_intern(&form)
        .await
        .context("Error registering intern")?;
    log::info!("Registered intern {}", form.intern_id);
    ctx.notify(Notice::success(
        "Intern registered successfully! QR code has been sent to their email.",
    ));
    Ok(ExitCode::Success)
}

async fn register_visitor(form: VisitorRegistration, ctx: &AppContext) -> Result<ExitCode> {
    let form = form.normalized();
    form.validate()?;

    let client = ctx.client()?;
    client
        .register_visitor(&form)
        .await
        .context("Error registering visitor")?;
    log::info!("Registered visitor {}", form.visitor_id);
    ctx.notify(Notice::success(
        "Visitor registered successfully! Notification sent to CSO.",
    ));
    Ok(ExitCode::Success)
}

async fn download_qr_code(args: QrCodeArgs, ctx: &AppContext) -> Result<ExitCode> {
    let intern_id = args.intern_id.trim();
    if intern_id.is_empty() {
        bail!("Intern ID must not be empty");
    }

    let client = ctx.client()?;
    let bytes = fetch(ctx, "Downloading QR code", client.intern_qr_code(intern_id))
        .await
        .context("Error downloading QR code")?;
    if image::guess_format(&bytes).ok() != Some(ImageFormat::Png) {
        log::warn!("QR code for {} is not a PNG image", intern_id);
    }

    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(qr_code_file_name(intern_id)));
    fs::write(&path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    ctx.notify(Notice::success(format!(
        "QR code downloaded successfully to {}",
        path.display()
    )));
    Ok(ExitCode::Success)
}

async fn dashboard(args: DashboardArgs, ctx: &AppContext) -> Result<ExitCode> {
    let client = ctx.client()?;
    let stats = fetch(ctx, "Fetching statistics", DashboardStats::fetch(&client))
        .await
        .context("Error fetching stats")?;

    match args.output {
        SummaryFormat::Text => {
            println!("Total interns:   {}", stats.total_interns);
            println!("Total entries:   {}", stats.total_entries);
            println!("Today's entries: {}", stats.today_entries);
            println!("Total visitors:  {}", stats.total_visitors);
        }
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(ExitCode::Success)
}

fn show_config(command: ConfigCommand, ctx: &AppContext) -> Result<ExitCode> {
    match command {
        ConfigCommand::Show => print!("{}", ctx.config.to_toml()?),
        ConfigCommand::Path => match Config::default_path() {
            Some(path) => println!("{}", path.display()),
            None => bail!("No configuration directory is available on this platform"),
        },
    }
    Ok(ExitCode::Success)
}

async fn scan(args: ScanArgs, ctx: &AppContext, shutdown: &ShutdownHandler) -> Result<ExitCode> {
    let mut config = ctx.config.clone();
    if let Some(interval_ms) = args.interval_ms {
        config.scan.interval_ms = interval_ms;
    }
    if let Some(facing) = args.facing {
        config.scan.facing = facing;
    }
    if args.once {
        config.scan.exit_on_success = true;
    }
    config.validate()?;

    let source = args
        .source
        .clone()
        .or_else(|| config.scan.source.clone())
        .context("No camera source configured; pass --source or set scan.source")?;

    let client = ctx.client()?;
    let controller_config = config.controller_config();
    log::info!(
        "Scanning {} every {:?} against {}",
        source.display(),
        controller_config.sample_interval,
        client.base_url()
    );

    let notifier = ctx.notifier();
    let report = if source.is_dir() {
        let camera = DirectoryCamera::new(&source);
        run_scan(camera, client, notifier, controller_config, &args, shutdown).await?
    } else {
        let camera = SnapshotCamera::new(&source);
        run_scan(camera, client, notifier, controller_config, &args, shutdown).await?
    };

    write_report(io::stdout().lock(), &report, args.output, ctx.quiet)?;

    if shutdown.is_shutdown_requested() {
        Ok(ExitCode::Interrupted)
    } else {
        Ok(ExitCode::Success)
    }
}

async fn run_scan<C: Camera>(
    camera: C,
    client: ApiClient,
    notifier: ConsoleNotifier,
    config: ControllerConfig,
    args: &ScanArgs,
    shutdown: &ShutdownHandler,
) -> Result<ScanReport> {
    let mut controller = ScanController::new(camera, QrDecoder::new(), client, notifier, config);

    if !args.no_autostart {
        controller
            .start()
            .await
            .context("Error accessing camera")?;
    }

    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let stdin_task = tokio::spawn(forward_stdin(tx.clone()));
    let signal_task = tokio::spawn(forward_shutdown(shutdown.clone(), tx.downgrade()));

    if !args.no_autostart {
        log::info!("Scanning; type a code to log it by hand, or :stop, :start, :quit");
    }

    // `tx` stays alive so closing stdin does not end the run.
    let report = controller.run(rx).await;

    drop(tx);
    stdin_task.abort();
    signal_task.abort();
    Ok(report)
}

/// Write the end-of-scan summary. The text summary is skipped in quiet
/// mode; JSON is always written since it was asked for explicitly.
fn write_report<W: io::Write>(
    mut out: W,
    report: &ScanReport,
    format: SummaryFormat,
    quiet: bool,
) -> Result<()> {
    match format {
        SummaryFormat::Text if quiet => {}
        SummaryFormat::Text => {
            for entry in &report.logged {
                writeln!(out, "{}  {}  ({})", entry.intern_id, entry.name, entry.code)?;
            }
            writeln!(
                out,
                "{} submitted, {} logged, {} warnings, {} errors",
                report.submissions,
                report.logged.len(),
                report.warnings,
                report.errors
            )?;
        }
        SummaryFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(report)?)?,
    }
    Ok(())
}

/// Interpret one line of operator input during a scan.
///
/// Blank lines and unknown `:` commands yield `None`; anything else is a
/// manual code.
#[must_use]
pub fn parse_console_line(line: &str) -> Option<ScanCommand> {
    let trimmed = line.trim();
    match trimmed {
        "" => None,
        ":start" => Some(ScanCommand::Start),
        ":stop" => Some(ScanCommand::Stop),
        ":quit" | ":q" | ":exit" => Some(ScanCommand::Shutdown),
        other if other.starts_with(':') => {
            log::warn!("Unknown command '{}' (try :start, :stop or :quit)", other);
            None
        }
        other => Some(ScanCommand::Manual(other.to_string())),
    }
}

async fn forward_stdin(commands: mpsc::Sender<ScanCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(command) = parse_console_line(&line) else {
                    continue;
                };
                let quit = command == ScanCommand::Shutdown;
                if commands.send(command).await.is_err() || quit {
                    break;
                }
            }
            Ok(None) => {
                log::debug!("stdin closed; manual entry disabled");
                break;
            }
            Err(err) => {
                log::warn!("Failed to read stdin: {}", err);
                break;
            }
        }
    }
}

async fn forward_shutdown(shutdown: ShutdownHandler, commands: mpsc::WeakSender<ScanCommand>) {
    shutdown.wait().await;
    if let Some(commands) = commands.upgrade() {
        let _ = commands.send(ScanCommand::Shutdown).await;
    }
}
