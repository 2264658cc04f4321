//! Cooperative driver for a [`ScanSession`].
//!
//! The controller runs on a single task and multiplexes three sources:
//! operator commands, the sampling timer (only while scanning) and the
//! completion of in-flight submissions. Submissions are never awaited
//! inline, so a slow backend does not stall sampling or commands.
//!
//! Requests are never cancelled by the operator: leaving the loop stops the
//! session and then waits for whatever is still in flight, bounded by
//! [`ControllerConfig::shutdown_grace`] on an explicit shutdown.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

use super::camera::{AcquisitionError, Camera, CaptureConstraints};
use super::decoder::Decoder;
use super::session::{ScanSession, Submission};
use super::DEFAULT_SAMPLE_INTERVAL;
use crate::api::{ApiError, EntryLogger, LogResult};
use crate::notify::{Notice, Notifier};

/// Commands accepted by [`ScanController::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCommand {
    /// Start (or restart) scanning
    Start,
    /// Stop scanning; in-flight submissions still complete
    Stop,
    /// Submit an operator-typed code
    Manual(String),
    /// Stop and leave the loop once in-flight submissions settle
    Shutdown,
}

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Delay between frame samples
    pub sample_interval: Duration,
    /// Constraints passed to the camera
    pub constraints: CaptureConstraints,
    /// Leave the loop once a logged entry ends the running session
    pub exit_on_success: bool,
    /// How long a shutdown waits for in-flight submissions
    pub shutdown_grace: Duration,
}

/// Default wait for in-flight submissions on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            constraints: CaptureConstraints::default(),
            exit_on_success: false,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

/// An entry the backend confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedEntry {
    /// Code that was submitted
    pub code: String,
    /// Intern name returned by the backend
    pub name: String,
    /// Intern id returned by the backend
    pub intern_id: String,
}

/// Summary of one controller run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Requests sent to the entry logger
    pub submissions: usize,
    /// Confirmed entries, in completion order
    pub logged: Vec<LoggedEntry>,
    /// Warning results
    pub warnings: usize,
    /// Error results and failed requests
    pub errors: usize,
    /// Failed camera starts
    pub acquisition_failures: usize,
}

type Pending = BoxFuture<'static, (Submission, Result<LogResult, ApiError>)>;

/// Drives a scan session against a camera, a decoder, an entry logger and
/// a notifier.
pub struct ScanController<C: Camera, D, L, N> {
    camera: C,
    decoder: D,
    logger: Arc<L>,
    notifier: N,
    session: ScanSession<C::Stream>,
    in_flight: FuturesUnordered<Pending>,
    report: ScanReport,
    exit_on_success: bool,
    shutdown_grace: Duration,
}

impl<C, D, L, N> ScanController<C, D, L, N>
where
    C: Camera,
    D: Decoder,
    L: EntryLogger + Send + Sync + 'static,
    N: Notifier,
{
    /// Create an idle controller.
    pub fn new(camera: C, decoder: D, logger: L, notifier: N, config: ControllerConfig) -> Self {
        Self {
            camera,
            decoder,
            logger: Arc::new(logger),
            notifier,
            session: ScanSession::new(config.sample_interval, config.constraints),
            in_flight: FuturesUnordered::new(),
            report: ScanReport::default(),
            exit_on_success: config.exit_on_success,
            shutdown_grace: config.shutdown_grace,
        }
    }

    /// The underlying session.
    pub fn session(&self) -> &ScanSession<C::Stream> {
        &self.session
    }

    /// Counters so far.
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// The notifier notices are sent to.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Number of submissions awaiting a response.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Start scanning.
    ///
    /// # Errors
    ///
    /// Returns the camera's [`AcquisitionError`]; the session stays idle.
    pub async fn start(&mut self) -> Result<(), AcquisitionError> {
        match self.session.start(&mut self.camera).await {
            Ok(()) => {
                log::info!("Scanning started");
                Ok(())
            }
            Err(err) => {
                self.report.acquisition_failures += 1;
                log::error!("Camera acquisition failed: {}", err);
                Err(err)
            }
        }
    }

    /// Stop scanning. In-flight submissions are left to complete.
    pub fn stop(&mut self) {
        if self.session.is_active() {
            log::info!("Scanning stopped");
        }
        self.session.stop();
    }

    /// Sample one frame and dispatch a new detection.
    pub fn sample(&mut self) {
        let Some(event) = self.session.sample_frame(&self.decoder) else {
            return;
        };
        match self.session.on_detection(&event) {
            Some(submission) => {
                self.notifier
                    .notify(Notice::info(format!("QR Detected: {}", submission.code)));
                self.dispatch(submission);
            }
            None => log::trace!("Ignoring repeat detection of '{}'", event.value),
        }
    }

    /// Submit operator input. Returns `false` for blank input.
    pub fn submit_manual(&mut self, input: &str) -> bool {
        match self.session.submit_manual(input) {
            Some(submission) => {
                self.dispatch(submission);
                true
            }
            None => {
                log::debug!("Ignoring blank manual input");
                false
            }
        }
    }

    /// Wait for every in-flight submission and apply its outcome.
    pub async fn settle(&mut self) {
        while let Some((submission, outcome)) = self.in_flight.next().await {
            self.complete(submission, outcome);
        }
    }

    /// Run the event loop until shutdown and return the counters.
    ///
    /// The loop ends on [`ScanCommand::Shutdown`], when the command channel
    /// closes and nothing is left in flight, or when `exit_on_success` is set
    /// and a logged entry ends the running session. A success for an older
    /// or already stopped session does not count.
    ///
    /// The session is always stopped before returning, then in-flight
    /// submissions are settled. After a shutdown that wait is bounded by
    /// the configured grace period.
    pub async fn run(mut self, mut commands: mpsc::Receiver<ScanCommand>) -> ScanReport {
        let mut commands_open = true;
        let mut shutdown = false;

        loop {
            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(ScanCommand::Start) => {
                        if let Err(err) = self.start().await {
                            self.notifier
                                .notify(Notice::error(format!("Error accessing camera: {err}")));
                        }
                    }
                    Some(ScanCommand::Stop) => self.stop(),
                    Some(ScanCommand::Manual(input)) => {
                        self.submit_manual(&input);
                    }
                    Some(ScanCommand::Shutdown) => {
                        log::debug!("Shutdown requested with {} in flight", self.in_flight.len());
                        shutdown = true;
                        break;
                    }
                    None => {
                        log::debug!("Command channel closed");
                        commands_open = false;
                        self.stop();
                    }
                },
                _ = self.session.tick(), if self.session.is_active() => self.sample(),
                Some((submission, outcome)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    if self.complete(submission, outcome) && self.exit_on_success {
                        break;
                    }
                }
                else => break,
            }
        }

        self.stop();
        if !shutdown {
            self.settle().await;
        } else if tokio::time::timeout(self.shutdown_grace, self.settle())
            .await
            .is_err()
        {
            log::warn!(
                "Gave up on {} in-flight submission(s) after {:?}",
                self.in_flight.len(),
                self.shutdown_grace
            );
        }
        self.report
    }

    fn dispatch(&mut self, submission: Submission) {
        log::info!(
            "Submitting {} code '{}'",
            submission.origin,
            submission.code
        );
        self.report.submissions += 1;

        let logger = Arc::clone(&self.logger);
        let pending = async move {
            let outcome = logger.log_entry(&submission.code).await;
            (submission, outcome)
        };
        self.in_flight.push(pending.boxed());
    }

    /// Record an outcome and notify. Returns whether it ended the running
    /// session.
    fn complete(&mut self, submission: Submission, outcome: Result<LogResult, ApiError>) -> bool {
        match &outcome {
            Ok(LogResult::Success { name, intern_id }) => {
                log::info!("Entry logged for {} ({})", name, intern_id);
                self.report.logged.push(LoggedEntry {
                    code: submission.code.clone(),
                    name: name.clone(),
                    intern_id: intern_id.clone(),
                });
            }
            Ok(LogResult::Warning { message }) => {
                log::warn!("Code '{}': {}", submission.code, message);
                self.report.warnings += 1;
            }
            Ok(LogResult::Error { message }) => {
                log::warn!(
                    "Code '{}' rejected: {}",
                    submission.code,
                    message.as_deref().unwrap_or("no reason given")
                );
                self.report.errors += 1;
            }
            Err(err) => {
                log::error!("Logging '{}' failed: {}", submission.code, err);
                self.report.errors += 1;
            }
        }

        let resolution = self.session.resolve(&submission, &outcome);
        self.notifier.notify(resolution.notice);
        resolution.ended_session
    }
}
