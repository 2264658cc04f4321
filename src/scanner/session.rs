//! The scan session state machine.
//!
//! A session is either idle or scanning. While scanning it owns exactly one
//! camera stream and one sampling timer; [`ScanSession::stop`] drops both.
//!
//! ```text
//! Idle --start()--> Scanning --stop() / success / drop--> Idle
//! ```
//!
//! Starting while already scanning performs a full stop first, so a session
//! never holds two streams.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::camera::{AcquisitionError, Camera, CaptureConstraints, VideoStream};
use super::decoder::Decoder;
use super::DetectionEvent;
use crate::api::{ApiError, LogResult};
use crate::notify::Notice;

/// Shortest sampling period a session accepts.
const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No stream, no timer
    Idle,
    /// Sampling frames from a live stream
    Scanning,
}

/// Where a submitted code came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Decoded from a camera frame
    Camera,
    /// Typed in by the operator
    Manual,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Camera => write!(f, "camera"),
            Origin::Manual => write!(f, "manual"),
        }
    }
}

/// A code ready to be sent to the entry logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Auth code, already trimmed for manual input
    pub code: String,
    /// Camera or manual
    pub origin: Origin,
    /// Session epoch the code was submitted in
    pub epoch: u64,
}

/// What applying a submission outcome did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Notice for the operator
    pub notice: Notice,
    /// Whether the outcome ended the running session
    pub ended_session: bool,
}

/// One scanning session over a camera stream of type `S`.
#[derive(Debug)]
pub struct ScanSession<S: VideoStream> {
    stream: Option<S>,
    sampler: Option<Interval>,
    last_decoded: Option<String>,
    epoch: u64,
    period: Duration,
    constraints: CaptureConstraints,
}

impl<S: VideoStream> ScanSession<S> {
    /// Create an idle session that samples every `period` once started.
    #[must_use]
    pub fn new(period: Duration, constraints: CaptureConstraints) -> Self {
        Self {
            stream: None,
            sampler: None,
            last_decoded: None,
            epoch: 0,
            period: period.max(MIN_SAMPLE_INTERVAL),
            constraints,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.stream.is_some() {
            SessionState::Scanning
        } else {
            SessionState::Idle
        }
    }

    /// Whether the session holds a stream.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Last distinct value decoded in this session.
    #[must_use]
    pub fn last_decoded(&self) -> Option<&str> {
        self.last_decoded.as_deref()
    }

    /// Number of successful starts so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Sampling period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// The live stream, if scanning.
    #[must_use]
    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Acquire a stream from `camera` and begin sampling.
    ///
    /// A running session is stopped before the camera is asked again.
    ///
    /// # Errors
    ///
    /// Returns the camera's [`AcquisitionError`]. The session is left idle.
    pub async fn start<C>(&mut self, camera: &mut C) -> Result<(), AcquisitionError>
    where
        C: Camera<Stream = S>,
    {
        if self.is_active() {
            log::debug!("Restarting: releasing the current stream first");
            self.stop();
        }

        let stream = camera.acquire(&self.constraints).await?;

        self.stream = Some(stream);
        self.last_decoded = None;
        self.epoch += 1;

        let mut sampler = time::interval_at(Instant::now() + self.period, self.period);
        sampler.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.sampler = Some(sampler);

        log::debug!(
            "Session epoch {} sampling every {:?}",
            self.epoch,
            self.period
        );
        Ok(())
    }

    /// Wait for the next sampling tick.
    ///
    /// Never resolves while idle.
    pub async fn tick(&mut self) {
        match self.sampler.as_mut() {
            Some(sampler) => {
                sampler.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Read the current frame, if a new one is ready, and decode it.
    ///
    /// Returns `None` when idle, when no new frame is ready, when the frame
    /// cannot be read, and when nothing decodes.
    pub fn sample_frame<D: Decoder + ?Sized>(&mut self, decoder: &D) -> Option<DetectionEvent> {
        let stream = self.stream.as_mut()?;
        let frame = match stream.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(err) => {
                log::debug!("Skipping unreadable frame: {}", err);
                return None;
            }
        };

        let value = decoder.decode(&frame.pixels, frame.width, frame.height)?;
        log::trace!("Frame {} decoded to '{}'", frame.sequence, value);
        Some(DetectionEvent { value, frame })
    }

    /// Apply repeat suppression to a detection.
    ///
    /// A value equal to the last decoded one yields `None`. Anything else
    /// becomes the new last value and is returned as a camera submission.
    pub fn on_detection(&mut self, event: &DetectionEvent) -> Option<Submission> {
        if self.last_decoded.as_deref() == Some(event.value.as_str()) {
            return None;
        }
        self.last_decoded = Some(event.value.clone());
        Some(Submission {
            code: event.value.clone(),
            origin: Origin::Camera,
            epoch: self.epoch,
        })
    }

    /// Turn operator input into a submission.
    ///
    /// Input is trimmed and empty input is ignored. There is no repeat
    /// suppression and the session may be idle.
    #[must_use]
    pub fn submit_manual(&self, input: &str) -> Option<Submission> {
        let code = input.trim();
        if code.is_empty() {
            return None;
        }
        Some(Submission {
            code: code.to_string(),
            origin: Origin::Manual,
            epoch: self.epoch,
        })
    }

    /// Apply the outcome of a submission and produce the operator notice.
    ///
    /// A success stops the session only when it belongs to the running
    /// epoch; `ended_session` reports exactly that. The notice is produced
    /// either way.
    pub fn resolve(
        &mut self,
        submission: &Submission,
        outcome: &Result<LogResult, ApiError>,
    ) -> Resolution {
        let mut ended_session = false;
        if matches!(outcome, Ok(LogResult::Success { .. })) {
            if self.is_active() && submission.epoch == self.epoch {
                self.stop();
                ended_session = true;
            } else {
                log::debug!(
                    "Late success for '{}' (epoch {}, current {}); session untouched",
                    submission.code,
                    submission.epoch,
                    self.epoch
                );
            }
        }
        Resolution {
            notice: Notice::for_outcome(outcome),
            ended_session,
        }
    }

    /// Stop sampling and release the stream. No-op when idle.
    pub fn stop(&mut self) {
        self.sampler = None;
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::debug!("Session epoch {} stopped", self.epoch);
        }
    }
}

impl<S: VideoStream> Drop for ScanSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
