//! Scanner module for the camera-to-decode-to-log pipeline.
//!
//! This module provides functionality for:
//! - Acquiring a video stream from a [`Camera`]
//! - Sampling frames on a fixed interval and decoding QR codes
//! - Suppressing repeat detections of an unmoving code
//! - Dispatching decoded or manually typed auth codes to an [`EntryLogger`]
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`camera`]: Camera acquisition and frame sources
//! - [`decoder`]: Pixel buffer to QR payload decoding
//! - [`session`]: The `Idle -> Scanning -> Idle` state machine
//! - [`controller`]: The cooperative event loop that drives a session
//!
//! # Example
//!
//! ```no_run
//! use rollcall::api::ApiClient;
//! use rollcall::notify::ConsoleNotifier;
//! use rollcall::scanner::{
//!     CaptureConstraints, ControllerConfig, QrDecoder, ScanCommand, ScanController, SnapshotCamera,
//! };
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let camera = SnapshotCamera::new("/tmp/webcam.jpg");
//! let client = ApiClient::new("http://localhost:8080/api", Duration::from_secs(10))?;
//! let config = ControllerConfig::default();
//! let controller = ScanController::new(camera, QrDecoder::new(), client, ConsoleNotifier::new(), config);
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(16);
//! tx.send(ScanCommand::Start).await?;
//! let report = controller.run(rx).await;
//! println!("{} entries logged", report.logged.len());
//! # Ok(())
//! # }
//! ```
//!
//! [`EntryLogger`]: crate::api::EntryLogger

pub mod camera;
pub mod controller;
pub mod decoder;
pub mod session;

use std::time::Duration;

// Re-export main types
pub use camera::{
    AcquisitionError, Camera, CaptureConstraints, CaptureError, DirectoryCamera, Facing,
    SnapshotCamera, VideoStream,
};
pub use controller::{
    ControllerConfig, LoggedEntry, ScanCommand, ScanController, ScanReport, DEFAULT_SHUTDOWN_GRACE,
};
pub use decoder::{Decoder, QrDecoder};
pub use session::{Origin, Resolution, ScanSession, SessionState, Submission};

/// Default delay between two frame samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(400);

/// A captured video frame.
///
/// Pixels are tightly packed RGBA8, row-major, `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// RGBA8 pixel data
    pub pixels: Vec<u8>,
    /// Position of this frame in its stream, starting at 1
    pub sequence: u64,
}

impl Frame {
    /// Create a new frame.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, sequence: u64) -> Self {
        Self {
            width,
            height,
            pixels,
            sequence,
        }
    }

    /// Build a frame from a decoded image.
    #[must_use]
    pub fn from_image(image: &image::DynamicImage, sequence: u64) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw(), sequence)
    }
}

/// A decoded value together with the frame it was found in.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    /// Decoded QR payload
    pub value: String,
    /// Source frame
    pub frame: Frame,
}
