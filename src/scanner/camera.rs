//! Camera acquisition and frame sources.
//!
//! A [`Camera`] hands out a [`VideoStream`] once access is granted. The
//! session owns that stream exclusively and calls [`VideoStream::stop`] when
//! scanning ends, which releases the underlying device.
//!
//! Two file-backed cameras are provided:
//!
//! - [`SnapshotCamera`] watches one image file that an external capture tool
//!   keeps overwriting (`fswebcam`, `libcamera-still --timelapse`, ...). A new
//!   frame is ready whenever the file's modification time changes.
//! - [`DirectoryCamera`] replays the images of a directory in name order, one
//!   per sample.

use std::collections::VecDeque;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Frame;

/// Image extensions recognised by [`DirectoryCamera`].
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

/// Preferred camera orientation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear-facing camera, pointed away from the operator
    #[default]
    Environment,
    /// Front-facing camera
    User,
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Environment => write!(f, "environment"),
            Facing::User => write!(f, "user"),
        }
    }
}

/// Constraints passed to [`Camera::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureConstraints {
    /// Which way the camera should face.
    pub facing: Facing,
}

/// Camera access was refused or the device could not be opened.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The camera source does not exist.
    #[error("camera source not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Access to the camera source was denied.
    #[error("permission denied for camera source: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// The source exists but is the wrong kind of thing.
    #[error("camera source {} is not a {expected}", path.display())]
    Unsupported {
        /// Path that was opened
        path: PathBuf,
        /// What the camera expected to find there
        expected: &'static str,
    },

    /// Any other device failure.
    #[error("camera device error on {}: {source}", path.display())]
    Device {
        /// Path that was opened
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl AcquisitionError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Device {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// A single frame could not be read. Never fatal to the session.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// I/O error while reading the frame.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The frame data could not be decoded as an image.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// A source of video streams.
pub trait Camera {
    /// Stream type handed out on a successful acquisition.
    type Stream: VideoStream;

    /// Request access to the camera.
    ///
    /// This is the suspension point where a permission prompt would be shown.
    fn acquire(
        &mut self,
        constraints: &CaptureConstraints,
    ) -> impl Future<Output = Result<Self::Stream, AcquisitionError>> + Send;
}

/// A live stream of frames owned by one scan session.
pub trait VideoStream {
    /// Return the next frame if a new one is ready.
    ///
    /// `Ok(None)` means nothing new since the last call and is the common
    /// case between capture updates.
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Stop all tracks and release the device. Must be idempotent.
    fn stop(&mut self);

    /// Whether the stream still holds the device.
    fn is_live(&self) -> bool;
}

/// Camera backed by a snapshot file that is rewritten by a capture tool.
#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    path: PathBuf,
}

impl SnapshotCamera {
    /// Create a camera watching `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the watched snapshot.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Camera for SnapshotCamera {
    type Stream = SnapshotStream;

    async fn acquire(
        &mut self,
        constraints: &CaptureConstraints,
    ) -> Result<SnapshotStream, AcquisitionError> {
        let metadata =
            fs::metadata(&self.path).map_err(|e| AcquisitionError::from_io(&self.path, e))?;
        if !metadata.is_file() {
            return Err(AcquisitionError::Unsupported {
                path: self.path.clone(),
                expected: "file",
            });
        }
        // Opening proves read access before the timer starts.
        fs::File::open(&self.path).map_err(|e| AcquisitionError::from_io(&self.path, e))?;

        log::debug!(
            "Snapshot camera {} acquired (facing preference '{}' not applicable)",
            self.path.display(),
            constraints.facing
        );

        Ok(SnapshotStream {
            path: self.path.clone(),
            last_modified: None,
            sequence: 0,
            live: true,
        })
    }
}

/// Stream produced by [`SnapshotCamera`].
#[derive(Debug)]
pub struct SnapshotStream {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    sequence: u64,
    live: bool,
}

impl VideoStream for SnapshotStream {
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if !self.live {
            return Ok(None);
        }

        let modified = fs::metadata(&self.path)?.modified()?;
        if self.last_modified == Some(modified) {
            return Ok(None);
        }

        // A half-written snapshot fails here and is retried on the next sample,
        // since last_modified is only advanced after a clean decode.
        let image = image::open(&self.path)?;
        self.last_modified = Some(modified);
        self.sequence += 1;
        Ok(Some(Frame::from_image(&image, self.sequence)))
    }

    fn stop(&mut self) {
        if self.live {
            log::debug!("Released snapshot camera {}", self.path.display());
        }
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Camera that replays the images in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryCamera {
    dir: PathBuf,
}

impl DirectoryCamera {
    /// Create a camera replaying the images found in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Camera for DirectoryCamera {
    type Stream = DirectoryStream;

    async fn acquire(
        &mut self,
        _constraints: &CaptureConstraints,
    ) -> Result<DirectoryStream, AcquisitionError> {
        let metadata =
            fs::metadata(&self.dir).map_err(|e| AcquisitionError::from_io(&self.dir, e))?;
        if !metadata.is_dir() {
            return Err(AcquisitionError::Unsupported {
                path: self.dir.clone(),
                expected: "directory",
            });
        }

        let mut frames: Vec<PathBuf> = fs::read_dir(&self.dir)
            .map_err(|e| AcquisitionError::from_io(&self.dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame_file(path))
            .collect();
        frames.sort();

        log::debug!(
            "Directory camera {} acquired with {} frames",
            self.dir.display(),
            frames.len()
        );

        Ok(DirectoryStream {
            frames: frames.into(),
            sequence: 0,
            live: true,
        })
    }
}

/// Stream produced by [`DirectoryCamera`].
#[derive(Debug)]
pub struct DirectoryStream {
    frames: VecDeque<PathBuf>,
    sequence: u64,
    live: bool,
}

impl DirectoryStream {
    /// Number of frames not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl VideoStream for DirectoryStream {
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if !self.live {
            return Ok(None);
        }
        let Some(path) = self.frames.pop_front() else {
            return Ok(None);
        };
        let image = image::open(&path)?;
        self.sequence += 1;
        Ok(Some(Frame::from_image(&image, self.sequence)))
    }

    fn stop(&mut self) {
        self.live = false;
        self.frames.clear();
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            FRAME_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
