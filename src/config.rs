//! Application configuration management.
//!
//! Settings are layered with `figment`, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <PATH>`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed `ROLLCALL_`, with `__` for nesting
//!    (`ROLLCALL_SCAN__INTERVAL_MS=250`)
//! 4. Command-line flags, applied by the caller
//!
//! ```toml
//! api_url = "http://attendance.local:8080/api"
//! request_timeout_secs = 5
//!
//! [scan]
//! interval_ms = 300
//! facing = "user"
//! source = "/run/webcam/latest.jpg"
//! exit_on_success = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::scanner::{CaptureConstraints, ControllerConfig, Facing, DEFAULT_SAMPLE_INTERVAL};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ROLLCALL_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend API.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Scanner settings.
    pub scan: ScanConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 10,
            scan: ScanConfig::default(),
        }
    }
}

/// Scanner settings (`[scan]` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Delay between frame samples in milliseconds.
    pub interval_ms: u64,
    /// Preferred camera orientation.
    pub facing: Facing,
    /// Snapshot file or frame directory used as the camera.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Stop after the first logged entry.
    pub exit_on_success: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SAMPLE_INTERVAL.as_millis() as u64,
            facing: Facing::default(),
            source: None,
            exit_on_success: false,
        }
    }
}

impl Config {
    /// Build the layered figment for an optional config file.
    ///
    /// A missing file contributes nothing.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration.
    ///
    /// With `explicit` set the file must exist; otherwise the platform
    /// default path is used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, if any layer fails
    /// to parse, or if validation fails.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::load_from_path(Some(path))
            }
            None => {
                let default = Self::default_path();
                match default.as_deref() {
                    Some(path) if path.is_file() => {
                        log::debug!("Using config file {}", path.display());
                        Self::load_from_path(Some(path))
                    }
                    _ => Self::load_from_path(None),
                }
            }
        }
    }

    /// Load from a specific file (or none) plus the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn load_from_path(file: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(file)
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Default platform-specific configuration file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "rollcall", "rollcall")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reject settings the scanner cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            bail!("api_url must not be empty");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.scan.interval_ms == 0 {
            bail!("scan.interval_ms must be greater than zero");
        }
        Ok(())
    }

    /// Request timeout as a duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Sampling interval as a duration.
    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.scan.interval_ms)
    }

    /// Scan controller settings.
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            sample_interval: self.sample_interval(),
            constraints: CaptureConstraints {
                facing: self.scan.facing,
            },
            exit_on_success: self.scan.exit_on_success,
            shutdown_grace: self.request_timeout(),
        }
    }

    /// Serialize to TOML, e.g. for `rollcall config show`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
