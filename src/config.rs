//! Daemon configuration parameters
//!
//! All tunable parameters for the servo daemon.  Values come from built-in
//! defaults, optionally overridden by a JSON file and then by command-line
//! flags.  Channel state is never persisted; only process settings live here.

use std::fmt;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::scheduler::FRAME_PERIOD_US;

/// Which register backend drives the pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpioBackend {
    /// Memory-mapped BCM2835 register block.
    #[default]
    Mmap,
    /// In-memory pins; for dry runs off the Pi.
    Simulated,
}

/// Core daemon configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    // --- Control socket ---
    /// Filesystem path of the Unix control socket
    pub socket_path: PathBuf,
    /// Permission bits applied to the socket file after bind
    pub socket_mode: u32,
    /// Maximum simultaneous control connections
    pub max_clients: usize,

    // --- GPIO ---
    /// Character device exposing the GPIO register block
    pub gpio_device: PathBuf,
    pub gpio_backend: GpioBackend,

    // --- Timing ---
    /// PWM frame period (microseconds)
    pub frame_period_us: u32,
    /// SCHED_FIFO priority for the loop thread (0 leaves the policy alone)
    pub realtime_priority: u8,
    /// Frames between statistics reports (0 disables)
    pub stats_interval_frames: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            // Control socket
            socket_path: PathBuf::from("/tmp/piservod.sock"),
            socket_mode: 0o666,
            max_clients: 10,

            // GPIO
            gpio_device: PathBuf::from("/dev/gpiomem"),
            gpio_backend: GpioBackend::Mmap,

            // Timing
            frame_period_us: FRAME_PERIOD_US, // 50 Hz
            realtime_priority: 99,
            stats_interval_frames: 3000, // 1/min at 50 Hz
        }
    }
}

impl DaemonConfig {
    /// Load from `path` if given, else use defaults.  The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => ConfigError::NotFound,
                    _ => ConfigError::IoError,
                })?;
                let cfg = Self::from_json(&text)?;
                info!("config: loaded {}", path.display());
                cfg
            }
            None => {
                info!("config: no file given, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5_000..=1_000_000).contains(&self.frame_period_us) {
            return Err(ConfigError::ValidationFailed(
                "frame_period_us must be 5000–1000000",
            ));
        }
        if !(1..=64).contains(&self.max_clients) {
            return Err(ConfigError::ValidationFailed("max_clients must be 1–64"));
        }
        if self.realtime_priority > 99 {
            return Err(ConfigError::ValidationFailed(
                "realtime_priority must be 0–99",
            ));
        }
        if self.socket_mode > 0o777 {
            return Err(ConfigError::ValidationFailed(
                "socket_mode must be a permission mask (≤ 0o777)",
            ));
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed("socket_path must not be empty"));
        }
        Ok(())
    }
}

/// Errors from loading or validating a [`DaemonConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The named config file does not exist.
    NotFound,
    /// The file is not a valid JSON config document.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error reading the file.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config file not found"),
            Self::Corrupted => write!(f, "config file is not valid JSON for this daemon"),
            Self::ValidationFailed(why) => write!(f, "invalid config: {why}"),
            Self::IoError => write!(f, "config file could not be read"),
        }
    }
}

impl std::error::Error for ConfigError {}
