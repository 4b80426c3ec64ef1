//! Server configuration module.
//!
//! Every setting can be given as a command-line flag or through the environment,
//! with sensible defaults when neither is present.

use chrono::Utc;
use clap::{Parser, ValueEnum};
use shared::naming::DEFAULT_PREFIX;
use std::time::Duration;
use thiserror::Error;

/// Default listen address (all interfaces, port 9103).
pub const DEFAULT_LISTEN_ADDRESS: &str = ":9103";
/// Default path under which metrics are exposed.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
/// Default path under which Domoticz pushes are accepted.
pub const DEFAULT_PUSH_PATH: &str = "/domoticz-post";
/// Default staleness window in seconds.
pub const DEFAULT_STALENESS_WINDOW_SECS: u64 = 300;
/// Default interval between sweeps of expired samples, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
/// Path of the health endpoint, reserved for the server itself.
pub const HEALTH_PATH: &str = "/health";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable single-line output.
    Text,
    /// One JSON object per line.
    Json,
}

/// Errors found while validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A route path does not start with a slash.
    #[error("{flag} must start with '/', got '{path}'")]
    InvalidPath {
        /// The offending flag.
        flag: &'static str,
        /// The rejected path.
        path: String,
    },

    /// The metric prefix is not a valid Prometheus metric name.
    #[error("metric prefix '{0}' must match [a-zA-Z_:][a-zA-Z0-9_:]*")]
    InvalidPrefix(String),

    /// Two routes would be mounted on the same path.
    #[error("route path '{0}' is configured more than once")]
    PathConflict(String),

    /// A duration that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// The staleness window is too large to compute expiry timestamps.
    #[error("staleness window of {0} seconds is out of range")]
    WindowOutOfRange(u64),
}

/// Server configuration.
///
/// | flag | environment variable |
/// |---|---|
/// | `--web.listen-address` | `DOMOTICZ_EXPORTER_LISTEN_ADDRESS` |
/// | `--web.telemetry-path` | `DOMOTICZ_EXPORTER_TELEMETRY_PATH` |
/// | `--web.domoticz-push-path` | `DOMOTICZ_EXPORTER_PUSH_PATH` |
/// | `--web.push-timeout-ms` | `DOMOTICZ_EXPORTER_PUSH_TIMEOUT_MS` |
/// | `--staleness-window-secs` | `DOMOTICZ_EXPORTER_STALENESS_WINDOW_SECS` |
/// | `--sweep-interval-secs` | `DOMOTICZ_EXPORTER_SWEEP_INTERVAL_SECS` |
/// | `--metric-prefix` | `DOMOTICZ_EXPORTER_METRIC_PREFIX` |
/// | `--log-format` | `DOMOTICZ_EXPORTER_LOG_FORMAT` |
#[derive(Debug, Clone, Parser)]
#[command(name = "domoticz-exporter")]
#[command(
    author,
    version,
    about = "Exposes metrics pushed by Domoticz to Prometheus",
    long_about = None
)]
pub struct Config {
    /// Address on which to expose metrics and accept pushes.
    #[arg(
        long = "web.listen-address",
        env = "DOMOTICZ_EXPORTER_LISTEN_ADDRESS",
        default_value = DEFAULT_LISTEN_ADDRESS
    )]
    pub listen_address: String,

    /// Path under which to expose Prometheus metrics.
    #[arg(
        long = "web.telemetry-path",
        env = "DOMOTICZ_EXPORTER_TELEMETRY_PATH",
        default_value = DEFAULT_METRICS_PATH
    )]
    pub metrics_path: String,

    /// Path under which to accept POST requests from Domoticz.
    #[arg(
        long = "web.domoticz-push-path",
        env = "DOMOTICZ_EXPORTER_PUSH_PATH",
        default_value = DEFAULT_PUSH_PATH
    )]
    pub push_path: String,

    /// Give up on a push that the update worker has not accepted within this many
    /// milliseconds. Pushes wait indefinitely when unset.
    #[arg(long = "web.push-timeout-ms", env = "DOMOTICZ_EXPORTER_PUSH_TIMEOUT_MS")]
    pub push_timeout_ms: Option<u64>,

    /// Samples expire after twice this many seconds without an update.
    #[arg(
        long,
        env = "DOMOTICZ_EXPORTER_STALENESS_WINDOW_SECS",
        default_value_t = DEFAULT_STALENESS_WINDOW_SECS
    )]
    pub staleness_window_secs: u64,

    /// Seconds between sweeps of expired samples.
    #[arg(
        long,
        env = "DOMOTICZ_EXPORTER_SWEEP_INTERVAL_SECS",
        default_value_t = DEFAULT_SWEEP_INTERVAL_SECS
    )]
    pub sweep_interval_secs: u64,

    /// Prefix of exported sensor metric names.
    #[arg(
        long,
        env = "DOMOTICZ_EXPORTER_METRIC_PREFIX",
        default_value = DEFAULT_PREFIX
    )]
    pub metric_prefix: String,

    /// Log output format.
    #[arg(
        long,
        env = "DOMOTICZ_EXPORTER_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

impl Config {
    /// Parses the configuration from the command line and environment, then validates it.
    ///
    /// Exits the process with a usage message on unknown or malformed flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the parsed values fail [`Config::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a route path does not start with `/`
    /// - two routes share a path (including `/health`)
    /// - the staleness window or sweep interval is zero
    /// - the metric prefix is not a valid metric name
    /// - an expiry computed from the staleness window would overflow
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (flag, path) in [
            ("--web.telemetry-path", &self.metrics_path),
            ("--web.domoticz-push-path", &self.push_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath {
                    flag,
                    path: path.clone(),
                });
            }
            if path == HEALTH_PATH {
                return Err(ConfigError::PathConflict(path.clone()));
            }
        }
        if self.metrics_path == self.push_path {
            return Err(ConfigError::PathConflict(self.push_path.clone()));
        }
        if self.staleness_window_secs == 0 {
            return Err(ConfigError::ZeroDuration("--staleness-window-secs"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("--sweep-interval-secs"));
        }
        if self.push_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroDuration("--web.push-timeout-ms"));
        }
        if !is_valid_prefix(&self.metric_prefix) {
            return Err(ConfigError::InvalidPrefix(self.metric_prefix.clone()));
        }
        self.expiry_horizon()?;
        Ok(())
    }

    /// Returns the address to bind, expanding the `:PORT` shorthand to all interfaces.
    #[must_use]
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }

    /// Returns the staleness window.
    #[must_use]
    pub fn staleness_window(&self) -> Duration {
        Duration::from_secs(self.staleness_window_secs)
    }

    /// Returns how long a sample lives without updates: twice the staleness window.
    ///
    /// # Errors
    ///
    /// Returns an error if the doubled window does not fit a `chrono` duration, or if
    /// an expiry computed from the current time would overflow a UTC timestamp.
    pub fn expiry_horizon(&self) -> Result<chrono::TimeDelta, ConfigError> {
        self.staleness_window()
            .checked_mul(2)
            .and_then(|horizon| chrono::TimeDelta::from_std(horizon).ok())
            .filter(|horizon| Utc::now().checked_add_signed(*horizon).is_some())
            .ok_or(ConfigError::WindowOutOfRange(self.staleness_window_secs))
    }

    /// Returns the interval between sweeps of expired samples.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Returns the push timeout, if one is configured.
    #[must_use]
    pub fn push_timeout(&self) -> Option<Duration> {
        self.push_timeout_ms.map(Duration::from_millis)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            push_path: DEFAULT_PUSH_PATH.to_string(),
            push_timeout_ms: None,
            staleness_window_secs: DEFAULT_STALENESS_WINDOW_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            metric_prefix: DEFAULT_PREFIX.to_string(),
            log_format: LogFormat::Text,
        }
    }
}
