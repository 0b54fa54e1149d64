//! Letterbox Logging
//!
//! Installs the process-wide `tracing` subscriber used by every Letterbox
//! crate. Library crates only emit events through the `tracing` macros; the
//! binary calls [`LogConfig::init`] once at startup and keeps the returned
//! guard alive until exit so buffered lines are flushed.
//!
//! # Usage
//!
//! ```rust,no_run
//! use letterbox_log::LogConfig;
//!
//! let _guard = LogConfig::from_env().init().expect("logging");
//! tracing::info!(port = 465, "SMTP relay configured");
//! ```
//!
//! # Environment Variables
//!
//! - `LETTERBOX_DEBUG=1` - Force debug level
//! - `LETTERBOX_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `LETTERBOX_LOG_FORMAT=json|pretty|compact|plain` - Set output format
//! - `LETTERBOX_LOG_DIR=/var/log/letterbox` - Write daily-rotated files instead of stderr
//! - `RUST_LOG` - Full filter directive, overrides the level when present

use std::env;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// Default file prefix for rolling log files.
pub const DEFAULT_FILE_PREFIX: &str = "letterbox.log";

// ============================================================================
// Errors
// ============================================================================

/// Logging bootstrap errors.
#[derive(Debug, Error)]
pub enum LogError {
    /// Unknown level name
    #[error("Unknown log level: {0}")]
    InvalidLevel(String),

    /// Unknown format name
    #[error("Unknown log format: {0}")]
    InvalidFormat(String),

    /// Output could not be prepared
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level for emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    /// Directive string understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            other => Err(LogError::InvalidLevel(other.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One JSON object per line
    Json,
    /// Multi-line human readable output
    Pretty,
    /// Single-line abbreviated output
    Compact,
    /// Default `tracing-subscriber` text output
    Plain,
}

impl FromStr for Format {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "plain" | "text" => Ok(Format::Plain),
            other => Err(LogError::InvalidFormat(other.to_string())),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stderr,
    Stdout,
    /// Daily-rotated files under `directory`
    RollingFile { directory: PathBuf, prefix: String },
}

// ============================================================================
// Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub output: Output,
    /// Include the event target (module path)
    pub targets: bool,
    /// ANSI colors for the text formats
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            output: Output::Stderr,
            targets: true,
            ansi: false,
        }
    }
}

impl LogConfig {
    /// Create config from `LETTERBOX_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        let debug = flag("LETTERBOX_DEBUG");
        let level = lookup("LETTERBOX_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { Level::Info });
        let level = if debug { level.min(Level::Debug) } else { level };

        let format = lookup("LETTERBOX_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Format::Json);

        let output = match lookup("LETTERBOX_LOG_DIR").filter(|d| !d.trim().is_empty()) {
            Some(dir) => Output::RollingFile {
                directory: PathBuf::from(dir),
                prefix: DEFAULT_FILE_PREFIX.to_string(),
            },
            None => Output::Stderr,
        };

        let ansi = matches!(output, Output::Stderr | Output::Stdout)
            && lookup("NO_COLOR").is_none()
            && lookup("TERM").is_some();

        Self {
            level,
            format,
            output,
            targets: true,
            ansi,
        }
    }

    /// Set the level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Write daily-rotated files into `directory`.
    pub fn rolling_file(mut self, directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.output = Output::RollingFile {
            directory: directory.into(),
            prefix: prefix.into(),
        };
        self.ansi = false;
        self
    }

    /// Install the global subscriber.
    ///
    /// The returned guard must be held for the lifetime of the process.
    /// A second call keeps the subscriber that is already installed.
    pub fn init(self) -> Result<WorkerGuard, LogError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));

        let (writer, guard) = match &self.output {
            Output::Stderr => tracing_appender::non_blocking(io::stderr()),
            Output::Stdout => tracing_appender::non_blocking(io::stdout()),
            Output::RollingFile { directory, prefix } => {
                std::fs::create_dir_all(directory).map_err(|e| {
                    LogError::Init(format!("cannot create {}: {}", directory.display(), e))
                })?;
                tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, prefix))
            }
        };

        let installed = match self.format {
            Format::Json => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tfmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_target(self.targets),
                )
                .try_init(),
            Format::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tfmt::layer()
                        .pretty()
                        .with_writer(writer)
                        .with_target(self.targets)
                        .with_ansi(self.ansi),
                )
                .try_init(),
            Format::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tfmt::layer()
                        .compact()
                        .with_writer(writer)
                        .with_target(self.targets)
                        .with_ansi(self.ansi),
                )
                .try_init(),
            Format::Plain => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tfmt::layer()
                        .with_writer(writer)
                        .with_target(self.targets)
                        .with_ansi(self.ansi),
                )
                .try_init(),
        };

        if let Err(e) = installed {
            tracing::debug!(error = %e, "global subscriber already installed");
        }

        Ok(guard)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("off".parse::<Level>().unwrap(), Level::Off);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("Pretty".parse::<Format>().unwrap(), Format::Pretty);
        assert_eq!("text".parse::<Format>().unwrap(), Format::Plain);
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn test_defaults_without_env() {
        let config = LogConfig::from_vars(vars(&[]));
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.output, Output::Stderr);
    }

    #[test]
    fn test_debug_flag_lowers_level() {
        let config = LogConfig::from_vars(vars(&[
            ("LETTERBOX_DEBUG", "true"),
            ("LETTERBOX_LOG_LEVEL", "error"),
        ]));
        assert_eq!(config.level, Level::Debug);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = LogConfig::from_vars(vars(&[
            ("LETTERBOX_LOG_LEVEL", "chatty"),
            ("LETTERBOX_LOG_FORMAT", "yaml"),
        ]));
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.format, Format::Json);
    }

    #[test]
    fn test_log_dir_selects_rolling_file() {
        let config = LogConfig::from_vars(vars(&[("LETTERBOX_LOG_DIR", "/tmp/lb-logs")]));
        assert_eq!(
            config.output,
            Output::RollingFile {
                directory: PathBuf::from("/tmp/lb-logs"),
                prefix: DEFAULT_FILE_PREFIX.to_string(),
            }
        );
        assert!(!config.ansi);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let first = LogConfig::default()
            .rolling_file(dir.path().join("logs"), "test.log")
            .init();
        assert!(first.is_ok());
        assert!(dir.path().join("logs").is_dir());

        let second = LogConfig::default().format(Format::Compact).init();
        assert!(second.is_ok());
    }
}
