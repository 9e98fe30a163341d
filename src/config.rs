use serde::{Deserialize, Deserializer, Serialize, de};
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{Error, Result, RotationPolicy};

/// Default log file name.
pub const DEFAULT_FILE: &str = "app.log";

/// Severity threshold, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(Error::Config(format!("unknown log level: {}", other))),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => tracing::Level::TRACE,
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}

impl From<Level> for tracing_subscriber::filter::LevelFilter {
    fn from(level: Level) -> Self {
        tracing_subscriber::filter::LevelFilter::from_level(level.into())
    }
}

/// Where log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Standard output only.
    #[default]
    Console,
    /// The rotating log file only.
    File,
    /// Standard output and the rotating log file.
    Both,
}

/// Unrecognized values fall back to [`OutputMode::Console`].
impl FromStr for OutputMode {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Infallible> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "file" => OutputMode::File,
            "both" => OutputMode::Both,
            _ => OutputMode::Console,
        })
    }
}

impl<'de> Deserialize<'de> for OutputMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(mode) = s.parse::<OutputMode>();
        Ok(mode)
    }
}

/// Configuration for a [`Logger`](crate::Logger)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum severity that is written.
    pub level: Level,
    /// Output destination(s).
    pub output: OutputMode,
    /// Path to the log file.
    pub file: PathBuf,
    /// Rotation policy for the log file.
    pub rotation: RotationPolicy,
    /// Prefix each record with a timestamp.
    pub timestamps: bool,
}

impl Config {
    /// Create a new Config with defaults
    pub fn new() -> Self {
        Self {
            level: Level::default(),
            output: OutputMode::default(),
            file: PathBuf::from(DEFAULT_FILE),
            rotation: RotationPolicy::default(),
            timestamps: true,
        }
    }

    /// Set log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set output mode
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Set log file path
    pub fn with_file<P: Into<PathBuf>>(mut self, file: P) -> Self {
        self.file = file.into();
        self
    }

    /// Set every rotation parameter at once
    pub fn with_rotation(
        mut self,
        max_size_mb: u64,
        max_backups: usize,
        max_age_days: u64,
        compress: bool,
    ) -> Self {
        self.rotation = RotationPolicy::new(max_size_mb, max_backups, max_age_days, compress);
        self
    }

    /// Set rotation policy
    pub fn with_rotation_policy(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    /// Enable or disable timestamps
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Reject values the rotating file cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.file.as_os_str().is_empty() {
            return Err(Error::Config("log file path is empty".to_string()));
        }
        if self.rotation.max_size_mb == 0 {
            return Err(Error::Config(
                "rotation max_size_mb must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
