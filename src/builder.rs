//! Builder pattern for constructing a [`Logger`].
//!
//! This module provides a convenient builder API for configuring and building
//! a logger in a single chain of method calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use teelog::{Level, OutputMode};
//!
//! let logger = teelog::builder()
//!     .with_level(Level::Debug)
//!     .with_output(OutputMode::Both)
//!     .with_file("/var/log/app.log")
//!     .with_rotation(10, 5, 7, true)
//!     .build()
//!     .expect("invalid logging configuration");
//!
//! logger.info("ready", &[]);
//! logger.close().expect("failed to close log file");
//! ```

use crate::{Config, Level, Logger, OutputMode, Result, RotationPolicy};
use std::io::Write;
use std::path::PathBuf;

/// A builder for configuring and constructing a [`Logger`].
///
/// Setters apply in call order; a later call overrides an earlier one.
#[derive(Debug, Clone, Default)]
pub struct LoggerBuilder {
    config: Config,
}

impl LoggerBuilder {
    /// Create a new LoggerBuilder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    /// Create a LoggerBuilder from an existing configuration.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the severity threshold.
    pub fn with_level(mut self, level: Level) -> Self {
        self.config = self.config.with_level(level);
        self
    }

    /// Choose console, file or both.
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.config = self.config.with_output(output);
        self
    }

    /// Set the log file path.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_file(path);
        self
    }

    /// Set max size (MB), max backups, max age (days) and compression.
    pub fn with_rotation(
        mut self,
        max_size_mb: u64,
        max_backups: usize,
        max_age_days: u64,
        compress: bool,
    ) -> Self {
        self.config = self
            .config
            .with_rotation(max_size_mb, max_backups, max_age_days, compress);
        self
    }

    pub fn with_rotation_policy(mut self, rotation: RotationPolicy) -> Self {
        self.config = self.config.with_rotation_policy(rotation);
        self
    }

    /// Prefix records with a timestamp (on by default).
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.config = self.config.with_timestamps(timestamps);
        self
    }

    /// Get the current configuration without building.
    pub fn config(self) -> Config {
        self.config
    }

    /// Validate the configuration and build a logger writing to standard output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the file path is
    /// empty or the maximum file size is zero.
    pub fn build(self) -> Result<Logger> {
        self.config.validate()?;
        Ok(Logger::new(self.config))
    }

    /// Like [`LoggerBuilder::build`], with `console` standing in for standard output.
    pub fn build_with_console<C>(self, console: C) -> Result<Logger>
    where
        C: Write + Send + 'static,
    {
        self.config.validate()?;
        Ok(Logger::with_console(self.config, console))
    }
}
