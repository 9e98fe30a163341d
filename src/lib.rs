//! # Teelog
//!
//! A leveled structured logger that writes to the console, a size-rotated
//! file, or both at once.
//!
//! ## Features
//!
//! - Console, file, or console-and-file output
//! - Size-based rotation with backup count and age limits, optional gzip
//! - Key/value attributes and derived loggers carrying fixed context
//! - Built on the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust,no_run
//! use teelog::{Attr, Config, Logger, OutputMode};
//!
//! let logger = Logger::new(
//!     Config::new()
//!         .with_output(OutputMode::Both)
//!         .with_file("app.log"),
//! );
//!
//! let requests = logger.with([Attr::new("component", "http")]);
//! requests.info("listening", &[Attr::new("port", 8080)]);
//!
//! logger.close()?;
//! # Ok::<(), teelog::Error>(())
//! ```

pub mod attr;
pub mod builder;
pub mod config;
pub mod error;
pub mod fanout;
pub mod logger;
pub mod rotation;
pub mod writer;

pub use attr::{Attr, Value};
pub use builder::LoggerBuilder;
pub use config::{Config, Level, OutputMode};
pub use error::{Error, Result};
pub use fanout::FanOut;
pub use logger::Logger;
pub use rotation::RotationPolicy;
pub use writer::RotatingFile;

/// Start building a [`Logger`] from the default configuration.
pub fn builder() -> LoggerBuilder {
    LoggerBuilder::new()
}
