//! Basic console logging example.
//!
//! This example demonstrates the simplest way to build a logger with the
//! builder API and attach context to it.

use teelog::{Attr, Level};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = teelog::builder().with_level(Level::Debug).build()?;

    logger.debug("This is a debug message", &[]);
    logger.info("This is an info message", &[]);
    logger.warn("This is a warning message", &[]);
    logger.error(
        "This is an error message",
        &[Attr::new("error", "something went wrong")],
    );

    let session = logger.with([Attr::new("user", "bob"), Attr::new("session", 42)]);
    session.info("User session ended", &[Attr::new("duration_ms", 1234)]);

    logger.close()?;
    Ok(())
}
