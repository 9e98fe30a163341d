//! Example of loading logging configuration from a TOML document.
//!
//! Run with:
//! ```bash
//! cargo run --example config_toml
//! ```

use serde::Deserialize;
use teelog::{Attr, Logger};

const CONFIG: &str = r#"
[log]
level = "debug"
output = "both"
file = "logs/config_toml.log"

[log.rotation]
max_size_mb = 10
max_backups = 5
max_age_days = 14
compress = true
"#;

#[derive(Deserialize)]
struct AppConfig {
    log: teelog::Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root: AppConfig = toml::from_str(CONFIG)?;
    root.log.validate()?;
    let logger = Logger::new(root.log);

    logger.trace("This is a trace message (not visible)", &[]);
    logger.debug("This is a debug message (visible because level is debug)", &[]);
    logger.info(
        "User session ended",
        &[
            Attr::new("user", "bob"),
            Attr::new("action", "logout"),
            Attr::new("duration_ms", 1234),
        ],
    );
    logger.error(
        "Database error occurred",
        &[Attr::new("error_code", 500), Attr::new("error_type", "database")],
    );

    logger.close()?;
    Ok(())
}
