use teelog::{Attr, Config, Logger, OutputMode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let log_path = temp_dir.path().join("rotation.log");

    // 1MB files, keep 3 compressed backups for at most 7 days
    let logger = Logger::new(
        Config::new()
            .with_output(OutputMode::File)
            .with_file(&log_path)
            .with_rotation(1, 3, 7, true),
    );

    let padding = "x".repeat(256);
    for i in 0..10_000 {
        logger.info(
            "This is a log message to test rotation",
            &[Attr::new("index", i), Attr::new("padding", padding.clone())],
        );
    }
    logger.close()?;

    for entry in std::fs::read_dir(temp_dir.path())? {
        let entry = entry?;
        println!("{} ({} bytes)", entry.path().display(), entry.metadata()?.len());
    }

    Ok(())
}
