//! Logger assembly and the logging facade.
//!
//! A [`Logger`] owns a `tracing` dispatcher bound to its destination and the
//! handle of the rotating log file. Events are dispatched with
//! [`tracing::dispatcher::with_default`] for the duration of each call, so
//! several loggers with different destinations can coexist without touching
//! the global default subscriber.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::attr::Record;
use crate::{Attr, Config, FanOut, Level, OutputMode, Result, RotatingFile};

/// A leveled structured logger writing to the console, a rotating file, or both.
///
/// Cloning a logger, or deriving one with [`Logger::with`], shares the same
/// destination and file handle.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
    level: Level,
    file: Option<RotatingFile>,
    context: Arc<[Attr]>,
}

impl Logger {
    /// Assemble a logger writing console output to standard output.
    pub fn new(config: Config) -> Self {
        Self::with_console(config, io::stdout())
    }

    /// Assemble a logger with `console` standing in for standard output.
    ///
    /// The rotating file is always constructed so that [`Logger::close`] has a
    /// handle to release; it touches the disk only once something is written
    /// to it, so console-only loggers never create a file.
    pub fn with_console<C>(config: Config, console: C) -> Self
    where
        C: Write + Send + 'static,
    {
        let file = RotatingFile::new(config.file, config.rotation);

        let writer = match config.output {
            OutputMode::Console => BoxMakeWriter::new(Mutex::new(console)),
            OutputMode::File => BoxMakeWriter::new(file.clone()),
            OutputMode::Both => {
                let sinks: Vec<Box<dyn Write + Send>> =
                    vec![Box::new(console), Box::new(file.clone())];
                BoxMakeWriter::new(Arc::new(FanOut::new(sinks)))
            }
        };
        let ansi = cfg!(feature = "ansi") && config.output == OutputMode::Console;

        Self {
            dispatch: frontend(writer, config.level, config.timestamps, ansi),
            level: config.level,
            file: Some(file),
            context: Arc::from([]),
        }
    }

    /// Bind an arbitrary writer. The logger has no file to close or rotate.
    pub fn from_make_writer<W>(writer: W, level: Level) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            dispatch: frontend(writer, level, true, false),
            level,
            file: None,
            context: Arc::from([]),
        }
    }

    /// The severity threshold.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Attributes attached with [`Logger::with`].
    pub fn context(&self) -> &[Attr] {
        &self.context
    }

    /// The rotating file, if this logger has one.
    pub fn file(&self) -> Option<&RotatingFile> {
        self.file.as_ref()
    }

    /// Derive a logger that adds `attrs` to every record.
    ///
    /// The derived logger keeps this logger's context and shares its
    /// destination and file handle.
    pub fn with<I>(&self, attrs: I) -> Logger
    where
        I: IntoIterator<Item = Attr>,
    {
        let context: Vec<Attr> = self.context.iter().cloned().chain(attrs).collect();
        Logger {
            dispatch: self.dispatch.clone(),
            level: self.level,
            file: self.file.clone(),
            context: context.into(),
        }
    }

    /// Log `message` at `level`. Records below the threshold are dropped
    /// before formatting.
    pub fn log(&self, level: Level, message: &str, attrs: &[Attr]) {
        let record = Record {
            message,
            context: &self.context,
            attrs,
        };
        tracing::dispatcher::with_default(&self.dispatch, || match level {
            Level::Trace => tracing::trace!("{}", record),
            Level::Debug => tracing::debug!("{}", record),
            Level::Info => tracing::info!("{}", record),
            Level::Warn => tracing::warn!("{}", record),
            Level::Error => tracing::error!("{}", record),
        });
    }

    pub fn trace(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Trace, message, attrs);
    }

    pub fn debug(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Debug, message, attrs);
    }

    pub fn info(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Info, message, attrs);
    }

    pub fn warn(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Warn, message, attrs);
    }

    pub fn error(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Error, message, attrs);
    }

    /// Run `f` with this logger as the default `tracing` subscriber, so plain
    /// `tracing` macros inside it reach the same destination.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Flush and release the log file.
    ///
    /// The file is shared by every clone and derived logger, so closing any of
    /// them closes it for all. Closing again succeeds. Records written to the
    /// file afterwards are discarded; console output is unaffected.
    pub fn close(&self) -> Result<()> {
        if let Some(file) = &self.file {
            file.close()?;
        }
        Ok(())
    }

    /// Rotate the log file now instead of waiting for the size limit.
    pub fn rotate(&self) -> Result<()> {
        if let Some(file) = &self.file {
            file.rotate()?;
        }
        Ok(())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Build the `tracing` frontend bound to `writer`.
fn frontend<W>(writer: W, level: Level, timestamps: bool, ansi: bool) -> Dispatch
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(LevelFilter::from(level))
        .with_target(false)
        .with_ansi(ansi);

    if !timestamps {
        return Dispatch::new(builder.without_time().finish());
    }

    #[cfg(feature = "time")]
    let builder = builder.with_timer(local_timer());

    Dispatch::new(builder.finish())
}

/// RFC 3339 timestamps in the local offset, or UTC when it cannot be determined.
#[cfg(feature = "time")]
fn local_timer()
-> tracing_subscriber::fmt::time::OffsetTime<time::format_description::well_known::Rfc3339> {
    let offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    tracing_subscriber::fmt::time::OffsetTime::new(
        offset,
        time::format_description::well_known::Rfc3339,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn config_in(dir: &Path) -> Config {
        Config::new()
            .with_file(dir.join("app.log"))
            .with_timestamps(false)
    }

    #[test]
    fn test_default_logger_writes_to_console_only() {
        let dir = tempfile::tempdir().unwrap();
        let console = Capture::default();
        let logger = Logger::with_console(config_in(dir.path()), console.clone());

        logger.info("start", &[]);
        logger.close().unwrap();

        assert!(console.text().contains("start"));
        assert!(!dir.path().join("app.log").exists());
    }

    #[test]
    fn test_threshold_drops_lower_levels() {
        let dir = tempfile::tempdir().unwrap();
        let console = Capture::default();
        let logger = Logger::with_console(
            config_in(dir.path()).with_level(Level::Warn),
            console.clone(),
        );

        logger.trace("trace-msg", &[]);
        logger.debug("debug-msg", &[]);
        logger.info("info-msg", &[]);
        logger.warn("warn-msg", &[]);
        logger.error("error-msg", &[]);

        let text = console.text();
        assert!(!text.contains("trace-msg"));
        assert!(!text.contains("debug-msg"));
        assert!(!text.contains("info-msg"));
        assert!(text.contains("WARN"));
        assert!(text.contains("warn-msg"));
        assert!(text.contains("error-msg"));
        assert_eq!(logger.level(), Level::Warn);
    }

    #[test]
    fn test_file_only_respects_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let console = Capture::default();
        let logger = Logger::with_console(
            config_in(dir.path())
                .with_output(OutputMode::File)
                .with_level(Level::Warn),
            console.clone(),
        );

        logger.debug("quiet debug", &[]);
        logger.error("loud error", &[Attr::new("error", "file only error")]);
        logger.close().unwrap();

        let content = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(content.contains("loud error"));
        assert!(content.contains(r#"error="file only error""#));
        assert!(!content.contains("quiet debug"));
        assert!(console.text().is_empty());
    }

    #[test]
    fn test_both_writes_same_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let console = Capture::default();
        let logger = Logger::with_console(
            config_in(dir.path()).with_output(OutputMode::Both),
            console.clone(),
        );

        for i in 0..10 {
            logger.info("both", &[Attr::new("index", i)]);
        }
        logger.close().unwrap();

        let content = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(content, console.text());
        let indexes: Vec<String> = content
            .lines()
            .map(|line| line.rsplit('=').next().unwrap().to_string())
            .collect();
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(indexes, expected);
    }

    #[test]
    fn test_fan_out_over_two_buffers_is_byte_identical() {
        let a = Capture::default();
        let b = Capture::default();
        let fan = Arc::new(FanOut::new(vec![Box::new(a.clone()), Box::new(b.clone())]));
        let logger = Logger::from_make_writer(fan, Level::Info);

        logger.info("one record", &[Attr::new("k", "v")]);

        assert!(a.text().contains("one record k=v"));
        assert_eq!(a.text(), b.text());
        assert!(logger.file().is_none());
        logger.close().unwrap();
        logger.rotate().unwrap();
    }

    #[test]
    fn test_context_attachment_is_associative() {
        let dir = tempfile::tempdir().unwrap();
        let console = Capture::default();
        let logger = Logger::with_console(config_in(dir.path()), console.clone());

        logger
            .with([Attr::new("a", 1)])
            .with([Attr::new("b", 2)])
            .info("ctx", &[]);
        logger
            .with([Attr::new("a", 1), Attr::new("b", 2)])
            .info("ctx", &[]);

        let text = console.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
        assert!(lines[0].ends_with("ctx a=1 b=2"));
    }

    #[test]
    fn test_derived_logger_shares_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_console(
            config_in(dir.path())
                .with_output(OutputMode::File)
                .with_level(Level::Debug),
            io::sink(),
        );
        let item = logger.with([
            Attr::new("item-name", "大宝剑"),
            Attr::new("item-count", "1"),
        ]);
        assert_eq!(item.context().len(), 2);
        assert!(logger.context().is_empty());

        item.debug("derived", &[]);
        logger.info("parent", &[]);

        // Closing the derived logger closes the shared file for the parent too.
        item.close().unwrap();
        assert!(logger.file().unwrap().is_closed());
        logger.info("after close", &[]);

        let content = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(content.contains("derived item-name=大宝剑 item-count=1"));
        assert!(content.contains("parent"));
        assert!(!content.contains("after close"));
    }

    #[test]
    fn test_close_twice_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_console(
            config_in(dir.path()).with_output(OutputMode::File),
            io::sink(),
        );
        logger.info("before closing", &[]);
        assert!(logger.close().is_ok());
        assert!(logger.close().is_ok());
    }

    #[test]
    fn test_console_survives_file_close_in_both_mode() {
        let dir = tempfile::tempdir().unwrap();
        let console = Capture::default();
        let logger = Logger::with_console(
            config_in(dir.path()).with_output(OutputMode::Both),
            console.clone(),
        );

        logger.info("first", &[]);
        logger.close().unwrap();
        logger.info("second", &[]);

        let content = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(content.contains("first"));
        assert!(!content.contains("second"));
        assert!(console.text().contains("second"));
    }

    #[test]
    fn test_in_scope_routes_tracing_macros() {
        let dir = tempfile::tempdir().unwrap();
        let console = Capture::default();
        let logger = Logger::with_console(config_in(dir.path()), console.clone());

        let answer = logger.in_scope(|| {
            tracing::info!(user = "alice", "scoped");
            tracing::debug!("hidden");
            42
        });

        assert_eq!(answer, 42);
        let text = console.text();
        assert!(text.contains("scoped"));
        assert!(text.contains("alice"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_rotate_through_logger() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_console(
            config_in(dir.path())
                .with_output(OutputMode::File)
                .with_rotation(1, 2, 0, false),
            io::sink(),
        );

        logger.info("old generation", &[]);
        logger.rotate().unwrap();
        logger.info("new generation", &[]);
        logger.close().unwrap();

        let current = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        let backup = std::fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert!(current.contains("new generation"));
        assert!(backup.contains("old generation"));
    }

    #[test]
    fn test_concurrent_logging_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_console(
            config_in(dir.path()).with_output(OutputMode::File),
            io::sink(),
        );

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let logger = logger.with([Attr::new("thread", t)]);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        logger.info("concurrent", &[Attr::new("i", i)]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        logger.close().unwrap();

        let content = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(content.lines().count(), 100);
        assert!(content.lines().all(|line| line.contains("concurrent thread=")));
    }
}
