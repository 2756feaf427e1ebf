//! The logging interface shared by every sink, and the [`Logger`] that picks
//! a sink once at construction.

use std::fmt;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use crate::config::{LoggerConfig, SinkConfig};
use crate::console::ConsoleLogger;
use crate::error::Result;
use crate::file::FileLogger;
use crate::level::{self, Level};
use crate::record::{Caller, LogRecord};

/// Capability set every logger offers: a threshold, a way to hand off a
/// record, and the five leveled calls built on top of them.
///
/// The leveled methods are `#[track_caller]`, so they report the calling
/// file and line but no function name. The [`info!`](crate::info) family of
/// macros also captures the function.
pub trait Log {
    fn threshold(&self) -> Level;

    /// Hands a record that already passed the threshold to the sink.
    fn write_record(&self, record: LogRecord);

    fn enabled(&self, level: Level) -> bool {
        level::enabled(self.threshold(), level)
    }

    /// The message is only formatted when `level` is enabled.
    fn log(&self, level: Level, caller: Caller, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            self.write_record(LogRecord::new(level, caller, args.to_string()));
        }
    }

    #[track_caller]
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, Caller::from_location(Location::caller()), args);
    }

    #[track_caller]
    fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, Caller::from_location(Location::caller()), args);
    }

    #[track_caller]
    fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, Caller::from_location(Location::caller()), args);
    }

    #[track_caller]
    fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, Caller::from_location(Location::caller()), args);
    }

    #[track_caller]
    fn fatal(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Fatal, Caller::from_location(Location::caller()), args);
    }
}

impl<T: Log + ?Sized> Log for &T {
    fn threshold(&self) -> Level {
        (**self).threshold()
    }

    fn write_record(&self, record: LogRecord) {
        (**self).write_record(record)
    }
}

impl<T: Log + ?Sized> Log for Arc<T> {
    fn threshold(&self) -> Level {
        (**self).threshold()
    }

    fn write_record(&self, record: LogRecord) {
        (**self).write_record(record)
    }
}

/// A console or file logger, chosen from a [`LoggerConfig`].
pub enum Logger {
    Console(ConsoleLogger),
    File(FileLogger),
}

impl Logger {
    /// Fails on an invalid config or if the log files cannot be opened;
    /// never hands back a half-working logger.
    pub fn new(config: &LoggerConfig) -> Result<Self> {
        config.validate()?;
        match config.sink {
            SinkConfig::Console => Ok(Logger::Console(ConsoleLogger::new(config.level))),
            SinkConfig::File { .. } => Ok(Logger::File(FileLogger::new(config)?)),
        }
    }

    /// Shorthand for [`LoggerConfig::from_args`] followed by [`Logger::new`].
    pub fn from_args(
        kind: &str,
        level: &str,
        max_size: u64,
        dir: Option<&Path>,
        name: Option<&str>,
    ) -> Result<Self> {
        Self::new(&LoggerConfig::from_args(kind, level, max_size, dir, name)?)
    }

    /// Waits for queued records to be written. A no-op for the console.
    pub fn flush(&self) -> Result<()> {
        match self {
            Logger::Console(_) => Ok(()),
            Logger::File(file) => file.flush(),
        }
    }

    pub fn close(self) {
        if let Logger::File(file) = self {
            file.close();
        }
    }
}

impl Log for Logger {
    fn threshold(&self) -> Level {
        match self {
            Logger::Console(console) => console.threshold(),
            Logger::File(file) => file.threshold(),
        }
    }

    fn write_record(&self, record: LogRecord) {
        match self {
            Logger::Console(console) => console.write_record(record),
            Logger::File(file) => file.write_record(record),
        }
    }
}

/// Logs at an explicit level, capturing file, function and line.
///
/// ```ignore
/// mylog::log!(logger, Level::Warn, "retrying in {}s", delay);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        ($logger).log($level, $crate::caller!(), format_args!($($arg)+))
    }};
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Collects records in memory.
    struct Capture {
        level: Level,
        records: Mutex<Vec<LogRecord>>,
    }

    impl Capture {
        fn new(level: Level) -> Self {
            Self {
                level,
                records: Mutex::new(vec![]),
            }
        }

        fn take(&self) -> Vec<LogRecord> {
            std::mem::take(&mut *self.records.lock().unwrap())
        }
    }

    impl Log for Capture {
        fn threshold(&self) -> Level {
            self.level
        }

        fn write_record(&self, record: LogRecord) {
            self.records.lock().unwrap().push(record);
        }
    }

    #[test]
    fn leveled_methods_respect_threshold() {
        let capture = Capture::new(Level::Warn);
        capture.debug(format_args!("d"));
        capture.info(format_args!("i"));
        capture.warn(format_args!("w"));
        capture.error(format_args!("e"));
        capture.fatal(format_args!("f"));

        let levels: Vec<Level> = capture.take().iter().map(|r| r.level()).collect();
        assert_eq!(levels, vec![Level::Warn, Level::Error, Level::Fatal]);
    }

    #[test]
    fn track_caller_reports_call_site() {
        let capture = Capture::new(Level::Debug);
        let line = line!() + 1;
        capture.info(format_args!("here"));

        let records = capture.take();
        assert_eq!(records[0].caller().file, "logger.rs");
        assert_eq!(records[0].caller().line, line);
        assert_eq!(records[0].caller().function, "");
    }

    #[test]
    fn macros_capture_function_and_format_message() {
        let capture = Capture::new(Level::Debug);
        crate::error!(capture, "failed after {} tries", 3);
        crate::log!(&capture, Level::Info, "plain");

        let records = capture.take();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level(), Level::Error);
        assert_eq!(records[0].message(), "failed after 3 tries");
        assert_eq!(
            records[0].caller().function,
            "macros_capture_function_and_format_message"
        );
        assert_eq!(records[1].level(), Level::Info);
    }

    #[test]
    fn macros_work_through_arc() {
        let capture = Arc::new(Capture::new(Level::Info));
        crate::debug!(capture, "dropped");
        crate::fatal!(capture, "kept");
        assert_eq!(capture.take().len(), 1);
    }

    #[test]
    fn construction_dispatches_on_kind() {
        let logger = Logger::from_args("console", "debug", 0, None, None).unwrap();
        assert!(matches!(logger, Logger::Console(_)));
        assert_eq!(logger.threshold(), Level::Debug);
        logger.flush().unwrap();
        logger.close();
    }

    #[test]
    fn construction_fails_fast() {
        assert!(Logger::from_args("network", "info", 0, None, None).is_err());
        assert!(Logger::from_args("console", "chatty", 0, None, None).is_err());
        let config = LoggerConfig::file(Level::Info, "/tmp", "a.log", 0);
        assert!(Logger::new(&config).is_err());
    }
}
