//! mylog-core: leveled logging to the terminal or to size-rotated files.
//!
//! The file logger is built so logging never waits on the disk: a log call
//! is a `try_send` onto a bounded queue, and a single background task owns
//! the files, writes every line, and rotates them when they grow too big.

pub mod config;
pub mod console;
pub mod error;
pub mod file;
pub mod level;
pub mod logger;
pub mod record;
pub mod rotation;

pub use config::{LoggerConfig, SinkConfig};
pub use console::ConsoleLogger;
pub use error::MylogError;
pub use file::FileLogger;
pub use level::{enabled, Level};
pub use logger::{Log, Logger};
pub use record::{parse_line, Caller, LogRecord, ParsedLine};
