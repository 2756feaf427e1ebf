//! Synchronous logger that prints each record to standard output.

use std::io::{self, Write};

use tracing::error;

use crate::level::Level;
use crate::logger::Log;
use crate::record::LogRecord;

#[derive(Debug, Clone, Copy)]
pub struct ConsoleLogger {
    level: Level,
}

impl ConsoleLogger {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

/// One rendered record plus its newline.
fn write_line<W: Write>(out: &mut W, record: &LogRecord) -> io::Result<()> {
    writeln!(out, "{}", record.render())
}

impl Log for ConsoleLogger {
    fn threshold(&self) -> Level {
        self.level
    }

    fn write_record(&self, record: LogRecord) {
        if let Err(e) = write_line(&mut io::stdout().lock(), &record) {
            error!("Dropped console log record: {}", e);
        }
    }
}
