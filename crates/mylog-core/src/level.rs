//! Severity levels and the threshold check every logger applies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MylogError;

/// Ordered log severity. `Unknown` sorts below everything and is never
/// produced by parsing; it only exists as a construction-time placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    Unknown = 0,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// The five levels a record can carry, lowest first.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Case-insensitive parse; anything but the five level names is rejected.
    pub fn parse(name: &str) -> Result<Level, MylogError> {
        match name.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(MylogError::InvalidLevel(name.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Unknown => "UNKNOWN",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Records at this level are duplicated into the `.err` file.
    pub fn is_error(self) -> bool {
        self >= Level::Error
    }
}

/// True iff a record at `candidate` passes a logger configured at `threshold`.
pub fn enabled(threshold: Level, candidate: Level) -> bool {
    candidate.rank() >= threshold.rank()
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = MylogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::parse(s)
    }
}

impl TryFrom<String> for Level {
    type Error = MylogError;

    fn try_from(s: String) -> Result<Self, MylogError> {
        Level::parse(&s)
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}
