//! Logger configuration: fixed at construction, never changed afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MylogError, Result};
use crate::level::Level;

/// Where records go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    Console,
    File {
        /// Directory holding the active file, its `.err` twin and backups.
        dir: PathBuf,
        /// File name of the main log (e.g. "app.log").
        name: String,
        /// Rotate once a file reaches this many bytes.
        max_size: u64,
    },
}

/// Configuration for a single logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Records below this level are discarded.
    pub level: Level,
    #[serde(flatten)]
    pub sink: SinkConfig,
    /// Capacity of the file sink's queue; records beyond it are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How long `close()` waits for queued records to reach disk.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Start the file sink's writer paused (see `FileLogger::pause`).
    #[serde(default)]
    pub start_paused: bool,
}

fn default_queue_capacity() -> usize {
    50_000
}

fn default_drain_timeout_ms() -> u64 {
    5_000
}

impl LoggerConfig {
    pub fn console(level: Level) -> Self {
        Self {
            level,
            sink: SinkConfig::Console,
            queue_capacity: default_queue_capacity(),
            drain_timeout_ms: default_drain_timeout_ms(),
            start_paused: false,
        }
    }

    pub fn file(level: Level, dir: impl Into<PathBuf>, name: impl Into<String>, max_size: u64) -> Self {
        Self {
            sink: SinkConfig::File {
                dir: dir.into(),
                name: name.into(),
                max_size,
            },
            ..Self::console(level)
        }
    }

    /// Builds a config from untyped construction parameters, as passed on a
    /// command line. `dir` and `name` are only read for file loggers.
    pub fn from_args(
        kind: &str,
        level: &str,
        max_size: u64,
        dir: Option<&Path>,
        name: Option<&str>,
    ) -> Result<Self> {
        let level = Level::parse(level)?;
        match kind.to_ascii_lowercase().as_str() {
            "console" | "c" => Ok(Self::console(level)),
            "file" | "f" => {
                let dir = dir.ok_or_else(|| {
                    MylogError::InvalidConfig("file logger needs a directory".to_string())
                })?;
                let name = name.ok_or_else(|| {
                    MylogError::InvalidConfig("file logger needs a file name".to_string())
                })?;
                Ok(Self::file(level, dir, name, max_size))
            }
            _ => Err(MylogError::InvalidKind(kind.to_string())),
        }
    }

    /// Reads a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.start_paused = paused;
        self
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Rejects configs no logger can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.level == Level::Unknown {
            return Err(MylogError::InvalidLevel(self.level.to_string()));
        }
        if let SinkConfig::File { name, max_size, .. } = &self.sink {
            if name.is_empty() {
                return Err(MylogError::InvalidConfig("empty log file name".to_string()));
            }
            if *max_size == 0 {
                return Err(MylogError::InvalidConfig("max_size must be positive".to_string()));
            }
            if self.queue_capacity == 0 {
                return Err(MylogError::InvalidConfig(
                    "queue_capacity must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}
