//! Error types for mylog-core.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MylogError {
    #[error("unknown logger kind: {0:?} (expected \"console\" or \"file\")")]
    InvalidKind(String),

    #[error("unknown log level: {0:?}")]
    InvalidLevel(String),

    #[error("invalid logger config: {0}")]
    InvalidConfig(String),

    #[error("failed to open log file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {} -> {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to start background writer: {0}")]
    Runtime(String),

    #[error("file logger is closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, MylogError>;
