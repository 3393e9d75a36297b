//! Error types for watchfs.
//!
//! Startup failures are fatal and carry the process exit code they map to.
//! Failures while mirroring individual events are reported through `anyhow`
//! inside the engine and never reach this type.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the startup path.
pub type Result<T> = std::result::Result<T, WatchFsError>;

/// Fatal errors surfaced before or while starting the watchers.
#[derive(Error, Debug)]
pub enum WatchFsError {
    /// Malformed mapping syntax or a mapping that would mirror into itself.
    #[error("{message}")]
    Parse { message: String },

    /// The notification source could not be started for a mapping root.
    #[error("Failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// I/O failure while resolving paths or building filters.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl WatchFsError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse { .. } => 1,
            Self::Watch { .. } | Self::Io { .. } => 2,
        }
    }
}
