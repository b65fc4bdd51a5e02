use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,    // informational, nothing failed
    Warning, // recoverable, list still usable
    Error,   // operation failed
}

/// Failures reading or writing the saved-searches document.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize saved searches: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures counting messages for a query.
#[derive(Error, Debug)]
pub enum BackendQueryError {
    #[error("Failed to start count backend '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Count query '{query}' failed: {stderr}")]
    Failed { query: String, stderr: String },

    #[error("Count backend returned unexpected output for '{query}': {output:?}")]
    InvalidOutput { query: String, output: String },

    #[error("Count query '{query}' timed out after {timeout:?}")]
    Timeout { query: String, timeout: Duration },

    #[error("Count worker pool is shut down")]
    WorkerGone,
}

/// Errors surfaced by the saved-searches list.
#[derive(Error, Debug)]
pub enum SearchListError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Backend(#[from] BackendQueryError),

    #[error("Row {position} is not an activatable query")]
    InvalidSelection { position: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SearchListError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Persistence(_) => ErrorSeverity::Warning,
            Self::Backend(_) => ErrorSeverity::Warning,
            Self::InvalidSelection { .. } => ErrorSeverity::Info,
            Self::Config(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Persistence(e) => format!("Could not read saved searches: {}", e),
            Self::Backend(e) => format!("Could not count messages: {}", e),
            Self::InvalidSelection { .. } => "Nothing to open here".to_string(),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchListError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use saved_searches::error::ResultExt;
///
/// let doc = file.load().warn_on_err().unwrap_or_default();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = %error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = %error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
