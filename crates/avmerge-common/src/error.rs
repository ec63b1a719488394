//! Error taxonomy shared by discovery, matching, and merging.
//!
//! Only [`Error::ToolNotConfigured`] and [`Error::Discovery`] stop a whole run.
//! The remaining variants describe why a single merge job failed and are
//! recorded on that job while the batch carries on.

use std::path::PathBuf;

/// Common error type for avmerge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external merge tool is missing, not a file, or not executable.
    #[error("merge tool not usable at {}: {reason}", path.display())]
    ToolNotConfigured { path: PathBuf, reason: String },

    /// The source directory could not be read.
    #[error("cannot scan {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The duration of an input could not be determined.
    #[error("duration probe failed for {}: {message}", path.display())]
    DurationProbe { path: PathBuf, message: String },

    /// The merge tool exited unsuccessfully.
    #[error("merge tool exited with {}: {diagnostics}", describe_exit(.code))]
    Subprocess {
        code: Option<i32>,
        diagnostics: String,
    },

    /// The merge tool produced no output for too long and was stopped.
    #[error("merge tool stalled: no output for {seconds}s")]
    Stalled { seconds: u64 },

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create a new ToolNotConfigured error.
    pub fn tool_not_configured(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ToolNotConfigured {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Discovery error.
    pub fn discovery(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Discovery {
            path: path.into(),
            source,
        }
    }

    /// Create a new DurationProbe error.
    pub fn duration_probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::DurationProbe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new Subprocess error.
    pub fn subprocess(code: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self::Subprocess {
            code,
            diagnostics: diagnostics.into(),
        }
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error aborts a whole run rather than a single job.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ToolNotConfigured { .. } | Self::Discovery { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
