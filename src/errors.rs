use std::{io, path::PathBuf, string};
use thiserror::Error;

/// An error from mocha-mono.
#[derive(Debug, Error)]
pub enum MochaError {
    /// Reading or writing a file failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file could not be used.
    #[error("{0}")]
    Config(String),

    /// A glob from the configuration is malformed.
    #[error("invalid glob `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A directory could not be read while scanning for test files.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),

    /// The runner produced something that is not a report.
    #[error("malformed report: {0}")]
    Report(#[from] serde_json::Error),

    /// The external runner failed before producing a report.
    #[error("runner failed: {0}")]
    Runner(String),

    /// A background task panicked or was cancelled.
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The requested node is not in the tree.
    #[error("no test matches `{0}`")]
    UnknownTarget(String),

    #[error(transparent)]
    Utf8(#[from] string::FromUtf8Error),
}

impl MochaError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MochaError::Io {
            path: path.into(),
            source,
        }
    }
}

// Helper method to collapse nested Results
pub trait RichResult<T, E> {
    fn collapse(self) -> Result<T, E>;
}

impl<T, E> RichResult<T, E> for Result<Result<T, E>, E> {
    fn collapse(self) -> Result<T, E> {
        match self {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(e),
        }
    }
}
