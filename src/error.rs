//! Error types shared by the county engine and its collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Cloneable so one failed load can be reported to every caller waiting on it
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to read reference file {}: {source}", .path.display())]
    ReferenceIo {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("{0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    UpstreamFailure,
    Internal,
}

impl Error {
    pub fn reference_io(path: &Path, source: std::io::Error) -> Self {
        Error::ReferenceIo {
            path: path.to_path_buf(),
            source: Arc::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::ReferenceIo { .. } | Error::Upstream(_) => ErrorKind::UpstreamFailure,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}
