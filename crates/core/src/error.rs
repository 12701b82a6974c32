// Central Error Type for the Request Queue Lifecycle

use crate::domain::{DomainError, OsStatus};
use thiserror::Error;

/// Coarse classification of a [`QueueError`]
///
/// Higher layers match on this to pick an actionable message instead of
/// surfacing a raw status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The OS rejected the queue name as malformed
    InvalidName,
    /// An attach-mode construction targeted a queue that does not exist
    QueueNotFound,
    /// Any other non-success status from the HTTP Server API
    OsOperationFailed,
    /// Caller misuse (e.g. operating on a disposed queue)
    ProgrammingError,
    /// Malformed caller input rejected before reaching the OS
    InvalidInput,
    /// The HTTP Server API is not available on this platform
    Unsupported,
}

/// Request queue error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("The given request queue name '{name}' is invalid ({status})")]
    InvalidName { name: String, status: OsStatus },

    #[error(
        "Failed to attach to the given request queue '{name}', the queue could not be found ({status})"
    )]
    QueueNotFound { name: String, status: OsStatus },

    #[error("HTTP Server API call failed: {0}")]
    OsOperationFailed(OsStatus),

    #[error("{0} has been disposed")]
    Disposed(&'static str),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Unsupported platform: {0}")]
    Unsupported(String),
}

impl QueueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::InvalidName { .. } => ErrorKind::InvalidName,
            QueueError::QueueNotFound { .. } => ErrorKind::QueueNotFound,
            QueueError::OsOperationFailed(_) => ErrorKind::OsOperationFailed,
            QueueError::Disposed(_) => ErrorKind::ProgrammingError,
            QueueError::Domain(_) => ErrorKind::InvalidInput,
            QueueError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Raw OS status carried by this error, if any
    pub fn os_status(&self) -> Option<OsStatus> {
        match self {
            QueueError::InvalidName { status, .. }
            | QueueError::QueueNotFound { status, .. }
            | QueueError::OsOperationFailed(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<OsStatus> for QueueError {
    fn from(status: OsStatus) -> Self {
        QueueError::OsOperationFailed(status)
    }
}

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;
