// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid URL prefix '{prefix}': {reason}")]
    InvalidUrlPrefix { prefix: String, reason: &'static str },

    #[error("Unknown request queue mode: {0}")]
    UnknownMode(String),

    #[error("Unknown 503 verbosity level: {0}")]
    UnknownVerbosity(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
