//! Unified application error type.
//! The engine modules return AppError so the shell can report local failures
//! without tearing the command loop down.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line didn't match the log pattern, or a non-blank timestamp field
    /// failed to decode. Fatal to the load that hit it.
    #[error("could not parse log line {line:?}")]
    LogParse { line: String },

    #[error("Cannot edit a non-existent pom!")]
    NoCurrentSession,

    #[error("{0:?} is not a valid status")]
    InvalidStatus(String),

    #[error("Gotta set a title")]
    EmptyTitle,
}

pub type AppResult<T> = Result<T, AppError>;
