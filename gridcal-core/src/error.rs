//! Error types for the gridcal engine.

use thiserror::Error;

/// Errors that can occur during a reconciliation run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("missing required columns: {0}")]
    MissingColumns(String),

    #[error("sheet must have a header row and at least one data row")]
    EmptySheet,

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("calendar store error: {0}")]
    Store(String),

    #[error("sheet store error: {0}")]
    Sheet(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for gridcal operations.
pub type SyncResult<T> = Result<T, SyncError>;
