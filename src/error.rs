//! Error types for http-recorder

use std::io;
use thiserror::Error;

use crate::config::Mode;

/// Result type for recorder operations
pub type Result<T> = std::result::Result<T, RecorderError>;

/// Errors that can occur while recording or replaying
#[derive(Debug, Error)]
pub enum RecorderError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Invalid recording file contents
    #[error("Invalid recording format: {0}")]
    InvalidFormat(String),

    /// Recording file not found
    #[error("Recording file not found: {0}")]
    FileNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid test or session name
    #[error("Invalid test name: {0}")]
    InvalidTestName(String),

    /// No record was ever captured for this match-key
    #[error("No matching record for key '{0}'")]
    KeyNotFound(String),

    /// Every record captured for this match-key has already been served
    #[error("No more recorded entries for key '{0}'")]
    QueueExhausted(String),

    /// Every asset name captured for this test has already been served
    #[error("No more recorded asset names for test '{0}'")]
    NamesExhausted(String),

    /// Operation not allowed in the session's mode
    #[error("{operation} is not supported in {mode} mode")]
    ModeMismatch {
        /// Operation that was attempted
        operation: &'static str,
        /// Mode the session was opened in
        mode: Mode,
    },

    /// Session used after `close`
    #[error("Session already closed")]
    SessionClosed,

    /// Failure in the underlying transport
    #[error("Transport error: {0}")]
    Transport(String),
}

impl RecorderError {
    /// Whether this error means the live request sequence diverged from the recording
    #[must_use]
    pub fn is_playback_mismatch(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFound(_) | Self::QueueExhausted(_) | Self::NamesExhausted(_)
        )
    }
}
