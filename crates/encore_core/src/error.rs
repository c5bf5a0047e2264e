//! Encore error types

use thiserror::Error;

/// Which kind of session currently owns the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKind {
    Recording,
    Playback,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Recording => write!(f, "recording"),
            SessionKind::Playback => write!(f, "playback"),
        }
    }
}

/// Errors raised while recording, replaying, or reading controller logs
#[derive(Error, Debug, Clone)]
pub enum EncoreError {
    /// No storage medium is present
    #[error("Storage unavailable: no medium present")]
    StorageUnavailable,

    /// No live input device is connected
    #[error("Input device unavailable: no controller connected")]
    DeviceUnavailable,

    /// The log file could not be created for writing
    #[error("Failed to open log for writing: {0}")]
    SinkOpenFailed(String),

    /// The log file could not be opened for reading
    #[error("Failed to open log for reading: {0}")]
    SourceOpenFailed(String),

    /// A write to the log failed mid-session
    #[error("Failed to write log: {0}")]
    SinkWriteFailed(String),

    /// Not enough bytes to decode a header
    #[error("Truncated input: expected {expected} bytes, got {actual}")]
    TruncatedInput { expected: usize, actual: usize },

    /// The log holds a header but no frames
    #[error("Log has no frames to replay: {0}")]
    EmptyLog(String),

    /// Another session is still running
    #[error("A {0} session is already active")]
    SessionActive(SessionKind),

    /// The session thread could not be started
    #[error("Failed to start {0} thread: {1}")]
    Spawn(SessionKind, String),

    /// The session thread panicked before reporting a result
    #[error("The {0} thread panicked")]
    Panicked(SessionKind),
}

/// Result type for Encore operations
pub type Result<T> = std::result::Result<T, EncoreError>;
