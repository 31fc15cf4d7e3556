//! GlassLink Error Types
//!
//! Centralized error handling for the companion client.

use thiserror::Error;

/// Central error type for GlassLink
#[derive(Error, Debug)]
pub enum GlassError {
    #[error("camera transport error: {0}")]
    Transport(String),

    #[error("camera returned HTTP {0}")]
    HttpStatus(u16),

    #[error("no camera frame available yet")]
    NoFrameAvailable,

    #[error("frame decode error: {0}")]
    Decode(String),

    #[error("audio error: {0}")]
    Audio(String),

    #[error("transcription error: {0}")]
    Speech(String),

    #[error("TTS engine error: {0}")]
    Tts(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for GlassLink operations
pub type GlassResult<T> = Result<T, GlassError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for GlassError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        GlassError::Lock(err.to_string())
    }
}
