//! Error types for the Jarvis voice front end

use thiserror::Error;

/// Result type alias for Jarvis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Jarvis voice front end
///
/// None of these are fatal to a running conversation: transport and capture
/// faults are recovered by the connection manager and the capture supervisor.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech capture error
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Assistant transport error
    #[error("transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed API response
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid endpoint URL
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
