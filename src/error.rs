//! Error types for the echolingo gateway

use thiserror::Error;

/// Result type alias for echolingo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the echolingo gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Client-supplied data is missing or malformed (4xx, no retry)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A required provider credential is absent (operator-fixable, no retry)
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// Speech-recognition provider transport or parse failure
    #[error("transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    /// Translation provider transport failure
    #[error("translation unavailable: {0}")]
    TranslationUnavailable(String),

    /// Speech-synthesis provider transport failure
    #[error("synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    /// Audio processing error
    #[error("audio error: {0}")]
    Audio(String),

    /// No capture/playback device present on this host
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The platform denied access to the capture device
    #[error("audio device access denied: {0}")]
    PermissionDenied(String),
}
