//! Speech synthesis error types

use thiserror::Error;

use super::store_error::StoreError;

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;

#[derive(Error, Debug)]
pub enum SynthesisError {
    // ─────────────────────────────────────────────────────────────────────────────
    // Caller-visible, non-retryable
    // ─────────────────────────────────────────────────────────────────────────────

    /// The speech service has no voice at all for this language
    #[error("Language code {0} not supported by the speech service")]
    UnsupportedLanguage(String),

    /// The language is listed but no default voice could be resolved
    #[error("No voices available for language: {0}")]
    NoVoiceAvailable(String),

    /// Text exceeds even the asynchronous synthesis limit
    #[error("Text length {length} is too long for a synthesis task (limit {max})")]
    TextTooLong { length: usize, max: usize },

    // ─────────────────────────────────────────────────────────────────────────────
    // Upstream failures
    // ─────────────────────────────────────────────────────────────────────────────

    /// Speech service call failed
    #[error("Speech service error: {0}")]
    Upstream(String),

    /// Synchronous synthesis returned no audio data
    #[error("Synthesis response does not contain audio data")]
    MissingAudio,

    /// Asynchronous synthesis was accepted without a task identifier
    #[error("Synthesis task response does not contain a task id")]
    MissingTaskId,

    /// Task output location could not be turned into an object key
    #[error("Invalid synthesis output URI '{uri}': {reason}")]
    InvalidOutputUri { uri: String, reason: String },

    /// Result store failure while checking or writing audio
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SynthesisError {
    /// Whether repeating the same request unchanged could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UnsupportedLanguage(_)
            | Self::NoVoiceAvailable(_)
            | Self::TextTooLong { .. }
            | Self::InvalidOutputUri { .. } => false,
            Self::Upstream(_) | Self::MissingAudio | Self::MissingTaskId => true,
            Self::Store(e) => !matches!(e, StoreError::InvalidKey { .. }),
        }
    }
}
