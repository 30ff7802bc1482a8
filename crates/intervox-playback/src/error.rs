//! Error types for speech playback

use thiserror::Error;

/// Playback error types
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Synthesizer backend is not available or not installed
    #[error("Synthesizer not available: {0}")]
    EngineNotAvailable(String),

    /// Synthesis failed
    #[error("Synthesis failed: {0}")]
    SynthesisError(String),

    /// Invalid text input
    #[error("Invalid text input: {0}")]
    InvalidInput(String),

    /// IO error (process spawning, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;
