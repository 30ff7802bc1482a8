use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Speech recognition unavailable: {0}")]
    NotAvailable(String),

    #[error("Recognizer failed to start: {0}")]
    StartFailed(String),

    #[error("Recognizer backend error: {0}")]
    Backend(String),
}

/// One recognizer-side event within a capture
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    /// A finalized chunk of recognized speech
    Result { text: String },
    /// A backend error. The capture keeps running; accumulated text is kept.
    Error { message: String },
    /// The recognizer stopped producing results for this capture
    Ended,
}

/// Capability seam for continuous speech recognition.
///
/// `start` begins one capture and returns its event stream. `stop` asks the
/// backend to finish; it must eventually lead to `Ended` or stream closure so
/// the engine can finalize.
#[async_trait]
pub trait SpeechRecognizer: Send {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>, CaptureError>;

    async fn stop(&mut self) -> Result<(), CaptureError>;
}
