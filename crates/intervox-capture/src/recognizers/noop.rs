//! No-operation recognizer for hosts without speech input

use crate::recognizer::{CaptureError, RecognizerEvent, SpeechRecognizer};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A recognizer that never hears anything. Every capture ends immediately,
/// so the engine emits Started then Stopped with no transcript.
#[derive(Debug, Clone)]
pub struct NoopRecognizer;

impl NoopRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechRecognizer for NoopRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(RecognizerEvent::Ended).await;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }
}
