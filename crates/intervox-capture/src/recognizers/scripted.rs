//! Scripted recognizer for tests and demos

use crate::recognizer::{CaptureError, RecognizerEvent, SpeechRecognizer};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

/// One scripted step. Delays are relative to the previous step.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Emit a recognized chunk
    Result { delay: Duration, text: String },
    /// Emit a backend error
    Error { delay: Duration, message: String },
    /// End the capture from the recognizer side
    End { delay: Duration },
}

impl ScriptStep {
    pub fn result_after(delay: Duration, text: &str) -> Self {
        ScriptStep::Result {
            delay,
            text: text.to_string(),
        }
    }

    pub fn error_after(delay: Duration, message: &str) -> Self {
        ScriptStep::Error {
            delay,
            message: message.to_string(),
        }
    }

    pub fn end_after(delay: Duration) -> Self {
        ScriptStep::End { delay }
    }
}

/// Replays a fixed script for every capture.
///
/// After the script is exhausted the capture stays live until a stop request,
/// which mirrors a backend that keeps listening until told otherwise. A stop
/// request mid-script ends the capture at the next step boundary.
pub struct ScriptedRecognizer {
    script: Vec<ScriptStep>,
    fail_start: bool,
    stop: Option<Arc<Notify>>,
    starts: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    pub fn with_script(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            fail_start: false,
            stop: None,
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A capture that produces no results and waits for a stop request.
    pub fn silent() -> Self {
        Self::with_script(Vec::new())
    }

    /// Every start call fails.
    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::silent()
        }
    }

    /// Shared start counter, for asserting the engine does not restart
    /// captures that are already running.
    pub fn start_count_handle(&self) -> Arc<AtomicUsize> {
        self.starts.clone()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>, CaptureError> {
        if self.fail_start {
            return Err(CaptureError::StartFailed("scripted start failure".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(16);
        let stop = Arc::new(Notify::new());
        self.stop = Some(stop.clone());
        let script = self.script.clone();

        tokio::spawn(async move {
            for step in script {
                match step {
                    ScriptStep::Result { delay, text } => {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {
                                if tx.send(RecognizerEvent::Result { text }).await.is_err() {
                                    return;
                                }
                            }
                            _ = stop.notified() => {
                                let _ = tx.send(RecognizerEvent::Ended).await;
                                return;
                            }
                        }
                    }
                    ScriptStep::Error { delay, message } => {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {
                                if tx.send(RecognizerEvent::Error { message }).await.is_err() {
                                    return;
                                }
                            }
                            _ = stop.notified() => {
                                let _ = tx.send(RecognizerEvent::Ended).await;
                                return;
                            }
                        }
                    }
                    ScriptStep::End { delay } => {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(RecognizerEvent::Ended).await;
                        return;
                    }
                }
            }
            // Script exhausted, stay live until stopped.
            stop.notified().await;
            let _ = tx.send(RecognizerEvent::Ended).await;
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(stop) = self.stop.take() {
            stop.notify_one();
        }
        Ok(())
    }
}
