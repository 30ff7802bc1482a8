//! Capture engine driving a recognizer through start/accumulate/endpoint cycles.

use crate::next_capture_id;
use crate::recognizer::{RecognizerEvent, SpeechRecognizer};
use crate::types::{CaptureCommand, CaptureConfig, CaptureEvent, VoiceCaptureState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// How long to keep draining recognizer events after a stop request before
/// finalizing anyway.
const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default)]
pub struct CaptureMetrics {
    pub captures_started: u64,
    pub transcripts_emitted: u64,
    pub silence_stops: u64,
    pub recognizer_errors: u64,
}

pub struct CaptureEngine<R: SpeechRecognizer> {
    command_rx: mpsc::Receiver<CaptureCommand>,
    event_tx: mpsc::Sender<CaptureEvent>,
    recognizer: R,
    state: VoiceCaptureState,
    metrics: Arc<parking_lot::RwLock<CaptureMetrics>>,
    config: CaptureConfig,
}

impl<R: SpeechRecognizer> CaptureEngine<R> {
    pub fn new(
        command_rx: mpsc::Receiver<CaptureCommand>,
        event_tx: mpsc::Sender<CaptureEvent>,
        recognizer: R,
        config: CaptureConfig,
    ) -> Self {
        if !config.enabled {
            info!(target: "capture", "Speech capture disabled in configuration");
        }
        Self {
            command_rx,
            event_tx,
            recognizer,
            state: VoiceCaptureState::default(),
            metrics: Arc::new(parking_lot::RwLock::new(CaptureMetrics::default())),
            config,
        }
    }

    pub fn metrics_handle(&self) -> Arc<parking_lot::RwLock<CaptureMetrics>> {
        self.metrics.clone()
    }

    pub async fn run(mut self) {
        info!(target: "capture", "Capture engine starting (language: {}, silence timeout: {:?})",
            self.config.language, self.config.silence_timeout);
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CaptureCommand::Start => {
                    if !self.config.enabled {
                        warn!(target: "capture", "Start ignored: capture disabled");
                        continue;
                    }
                    self.run_capture().await;
                }
                CaptureCommand::Stop => {
                    debug!(target: "capture", "Stop while not listening, ignoring");
                }
            }
        }
        let m = self.metrics.read();
        info!(target: "capture", "Capture engine shutting down captures={} transcripts={} silence_stops={} errors={}",
            m.captures_started, m.transcripts_emitted, m.silence_stops, m.recognizer_errors);
    }

    /// One capture: listen until silence, an explicit stop, or recognizer end.
    async fn run_capture(&mut self) {
        let capture_id = next_capture_id();
        let mut events = match self.recognizer.start().await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(target: "capture", "Recognizer failed to start: {}", e);
                self.send_event(CaptureEvent::Stopped).await;
                return;
            }
        };

        self.state.listening = true;
        self.state.accumulated.clear();
        self.metrics.write().captures_started += 1;
        self.send_event(CaptureEvent::Started).await;
        info!(target: "capture", "Capture {} listening", capture_id);

        let mut deadline = Instant::now() + self.config.silence_timeout;
        let mut stopping = false;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(RecognizerEvent::Result { text }) => {
                        self.accumulate(&text);
                        deadline = Instant::now() + self.config.silence_timeout;
                    }
                    Some(RecognizerEvent::Error { message }) => {
                        self.metrics.write().recognizer_errors += 1;
                        warn!(target: "capture", "Capture {} recognizer error: {}", capture_id, message);
                    }
                    Some(RecognizerEvent::Ended) | None => break,
                },
                _ = time::sleep_until(deadline) => {
                    if stopping {
                        warn!(target: "capture", "Capture {} recognizer did not end after stop request, finalizing", capture_id);
                        break;
                    }
                    debug!(target: "capture", "Capture {} silent for {:?}, requesting stop",
                        capture_id, self.config.silence_timeout);
                    self.metrics.write().silence_stops += 1;
                    self.request_stop().await;
                    stopping = true;
                    deadline = Instant::now() + STOP_GRACE;
                },
                cmd = self.command_rx.recv() => match cmd {
                    Some(CaptureCommand::Stop) => {
                        if !stopping {
                            debug!(target: "capture", "Capture {} stop requested", capture_id);
                            self.request_stop().await;
                            stopping = true;
                            deadline = Instant::now() + STOP_GRACE;
                        }
                    }
                    Some(CaptureCommand::Start) => {
                        warn!(target: "capture", "Start while already listening, ignoring");
                    }
                    None => break,
                },
            }
        }

        self.finalize(capture_id).await;
    }

    /// Space-join a recognized chunk onto the accumulation buffer.
    fn accumulate(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.state.accumulated.is_empty() {
            self.state.accumulated.push(' ');
        }
        self.state.accumulated.push_str(text);
        debug!(target: "capture", "Accumulated {} chars", self.state.accumulated.len());
    }

    async fn finalize(&mut self, capture_id: u64) {
        self.state.listening = false;
        let transcript = self.state.accumulated.trim().to_string();
        if transcript.is_empty() {
            debug!(target: "capture", "Capture {} ended with no speech", capture_id);
        } else {
            info!(target: "capture", "Capture {} finalized {} chars", capture_id, transcript.len());
            self.metrics.write().transcripts_emitted += 1;
            self.send_event(CaptureEvent::Transcript { text: transcript }).await;
        }
        self.send_event(CaptureEvent::Stopped).await;
    }

    async fn request_stop(&mut self) {
        if let Err(e) = self.recognizer.stop().await {
            warn!(target: "capture", "Recognizer stop failed: {}", e);
        }
    }

    async fn send_event(&self, event: CaptureEvent) {
        if let Err(e) = self.event_tx.send(event).await {
            debug!(target: "capture", "Failed sending capture event (channel closed): {}", e);
        }
    }
}
