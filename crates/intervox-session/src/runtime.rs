//! Runtime assembly
//!
//! Wires the capture engine, integrity monitor, and session controller into
//! one running unit. The host supplies the capability backends; everything
//! else (channels, snapshot mirror, task spawning) is built here.

use crate::config::Settings;
use crate::controller::{ControllerWiring, SessionController, SessionTiming};
use crate::handle::{SessionHandle, SessionSnapshot};
use intervox_capture::{CaptureEngine, SpeechRecognizer};
use intervox_foundation::SharedClock;
use intervox_gateway::TurnGateway;
use intervox_playback::{PlaybackController, SpeechSynthesizer};
use intervox_proctor::{EnvSignal, IntegrityMonitor};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

/// Backend capabilities the host plugs into a session runtime.
pub struct SessionCapabilities<R: SpeechRecognizer> {
    pub recognizer: R,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub gateway: Arc<dyn TurnGateway>,
    pub clock: SharedClock,
    /// Invoked once when the interview reaches completion
    pub on_complete: Option<Box<dyn FnOnce() + Send>>,
}

/// A running session: the controller, capture, and monitor tasks plus the
/// handle the host drives them through.
pub struct SessionRuntime {
    handle: SessionHandle,
    env_signal_tx: mpsc::Sender<EnvSignal>,
    controller_task: JoinHandle<()>,
    capture_task: JoinHandle<()>,
    monitor_task: JoinHandle<()>,
}

/// Assemble and spawn the full session stack. Must be called from within a
/// tokio runtime.
pub fn start<R: SpeechRecognizer + Sync + 'static>(
    session_id: impl Into<String>,
    settings: &Settings,
    capabilities: SessionCapabilities<R>,
) -> SessionRuntime {
    let session_id = session_id.into();
    let (command_tx, command_rx) = mpsc::channel(32);
    let (capture_cmd_tx, capture_cmd_rx) = mpsc::channel(8);
    let (capture_event_tx, capture_event_rx) = mpsc::channel(32);
    let (env_signal_tx, env_signal_rx) = mpsc::channel(64);
    let (integrity_tx, integrity_rx) = mpsc::channel(64);
    let (event_tx, _) = broadcast::channel(64);
    let snapshot = Arc::new(RwLock::new(SessionSnapshot::default()));

    let engine = CaptureEngine::new(
        capture_cmd_rx,
        capture_event_tx,
        capabilities.recognizer,
        settings.capture_config(),
    );
    let capture_task = tokio::spawn(engine.run());

    let monitor = IntegrityMonitor::new(env_signal_rx, integrity_tx);
    let monitor_task = tokio::spawn(monitor.run());

    let playback = PlaybackController::new(capabilities.synthesizer, settings.voice_settings());
    let timing = SessionTiming {
        greeting_delay: settings.greeting_delay(),
        question_delay: settings.question_delay(),
        submit_deadline: settings.submit_deadline(),
    };
    let wiring = ControllerWiring {
        command_rx,
        capture_tx: capture_cmd_tx,
        capture_rx: capture_event_rx,
        integrity_rx,
        snapshot: snapshot.clone(),
        event_tx: event_tx.clone(),
    };
    let controller = SessionController::new(
        session_id.clone(),
        timing,
        wiring,
        capabilities.gateway,
        playback,
        capabilities.clock,
        capabilities.on_complete,
    );
    let controller_task = tokio::spawn(controller.run());

    info!(target: "session", "Session runtime started (session {})", session_id);
    SessionRuntime {
        handle: SessionHandle::new(command_tx, snapshot, event_tx),
        env_signal_tx,
        controller_task,
        capture_task,
        monitor_task,
    }
}

impl SessionRuntime {
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Sender for raw host environment signals (visibility, fullscreen).
    pub fn env_signal_sender(&self) -> mpsc::Sender<EnvSignal> {
        self.env_signal_tx.clone()
    }

    /// Tear the runtime down. Aborts all tasks and waits for each to finish.
    pub async fn shutdown(self) {
        info!(target: "session", "Session runtime shutting down");
        self.controller_task.abort();
        self.capture_task.abort();
        self.monitor_task.abort();
        let _ = self.controller_task.await;
        let _ = self.capture_task.await;
        let _ = self.monitor_task.await;
        info!(target: "session", "Session runtime shutdown complete");
    }
}
