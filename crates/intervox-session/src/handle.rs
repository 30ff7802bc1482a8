//! Host-facing surface of a running session

use crate::controller::SessionCommand;
use crate::events::SessionEvent;
use intervox_foundation::{SessionError, SessionPhase};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// Read-only view of the session, refreshed by the controller after every
/// mutation. Cheap to clone; holds no live references into controller state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub greeting: String,
    pub question: String,
    pub question_index: u32,
    /// Current contents of the answer buffer, typed or spoken
    pub answer_text: String,
    pub is_listening: bool,
    pub tab_switch_warning: bool,
    pub tab_switch_count: u32,
    pub fullscreen_used: bool,
    pub last_error: Option<SessionError>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            greeting: String::new(),
            question: String::new(),
            question_index: 0,
            answer_text: String::new(),
            is_listening: false,
            tab_switch_warning: false,
            tab_switch_count: 0,
            fullscreen_used: false,
            last_error: None,
        }
    }
}

impl SessionSnapshot {
    /// True while a submitted answer is waiting on the backend.
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Submitting
    }
}

/// Handle for driving a session controller task.
///
/// Operations are commands: they enqueue work on the controller and return
/// once it is accepted, not once it took effect. Outcomes surface through
/// [`subscribe`](Self::subscribe) and [`snapshot`](Self::snapshot).
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        snapshot: Arc<RwLock<SessionSnapshot>>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            command_tx,
            snapshot,
            event_tx,
        }
    }

    /// Begin the interview. A no-op unless the session is idle.
    pub async fn start(&self) {
        self.send(SessionCommand::Start).await;
    }

    /// Submit the given answer text for the current question. Blank text and
    /// submissions outside the answering phase are ignored.
    pub async fn submit_answer(&self, text: &str) {
        self.send(SessionCommand::SubmitAnswer(text.to_string())).await;
    }

    /// Append text onto the answer buffer, space-joined.
    pub async fn append_voice_text(&self, text: &str) {
        self.send(SessionCommand::AppendVoiceText(text.to_string())).await;
    }

    /// Replace the answer buffer with the given text.
    pub async fn replace_voice_text(&self, text: &str) {
        self.send(SessionCommand::ReplaceVoiceText(text.to_string())).await;
    }

    /// Start speech capture. Calling again while already listening marks the
    /// next transcript as a continuation instead of restarting the capture.
    pub async fn start_listening(&self) {
        self.send(SessionCommand::StartListening).await;
    }

    /// End the current speech capture, finalizing any recognized text.
    pub async fn stop_listening(&self) {
        self.send(SessionCommand::StopListening).await;
    }

    /// Clear the transient tab-switch warning flag.
    pub async fn dismiss_warning(&self) {
        self.send(SessionCommand::DismissWarning).await;
    }

    /// Abandon the running interview and return to idle. In-flight network
    /// calls are not cancelled; their late results are discarded.
    pub async fn stop(&self) {
        self.send(SessionCommand::Stop).await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    async fn send(&self, command: SessionCommand) {
        if self.command_tx.send(command).await.is_err() {
            debug!(target: "session", "Command dropped, controller is gone");
        }
    }
}
