//! Session lifecycle controller
//!
//! Owns the session record and drives the start/answer/advance/complete
//! protocol as a single task. All mutation happens here; the host observes
//! through the snapshot mirror and the event broadcast, and every spawned
//! continuation (turn resolutions, delayed speech) is tagged with a sequence
//! number so resolutions that outlive a stop are dropped instead of applied.

use crate::events::SessionEvent;
use crate::handle::SessionSnapshot;
use intervox_capture::{CaptureCommand, CaptureEvent};
use intervox_foundation::{PhaseTracker, SessionError, SessionPhase, SharedClock};
use intervox_gateway::{
    race_deadline, GatewayError, GatewayResult, NextRequest, NextResponse, SecurityMetricsReport,
    StartRequest, StartResponse, TabSwitchReport, TurnGateway,
};
use intervox_playback::PlaybackController;
use intervox_proctor::IntegrityEvent;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::{debug, info, warn};

/// Host operations accepted by the controller task.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    Start,
    SubmitAnswer(String),
    AppendVoiceText(String),
    ReplaceVoiceText(String),
    StartListening,
    StopListening,
    DismissWarning,
    Stop,
}

/// Results of spawned work, tagged with the sequence number that was current
/// when the work was issued. A mismatch on receipt means a stop or restart
/// happened in between and the result must not touch session state.
enum Continuation {
    StartDone {
        seq: u64,
        result: GatewayResult<StartResponse>,
    },
    TurnDone {
        seq: u64,
        result: GatewayResult<NextResponse>,
    },
    SpeakDue {
        seq: u64,
        text: String,
    },
}

/// Delays and deadlines for one session run.
#[derive(Debug, Clone)]
pub(crate) struct SessionTiming {
    /// Pause between the spoken greeting and the first question
    pub greeting_delay: Duration,
    /// Pause before a newly arrived question is spoken
    pub question_delay: Duration,
    /// Local deadline on start and turn requests
    pub submit_deadline: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
struct IntegrityRecord {
    tab_switch_count: u32,
    fullscreen_used: bool,
}

/// The session record. Owned exclusively by the controller task; everything
/// the host can see of it goes through the snapshot.
struct Session {
    session_id: String,
    question_index: u32,
    current_question: String,
    greeting: String,
    pending_answer: String,
    started_at: Option<Instant>,
    integrity: IntegrityRecord,
    last_error: Option<SessionError>,
    tab_switch_warning: bool,
}

impl Session {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            question_index: 0,
            current_question: String::new(),
            greeting: String::new(),
            pending_answer: String::new(),
            started_at: None,
            integrity: IntegrityRecord::default(),
            last_error: None,
            tab_switch_warning: false,
        }
    }

    /// Reset for a fresh run, keeping only the session id.
    fn reset(&mut self) {
        self.question_index = 0;
        self.current_question.clear();
        self.greeting.clear();
        self.pending_answer.clear();
        self.started_at = None;
        self.integrity = IntegrityRecord::default();
        self.last_error = None;
        self.tab_switch_warning = false;
    }
}

/// Channel fabric the controller is wired into.
pub(crate) struct ControllerWiring {
    pub command_rx: mpsc::Receiver<SessionCommand>,
    pub capture_tx: mpsc::Sender<CaptureCommand>,
    pub capture_rx: mpsc::Receiver<CaptureEvent>,
    pub integrity_rx: mpsc::Receiver<IntegrityEvent>,
    pub snapshot: Arc<RwLock<SessionSnapshot>>,
    pub event_tx: broadcast::Sender<SessionEvent>,
}

pub(crate) struct SessionController {
    session: Session,
    phase: PhaseTracker,
    timing: SessionTiming,
    command_rx: mpsc::Receiver<SessionCommand>,
    continuation_tx: mpsc::Sender<Continuation>,
    continuation_rx: mpsc::Receiver<Continuation>,
    capture_tx: mpsc::Sender<CaptureCommand>,
    capture_rx: mpsc::Receiver<CaptureEvent>,
    integrity_rx: mpsc::Receiver<IntegrityEvent>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    event_tx: broadcast::Sender<SessionEvent>,
    gateway: Arc<dyn TurnGateway>,
    playback: PlaybackController,
    clock: SharedClock,
    /// Bumped on start and stop; stale continuations carry an older value.
    seq: u64,
    /// Engine-confirmed listening state
    listening: bool,
    /// Set when the host asked for capture, cleared when the capture ends
    voice_active: bool,
    /// The next transcript extends the answer instead of replacing it
    append_next_transcript: bool,
    on_complete: Option<Box<dyn FnOnce() + Send>>,
    answers_accepted: u64,
}

impl SessionController {
    pub(crate) fn new(
        session_id: String,
        timing: SessionTiming,
        wiring: ControllerWiring,
        gateway: Arc<dyn TurnGateway>,
        playback: PlaybackController,
        clock: SharedClock,
        on_complete: Option<Box<dyn FnOnce() + Send>>,
    ) -> Self {
        let (continuation_tx, continuation_rx) = mpsc::channel(32);
        Self {
            session: Session::new(session_id),
            phase: PhaseTracker::new(),
            timing,
            command_rx: wiring.command_rx,
            continuation_tx,
            continuation_rx,
            capture_tx: wiring.capture_tx,
            capture_rx: wiring.capture_rx,
            integrity_rx: wiring.integrity_rx,
            snapshot: wiring.snapshot,
            event_tx: wiring.event_tx,
            gateway,
            playback,
            clock,
            seq: 0,
            listening: false,
            voice_active: false,
            append_next_transcript: false,
            on_complete,
            answers_accepted: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(target: "session", "Session controller starting (session {})", self.session.session_id);
        self.sync_snapshot();

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(continuation) = self.continuation_rx.recv() => {
                    self.handle_continuation(continuation).await;
                }
                Some(event) = self.capture_rx.recv() => {
                    self.handle_capture_event(event);
                }
                Some(event) = self.integrity_rx.recv() => {
                    self.handle_integrity_event(event);
                }
            }
        }

        info!(target: "session", "Session controller stopped: {} answers accepted, {} tab switches",
            self.answers_accepted, self.session.integrity.tab_switch_count);
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start => self.handle_start(),
            SessionCommand::SubmitAnswer(text) => self.handle_submit(&text),
            SessionCommand::AppendVoiceText(text) => self.append_voice_text(&text),
            SessionCommand::ReplaceVoiceText(text) => self.replace_voice_text(&text),
            SessionCommand::StartListening => self.handle_start_listening().await,
            SessionCommand::StopListening => self.handle_stop_listening().await,
            SessionCommand::DismissWarning => self.handle_dismiss_warning(),
            SessionCommand::Stop => self.handle_stop().await,
        }
    }

    async fn handle_continuation(&mut self, continuation: Continuation) {
        match continuation {
            Continuation::StartDone { seq, result } => {
                if seq != self.seq {
                    debug!(target: "session", "Discarding stale start resolution (seq {} != {})", seq, self.seq);
                    return;
                }
                self.handle_start_done(result).await;
            }
            Continuation::TurnDone { seq, result } => {
                if seq != self.seq {
                    debug!(target: "session", "Discarding stale turn resolution (seq {} != {})", seq, self.seq);
                    return;
                }
                self.handle_turn_done(result).await;
            }
            Continuation::SpeakDue { seq, text } => {
                if seq != self.seq {
                    debug!(target: "session", "Discarding stale speak timer (seq {} != {})", seq, self.seq);
                    return;
                }
                self.speak(&text).await;
            }
        }
    }

    fn handle_start(&mut self) {
        if self.phase.current() != SessionPhase::Idle {
            debug!(target: "session", "Start ignored in phase {:?}", self.phase.current());
            return;
        }
        if let Err(e) = self.phase.transition(SessionPhase::Starting) {
            warn!(target: "session", "{}", e);
            return;
        }
        self.session.last_error = None;
        self.seq += 1;

        let seq = self.seq;
        let gateway = self.gateway.clone();
        let request = StartRequest {
            session_id: self.session.session_id.clone(),
        };
        let deadline = self.timing.submit_deadline;
        let continuation_tx = self.continuation_tx.clone();
        info!(target: "session", "Starting interview {}", request.session_id);
        tokio::spawn(async move {
            let result =
                race_deadline("start", deadline, async move { gateway.start(request).await }).await;
            let _ = continuation_tx
                .send(Continuation::StartDone { seq, result })
                .await;
        });
        self.sync_snapshot();
    }

    async fn handle_start_done(&mut self, result: GatewayResult<StartResponse>) {
        match result {
            Ok(response) => {
                self.session.greeting = response.greeting_or_default().to_string();
                self.session.current_question = response.question;
                self.session.question_index = 0;
                self.session.started_at = Some(self.clock.now());
                if let Err(e) = self.phase.transition(SessionPhase::AwaitingAnswer) {
                    warn!(target: "session", "{}", e);
                }
                info!(target: "session", "Interview started, first question ready");
                let greeting = self.session.greeting.clone();
                self.speak(&greeting).await;
                self.schedule_speak(self.timing.greeting_delay, self.session.current_question.clone());
                self.sync_snapshot();
                self.publish(SessionEvent::Started);
            }
            Err(e) => {
                let error = SessionError::StartFailure(e.to_string());
                warn!(target: "session", "{}", error);
                if let Err(e) = self.phase.transition(SessionPhase::Idle) {
                    warn!(target: "session", "{}", e);
                }
                self.session.last_error = Some(error.clone());
                self.sync_snapshot();
                self.publish(SessionEvent::StartFailed { error });
            }
        }
    }

    fn handle_submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!(target: "session", "Blank answer ignored");
            return;
        }
        if self.phase.current() != SessionPhase::AwaitingAnswer {
            debug!(target: "session", "Submit ignored in phase {:?}", self.phase.current());
            return;
        }
        self.session.pending_answer = text.to_string();
        if let Err(e) = self.phase.transition(SessionPhase::Submitting) {
            warn!(target: "session", "{}", e);
            return;
        }

        let seq = self.seq;
        let gateway = self.gateway.clone();
        let request = NextRequest {
            session_id: self.session.session_id.clone(),
            answer: self.session.pending_answer.clone(),
        };
        let deadline = self.timing.submit_deadline;
        let continuation_tx = self.continuation_tx.clone();
        info!(target: "session", "Submitting answer for question {} ({} chars)",
            self.session.question_index, request.answer.len());
        tokio::spawn(async move {
            let result =
                race_deadline("next", deadline, async move { gateway.next(request).await }).await;
            let _ = continuation_tx
                .send(Continuation::TurnDone { seq, result })
                .await;
        });
        self.sync_snapshot();
    }

    async fn handle_turn_done(&mut self, result: GatewayResult<NextResponse>) {
        match result {
            Ok(response) => {
                if let Some(feedback) = &response.feedback {
                    debug!(target: "session", "Coaching feedback: {}", feedback);
                }
                if let Some(tone) = &response.tone {
                    debug!(target: "session", "Tone assessment: {}", tone);
                }
                if let Some(score) = &response.score {
                    debug!(target: "session", "Turn score: {}", score);
                }
                self.session.pending_answer.clear();
                self.session.last_error = None;
                self.answers_accepted += 1;
                if response.is_completion() {
                    self.complete();
                } else {
                    self.session.question_index += 1;
                    self.session.current_question = response.question;
                    if let Err(e) = self.phase.transition(SessionPhase::AwaitingAnswer) {
                        warn!(target: "session", "{}", e);
                    }
                    info!(target: "session", "Advanced to question {}", self.session.question_index);
                    self.schedule_speak(
                        self.timing.question_delay,
                        self.session.current_question.clone(),
                    );
                    self.sync_snapshot();
                    self.publish(SessionEvent::QuestionAdvanced {
                        question_index: self.session.question_index,
                    });
                }
            }
            Err(e) => {
                let error = match e {
                    GatewayError::DeadlineExceeded { elapsed } => {
                        SessionError::TimeoutFailure { elapsed }
                    }
                    other => SessionError::TransportFailure(other.to_string()),
                };
                warn!(target: "session", "{}", error);
                if let Err(e) = self.phase.transition(SessionPhase::AwaitingAnswer) {
                    warn!(target: "session", "{}", e);
                }
                self.session.last_error = Some(error.clone());
                self.sync_snapshot();
                self.publish(SessionEvent::SubmitFailed { error });
            }
        }
    }

    /// Terminal sentinel received: flush metrics, fire the completion
    /// callback once, and settle in the completed phase.
    fn complete(&mut self) {
        let minutes = self
            .session
            .started_at
            .map(|started| duration_minutes(self.clock.now() - started))
            .unwrap_or(0);
        let report = SecurityMetricsReport {
            session_id: self.session.session_id.clone(),
            tab_switch_count: self.session.integrity.tab_switch_count,
            fullscreen_used: self.session.integrity.fullscreen_used,
            interview_duration_minutes: minutes,
        };
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway.report_security_metrics(report).await {
                warn!(target: "session", "{}", SessionError::BestEffortFailure(e.to_string()));
            }
        });

        if let Err(e) = self.phase.transition(SessionPhase::Completed) {
            warn!(target: "session", "{}", e);
        }
        info!(target: "session", "Interview completed after {} answers ({} min)",
            self.answers_accepted, minutes);
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
        self.sync_snapshot();
        self.publish(SessionEvent::Completed);
    }

    async fn handle_start_listening(&mut self) {
        if self.voice_active {
            debug!(target: "session", "Already listening, next transcript will append");
            self.append_next_transcript = true;
            return;
        }
        self.voice_active = true;
        self.append_next_transcript = false;
        if self.capture_tx.send(CaptureCommand::Start).await.is_err() {
            warn!(target: "session", "Capture engine unavailable");
            self.voice_active = false;
        }
    }

    async fn handle_stop_listening(&mut self) {
        if !self.voice_active {
            debug!(target: "session", "Stop listening ignored, no capture running");
            return;
        }
        if self.capture_tx.send(CaptureCommand::Stop).await.is_err() {
            warn!(target: "session", "Capture engine unavailable");
        }
    }

    fn handle_capture_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Started => {
                self.listening = true;
                self.sync_snapshot();
                self.publish(SessionEvent::ListeningChanged { listening: true });
            }
            CaptureEvent::Transcript { text } => {
                if self.append_next_transcript {
                    self.append_voice_text(&text);
                } else {
                    self.replace_voice_text(&text);
                }
            }
            CaptureEvent::Stopped => {
                self.listening = false;
                self.voice_active = false;
                self.append_next_transcript = false;
                self.sync_snapshot();
                self.publish(SessionEvent::ListeningChanged { listening: false });
            }
        }
    }

    fn handle_integrity_event(&mut self, event: IntegrityEvent) {
        match event {
            IntegrityEvent::VisibilityLost => {
                if !self.phase.current().is_active() {
                    debug!(target: "session", "Visibility loss outside an active session, not counted");
                    return;
                }
                self.session.integrity.tab_switch_count += 1;
                self.session.tab_switch_warning = true;
                let count = self.session.integrity.tab_switch_count;
                warn!(target: "session", "Tab switch detected (count {})", count);

                let gateway = self.gateway.clone();
                let report = TabSwitchReport {
                    session_id: self.session.session_id.clone(),
                    tab_switch_count: count,
                };
                tokio::spawn(async move {
                    if let Err(e) = gateway.report_tab_switch(report).await {
                        warn!(target: "session", "{}", SessionError::BestEffortFailure(e.to_string()));
                    }
                });
                self.sync_snapshot();
                self.publish(SessionEvent::TabSwitchWarning { count });
            }
            IntegrityEvent::FullscreenChanged { active } => {
                if active && !self.session.integrity.fullscreen_used {
                    info!(target: "session", "Fullscreen entered");
                    self.session.integrity.fullscreen_used = true;
                    self.sync_snapshot();
                }
            }
        }
    }

    fn handle_dismiss_warning(&mut self) {
        if self.session.tab_switch_warning {
            self.session.tab_switch_warning = false;
            self.sync_snapshot();
        }
    }

    async fn handle_stop(&mut self) {
        info!(target: "session", "Session stop requested");
        self.seq += 1;
        if let Err(e) = self.playback.cancel().await {
            warn!(target: "session", "Playback cancel failed: {}", e);
        }
        if self.voice_active && self.capture_tx.send(CaptureCommand::Stop).await.is_err() {
            debug!(target: "session", "Capture engine already gone");
        }
        self.voice_active = false;
        self.append_next_transcript = false;
        self.listening = false;
        self.session.reset();
        if self.phase.current() != SessionPhase::Idle {
            if let Err(e) = self.phase.transition(SessionPhase::Idle) {
                warn!(target: "session", "{}", e);
            }
        }
        self.sync_snapshot();
    }

    fn append_voice_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.session.pending_answer.is_empty() {
            self.session.pending_answer.push(' ');
        }
        self.session.pending_answer.push_str(text);
        self.sync_snapshot();
    }

    fn replace_voice_text(&mut self, text: &str) {
        self.session.pending_answer = text.trim().to_string();
        self.sync_snapshot();
    }

    async fn speak(&mut self, text: &str) {
        if let Err(e) = self.playback.say(text).await {
            warn!(target: "session", "Playback failed: {}", e);
        }
    }

    /// Speak the text after a delay, unless a stop or restart intervenes.
    fn schedule_speak(&self, delay: Duration, text: String) {
        let seq = self.seq;
        let continuation_tx = self.continuation_tx.clone();
        tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = continuation_tx
                .send(Continuation::SpeakDue { seq, text })
                .await;
        });
    }

    fn sync_snapshot(&self) {
        let mut snapshot = self.snapshot.write();
        snapshot.phase = self.phase.current();
        snapshot.greeting = self.session.greeting.clone();
        snapshot.question = self.session.current_question.clone();
        snapshot.question_index = self.session.question_index;
        snapshot.answer_text = self.session.pending_answer.clone();
        snapshot.is_listening = self.listening;
        snapshot.tab_switch_warning = self.session.tab_switch_warning;
        snapshot.tab_switch_count = self.session.integrity.tab_switch_count;
        snapshot.fullscreen_used = self.session.integrity.fullscreen_used;
        snapshot.last_error = self.session.last_error.clone();
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Elapsed interview time rounded to the nearest whole minute.
fn duration_minutes(elapsed: Duration) -> u32 {
    (elapsed.as_secs_f64() / 60.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_round_to_nearest() {
        assert_eq!(duration_minutes(Duration::from_secs(0)), 0);
        assert_eq!(duration_minutes(Duration::from_secs(29)), 0);
        assert_eq!(duration_minutes(Duration::from_secs(31)), 1);
        assert_eq!(duration_minutes(Duration::from_secs(90)), 2);
        assert_eq!(duration_minutes(Duration::from_secs(130)), 2);
        assert_eq!(duration_minutes(Duration::from_secs(1500)), 25);
    }
}
