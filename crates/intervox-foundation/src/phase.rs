use crate::error::SessionError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

/// Lifecycle phase of one interview session.
///
/// There is no failed phase: a failed start lands back in `Idle` and a failed
/// submission lands back in `AwaitingAnswer`, with the error carried
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Starting,
    AwaitingAnswer,
    Submitting,
    Completed,
}

impl SessionPhase {
    /// Phases during which the interview counts as in progress. Integrity
    /// events are only tallied while this holds.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionPhase::Starting | SessionPhase::AwaitingAnswer | SessionPhase::Submitting
        )
    }
}

pub struct PhaseTracker {
    phase: Arc<RwLock<SessionPhase>>,
    phase_tx: Sender<SessionPhase>,
    phase_rx: Receiver<SessionPhase>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        let (phase_tx, phase_rx) = crossbeam_channel::unbounded();
        Self {
            phase: Arc::new(RwLock::new(SessionPhase::Idle)),
            phase_tx,
            phase_rx,
        }
    }

    pub fn transition(&self, next: SessionPhase) -> Result<(), SessionError> {
        let mut current = self.phase.write();

        // Validate phase transitions
        let valid = matches!(
            (*current, next),
            (SessionPhase::Idle, SessionPhase::Starting)
                | (SessionPhase::Starting, SessionPhase::AwaitingAnswer)
                | (SessionPhase::Starting, SessionPhase::Idle)
                | (SessionPhase::AwaitingAnswer, SessionPhase::Submitting)
                | (SessionPhase::AwaitingAnswer, SessionPhase::Idle)
                | (SessionPhase::Submitting, SessionPhase::AwaitingAnswer)
                | (SessionPhase::Submitting, SessionPhase::Completed)
                | (SessionPhase::Submitting, SessionPhase::Idle)
                | (SessionPhase::Completed, SessionPhase::Idle)
        );

        if !valid {
            return Err(SessionError::InvalidTransition {
                from: *current,
                to: next,
            });
        }

        tracing::info!("Phase transition: {:?} -> {:?}", *current, next);
        *current = next;
        let _ = self.phase_tx.send(next);
        Ok(())
    }

    pub fn current(&self) -> SessionPhase {
        *self.phase.read()
    }

    pub fn subscribe(&self) -> Receiver<SessionPhase> {
        self.phase_rx.clone()
    }
}
