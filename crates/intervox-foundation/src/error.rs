use std::time::Duration;
use thiserror::Error;

use crate::phase::SessionPhase;

/// Failures the session controller can observe.
///
/// Every variant is recoverable at the process level; `disposition()` says
/// whether the host sees it or it is only logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The start request failed. The session returns to idle and may be
    /// started again.
    #[error("Failed to start interview: {0}")]
    StartFailure(String),

    /// The local deadline elapsed before the turn request settled. The
    /// request itself may still be running on the server.
    #[error("No response after {elapsed:?}; the answer was kept and can be resubmitted")]
    TimeoutFailure { elapsed: Duration },

    /// The turn request settled with a transport or protocol failure.
    #[error("Failed to submit answer: {0}")]
    TransportFailure(String),

    /// An auxiliary report (tab switch, security metrics) failed. Never
    /// surfaced to the host.
    #[error("Best-effort report failed: {0}")]
    BestEffortFailure(String),

    /// A phase change was requested that the state machine forbids.
    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: SessionPhase,
        to: SessionPhase,
    },
}

/// What the controller does with an error once it is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Surface through `last_error` and the event channel; the triggering
    /// operation may be retried with the same inputs.
    Surface,
    /// Log and continue. Session state is unaffected.
    Ignore,
}

impl SessionError {
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            SessionError::StartFailure(_)
            | SessionError::TimeoutFailure { .. }
            | SessionError::TransportFailure(_) => ErrorDisposition::Surface,
            SessionError::BestEffortFailure(_) | SessionError::InvalidTransition { .. } => {
                ErrorDisposition::Ignore
            }
        }
    }
}
