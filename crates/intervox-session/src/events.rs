use intervox_foundation::SessionError;

/// Notifications broadcast to session observers.
///
/// Events carry the minimum needed to react; the full picture is always in
/// the snapshot, which is refreshed before the event is published.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The interview started; greeting and first question are in the snapshot
    Started,
    /// An answer was accepted and a new question arrived
    QuestionAdvanced { question_index: u32 },
    /// The start request failed; the session is back in idle and may be
    /// started again
    StartFailed { error: SessionError },
    /// The turn request failed; the answer was kept for resubmission
    SubmitFailed { error: SessionError },
    /// The candidate left the page during the interview
    TabSwitchWarning { count: u32 },
    /// Speech capture began or ended listening
    ListeningChanged { listening: bool },
    /// The terminal sentinel arrived; the interview is over
    Completed,
}
