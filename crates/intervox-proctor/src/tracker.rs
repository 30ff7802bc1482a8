use crate::signal::{EnvSignal, IntegrityEvent};

/// Folds raw signals into effective state and reports edges.
///
/// A browser host registers the standard listener plus webkit/moz/MS variants
/// for the same underlying change, so the same state can arrive several times
/// in a row. Deduplication is by effective state only; the source tag never
/// enters the comparison.
pub struct SignalTracker {
    hidden: bool,

    fullscreen: bool,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self {
            hidden: false,
            fullscreen: false,
        }
    }

    /// Fold one raw signal. Returns an event only when the effective state
    /// actually changed.
    pub fn process(&mut self, signal: EnvSignal) -> Option<IntegrityEvent> {
        match signal {
            EnvSignal::Visibility { hidden, .. } => {
                if hidden == self.hidden {
                    return None;
                }
                self.hidden = hidden;
                if hidden {
                    Some(IntegrityEvent::VisibilityLost)
                } else {
                    // Returning to the page is tracked but not reported.
                    None
                }
            }
            EnvSignal::Fullscreen { active, .. } => {
                if active == self.fullscreen {
                    return None;
                }
                self.fullscreen = active;
                Some(IntegrityEvent::FullscreenChanged { active })
            }
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

impl Default for SignalTracker {
    fn default() -> Self {
        Self::new()
    }
}
