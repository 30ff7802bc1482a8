/// Which listener a signal came from. Vendor-prefixed variants are aliases of
/// the standard source; they carry no extra meaning beyond provenance in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    Standard,
    WebkitPrefixed,
    MozPrefixed,
    MsPrefixed,
}

/// Raw environment signal as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvSignal {
    /// Page or window visibility changed
    Visibility { hidden: bool, source: SignalSource },
    /// Fullscreen state changed
    Fullscreen { active: bool, source: SignalSource },
}

/// Deduplicated integrity edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityEvent {
    /// The candidate left the page (visible -> hidden edge)
    VisibilityLost,
    /// Effective fullscreen state changed
    FullscreenChanged { active: bool },
}
