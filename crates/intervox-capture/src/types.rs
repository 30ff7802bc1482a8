use std::time::Duration;

/// Events emitted by the capture engine toward its consumer
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// A capture began; the accumulation buffer was reset
    Started,
    /// The capture ended with recognized speech. Emitted at most once per
    /// capture, with the full space-joined accumulation.
    Transcript { text: String },
    /// The capture ended. Always emitted after a start, with or without a
    /// transcript, including when the recognizer failed to start at all.
    Stopped,
}

/// Commands accepted by a running capture engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Start,
    Stop,
}

/// Configuration for speech capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Whether capture is available at all. When false the engine ignores
    /// start commands, mirroring a host without speech input.
    pub enabled: bool,
    /// Recognition language tag
    pub language: String,
    /// Silence after the last recognized result before the capture auto-stops
    pub silence_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en-US".to_string(),
            silence_timeout: Duration::from_secs(10),
        }
    }
}

/// Mutable state of the capture engine. Owned by the engine task; consumers
/// observe it through `CaptureEvent`s only.
#[derive(Debug, Clone, Default)]
pub struct VoiceCaptureState {
    pub listening: bool,
    pub accumulated: String,
}
