//! Synthesizer capability seam

use crate::error::PlaybackResult;
use crate::types::Utterance;
use async_trait::async_trait;

/// Core speech synthesis interface.
///
/// Implementations hand text to a backend (OS voice, external process,
/// remote service). `speak` returns once playback has been handed off, not
/// when the audio finishes; `cancel` stops whatever is currently audible.
#[async_trait]
pub trait SpeechSynthesizer: Send {
    async fn speak(&mut self, utterance: &Utterance) -> PlaybackResult<()>;

    async fn cancel(&mut self) -> PlaybackResult<()>;

    /// Check if the backend can produce audio on this system
    async fn is_available(&self) -> bool;
}
