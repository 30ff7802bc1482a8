//! Playback controller enforcing at most one audible utterance

use crate::error::{PlaybackError, PlaybackResult};
use crate::next_utterance_id;
use crate::synthesizer::SpeechSynthesizer;
use crate::types::{Utterance, VoiceSettings};
use tracing::{debug, warn};

/// Owns the synthesizer and serializes all speech through it. Every `say`
/// cancels the previous utterance first, so prompts never overlap.
pub struct PlaybackController {
    synthesizer: Box<dyn SpeechSynthesizer>,
    settings: VoiceSettings,
}

impl PlaybackController {
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>, settings: VoiceSettings) -> Self {
        Self {
            synthesizer,
            settings,
        }
    }

    /// Cancel whatever is playing, then start the new utterance. Returns the
    /// utterance id once the backend has accepted it.
    pub async fn say(&mut self, text: &str) -> PlaybackResult<u64> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PlaybackError::InvalidInput("empty utterance".to_string()));
        }

        if let Err(e) = self.synthesizer.cancel().await {
            warn!(target: "playback", "Cancel before speak failed: {}", e);
        }

        let utterance = Utterance {
            id: next_utterance_id(),
            text: text.to_string(),
            settings: self.settings.clone(),
        };
        debug!(target: "playback", "Speaking utterance {} ({} chars)", utterance.id, utterance.text.len());
        self.synthesizer.speak(&utterance).await?;
        Ok(utterance.id)
    }

    /// Stop the current utterance without starting a new one.
    pub async fn cancel(&mut self) -> PlaybackResult<()> {
        self.synthesizer.cancel().await
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesizers::scripted::{ScriptedSynthesizer, SynthesizerOp};

    #[tokio::test]
    async fn cancel_precedes_every_speak() {
        let synthesizer = ScriptedSynthesizer::new();
        let log = synthesizer.log_handle();
        let mut controller =
            PlaybackController::new(Box::new(synthesizer), VoiceSettings::default());

        controller.say("first question").await.unwrap();
        controller.say("second question").await.unwrap();

        let ops = log.lock().ops.clone();
        assert_eq!(
            ops,
            vec![
                SynthesizerOp::Cancelled,
                SynthesizerOp::Spoke("first question".to_string()),
                SynthesizerOp::Cancelled,
                SynthesizerOp::Spoke("second question".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_touching_backend() {
        let synthesizer = ScriptedSynthesizer::new();
        let log = synthesizer.log_handle();
        let mut controller =
            PlaybackController::new(Box::new(synthesizer), VoiceSettings::default());

        assert!(controller.say("   ").await.is_err());
        assert!(log.lock().ops.is_empty());
    }

    #[tokio::test]
    async fn utterance_ids_increase() {
        let mut controller = PlaybackController::new(
            Box::new(ScriptedSynthesizer::new()),
            VoiceSettings::default(),
        );
        let first = controller.say("one").await.unwrap();
        let second = controller.say("two").await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn speak_failure_propagates() {
        let mut controller = PlaybackController::new(
            Box::new(ScriptedSynthesizer::failing()),
            VoiceSettings::default(),
        );
        assert!(controller.say("doomed").await.is_err());
    }
}
