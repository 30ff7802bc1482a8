//! Silent synthesizer for hosts without audio output

use crate::error::PlaybackResult;
use crate::synthesizer::SpeechSynthesizer;
use crate::types::Utterance;
use async_trait::async_trait;

/// A synthesizer that accepts everything and plays nothing.
#[derive(Debug, Clone)]
pub struct NoopSynthesizer;

impl NoopSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for NoopSynthesizer {
    async fn speak(&mut self, _utterance: &Utterance) -> PlaybackResult<()> {
        Ok(())
    }

    async fn cancel(&mut self) -> PlaybackResult<()> {
        Ok(())
    }

    async fn is_available(&self) -> bool {
        true
    }
}
