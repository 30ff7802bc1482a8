//! Recording synthesizer for tests

use crate::error::{PlaybackError, PlaybackResult};
use crate::synthesizer::SpeechSynthesizer;
use crate::types::Utterance;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// One recorded synthesizer call
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesizerOp {
    Spoke(String),
    Cancelled,
}

/// Ordered record of everything the synthesizer was asked to do
#[derive(Debug, Clone, Default)]
pub struct SynthesizerLog {
    pub ops: Vec<SynthesizerOp>,
}

impl SynthesizerLog {
    /// Just the spoken texts, in order
    pub fn spoken(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SynthesizerOp::Spoke(text) => Some(text.clone()),
                SynthesizerOp::Cancelled => None,
            })
            .collect()
    }

    pub fn cancels(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SynthesizerOp::Cancelled))
            .count()
    }
}

/// Records every call for later assertions.
pub struct ScriptedSynthesizer {
    log: Arc<Mutex<SynthesizerLog>>,
    fail_speak: bool,
}

impl ScriptedSynthesizer {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(SynthesizerLog::default())),
            fail_speak: false,
        }
    }

    /// Every speak call fails.
    pub fn failing() -> Self {
        Self {
            fail_speak: true,
            ..Self::new()
        }
    }

    /// Shared log handle, valid after the synthesizer is boxed away.
    pub fn log_handle(&self) -> Arc<Mutex<SynthesizerLog>> {
        self.log.clone()
    }
}

impl Default for ScriptedSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn speak(&mut self, utterance: &Utterance) -> PlaybackResult<()> {
        if self.fail_speak {
            return Err(PlaybackError::SynthesisError(
                "scripted speak failure".to_string(),
            ));
        }
        self.log
            .lock()
            .ops
            .push(SynthesizerOp::Spoke(utterance.text.clone()));
        Ok(())
    }

    async fn cancel(&mut self) -> PlaybackResult<()> {
        self.log.lock().ops.push(SynthesizerOp::Cancelled);
        Ok(())
    }

    async fn is_available(&self) -> bool {
        true
    }
}
