//! Core types for speech playback

use serde::{Deserialize, Serialize};

/// Fixed voice parameters applied to every utterance in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// BCP 47 language tag
    pub language: String,
    /// Speaking rate multiplier (1.0 is normal)
    pub rate: f32,
    /// Voice pitch (0.0-2.0, 1.0 is normal)
    pub pitch: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// One utterance handed to a synthesizer
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub settings: VoiceSettings,
}
