//! Speech playback abstraction layer for Intervox
//!
//! This crate provides the types and traits for speaking interview prompts
//! aloud: a synthesizer capability seam plus a controller that guarantees at
//! most one audible utterance at a time by cancelling before each speak.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod controller;
pub mod error;
pub mod synthesizer;
pub mod synthesizers;
pub mod types;

pub use controller::PlaybackController;
pub use error::{PlaybackError, PlaybackResult};
pub use synthesizer::SpeechSynthesizer;
pub use types::{Utterance, VoiceSettings};

/// Generates unique utterance IDs
static UTTERANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique utterance ID
pub fn next_utterance_id() -> u64 {
    UTTERANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}
