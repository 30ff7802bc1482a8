//! Synthesizer implementations

pub mod noop;
pub mod scripted;

#[cfg(feature = "espeak")]
pub mod espeak;

pub use noop::NoopSynthesizer;
pub use scripted::{ScriptedSynthesizer, SynthesizerLog, SynthesizerOp};

#[cfg(feature = "espeak")]
pub use espeak::EspeakSynthesizer;
