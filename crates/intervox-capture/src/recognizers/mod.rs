//! Recognizer implementations

pub mod noop;
pub mod scripted;

pub use noop::NoopRecognizer;
pub use scripted::{ScriptStep, ScriptedRecognizer};
