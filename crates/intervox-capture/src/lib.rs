//! Speech capture abstraction layer for Intervox
//!
//! This crate provides continuous speech capture with silence-based
//! endpointing: a recognizer backend streams recognized chunks, the engine
//! accumulates them, and a capture ends either on an explicit stop or after a
//! configurable silent interval with no new results.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod engine;
pub mod recognizer;
pub mod recognizers;
pub mod types;

pub use engine::{CaptureEngine, CaptureMetrics};
pub use recognizer::{CaptureError, RecognizerEvent, SpeechRecognizer};
pub use types::{CaptureCommand, CaptureConfig, CaptureEvent, VoiceCaptureState};

/// Generates unique capture IDs for log correlation
static CAPTURE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique capture ID
pub fn next_capture_id() -> u64 {
    CAPTURE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}
