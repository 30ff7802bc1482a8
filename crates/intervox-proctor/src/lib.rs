//! Environment integrity monitoring for Intervox
//!
//! Hosts feed raw visibility and fullscreen signals, possibly several times
//! per real change when vendor-prefixed sources fire alongside the standard
//! one. This crate folds them into effective state and emits one event per
//! actual edge. Counting and session gating belong to the consumer.

pub mod monitor;
pub mod signal;
pub mod tracker;

pub use monitor::IntegrityMonitor;
pub use signal::{EnvSignal, IntegrityEvent, SignalSource};
pub use tracker::SignalTracker;
