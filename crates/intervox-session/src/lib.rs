//! Interview session orchestration for Intervox
//!
//! This crate ties the leaf components together: it owns the session record,
//! drives the start/answer/advance/complete protocol against the backend
//! gateway, routes capture transcripts into the answer buffer, tallies
//! integrity events, and speaks prompts through the playback controller. The
//! host talks to a running session through [`SessionHandle`] and observes it
//! through [`SessionSnapshot`] and the [`SessionEvent`] broadcast.

pub mod config;
mod controller;
pub mod events;
pub mod handle;
pub mod runtime;

pub use config::Settings;
pub use events::SessionEvent;
pub use handle::{SessionHandle, SessionSnapshot};
pub use runtime::{SessionCapabilities, SessionRuntime};
