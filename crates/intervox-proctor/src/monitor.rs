//! Integrity monitor task

use crate::signal::{EnvSignal, IntegrityEvent};
use crate::tracker::SignalTracker;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Task wrapper around [`SignalTracker`]: raw signals in, deduplicated edges
/// out. Holds no session state; whether an edge counts against the candidate
/// is decided downstream.
pub struct IntegrityMonitor {
    signal_rx: mpsc::Receiver<EnvSignal>,
    event_tx: mpsc::Sender<IntegrityEvent>,
    tracker: SignalTracker,
}

impl IntegrityMonitor {
    pub fn new(signal_rx: mpsc::Receiver<EnvSignal>, event_tx: mpsc::Sender<IntegrityEvent>) -> Self {
        Self {
            signal_rx,
            event_tx,
            tracker: SignalTracker::new(),
        }
    }

    pub async fn run(mut self) {
        info!(target: "proctor", "Integrity monitor starting");
        while let Some(signal) = self.signal_rx.recv().await {
            debug!(target: "proctor", "Signal received: {:?}", signal);
            if let Some(event) = self.tracker.process(signal) {
                info!(target: "proctor", "Integrity event: {:?}", event);
                if self.event_tx.send(event).await.is_err() {
                    debug!(target: "proctor", "Event channel closed, stopping");
                    break;
                }
            }
        }
        info!(target: "proctor", "Integrity monitor shutting down");
    }
}
