//! Backend turn protocol for Intervox
//!
//! The interview backend speaks HTTP+JSON: start a session, exchange
//! answer-for-question turns, accept best-effort integrity reports, and serve
//! a post-interview summary. This crate holds the wire types, the
//! `TurnGateway` seam the controller depends on, the reqwest implementation,
//! and the deadline race that bounds unbounded server latency locally.

pub mod deadline;
pub mod error;
pub mod gateway;
pub mod http;
pub mod protocol;
pub mod scripted;

pub use deadline::race_deadline;
pub use error::{GatewayError, GatewayResult};
pub use gateway::TurnGateway;
pub use http::HttpTurnGateway;
pub use protocol::{
    AverageScores, NextRequest, NextResponse, SecurityMetricsReport, StartRequest, StartResponse,
    SummaryResponse, TabSwitchReport, TranscriptEntry, DEFAULT_GREETING,
};
pub use scripted::{GatewayCall, ScriptedGateway, ScriptedOutcome};
