//! Wire types for the interview backend protocol

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spoken when the server does not supply a greeting of its own.
pub const DEFAULT_GREETING: &str = "Welcome to your interview!";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartResponse {
    pub question: String,
    /// Some server builds ship the greeting under a different key or not at
    /// all, so a missing field decodes as empty rather than failing.
    #[serde(default)]
    pub greeting: String,
}

impl StartResponse {
    /// The greeting to speak; empty or absent server greetings fall back to
    /// [`DEFAULT_GREETING`].
    pub fn greeting_or_default(&self) -> &str {
        if self.greeting.trim().is_empty() {
            DEFAULT_GREETING
        } else {
            &self.greeting
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextRequest {
    pub session_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextResponse {
    #[serde(default)]
    pub question: String,
    /// Coaching feedback on the submitted answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Tone assessment of the submitted answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    /// Per-answer rubric scores. The server generates these with a language
    /// model and the shape is not guaranteed, so they stay loosely typed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
}

impl NextResponse {
    /// An empty or whitespace-only question is the completion sentinel.
    pub fn is_completion(&self) -> bool {
        self.question.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabSwitchReport {
    pub session_id: String,
    pub tab_switch_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityMetricsReport {
    pub session_id: String,
    pub tab_switch_count: u32,
    pub fullscreen_used: bool,
    pub interview_duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Per-axis rubric averages over the whole interview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AverageScores {
    pub clarity: f64,
    pub technical_depth: f64,
    pub relevance: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryResponse {
    pub session_id: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
    pub average_score: AverageScores,
    pub recommendation: String,
    #[serde(default)]
    pub created_at: Option<String>,
}
