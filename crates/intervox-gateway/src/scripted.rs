//! Scripted gateway for tests
//!
//! Queues canned outcomes per operation and records every call. Report
//! operations default to success when nothing is queued, so tests only
//! script the calls they care about.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::TurnGateway;
use crate::protocol::{
    NextRequest, NextResponse, SecurityMetricsReport, StartRequest, StartResponse,
    SummaryResponse, TabSwitchReport,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Canned outcome for one gateway call
#[derive(Debug, Clone)]
pub enum ScriptedOutcome<T> {
    Respond(T),
    RespondAfter(Duration, T),
    Fail(GatewayError),
    /// Never settles. Pairs with a deadline race on the caller side.
    Hang,
}

/// One observed gateway call, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Start { session_id: String },
    Next { session_id: String, answer: String },
    TabSwitch { count: u32 },
    SecurityMetrics(SecurityMetricsReport),
    Summary { session_id: String, user_email: String },
}

#[derive(Default)]
struct ScriptedState {
    start_queue: VecDeque<ScriptedOutcome<StartResponse>>,
    next_queue: VecDeque<ScriptedOutcome<NextResponse>>,
    tab_switch_queue: VecDeque<ScriptedOutcome<()>>,
    metrics_queue: VecDeque<ScriptedOutcome<()>>,
    summary_queue: VecDeque<ScriptedOutcome<SummaryResponse>>,
    calls: Vec<GatewayCall>,
}

#[derive(Default)]
pub struct ScriptedGateway {
    state: Mutex<ScriptedState>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_start(&self, outcome: ScriptedOutcome<StartResponse>) {
        self.state.lock().start_queue.push_back(outcome);
    }

    pub fn push_next(&self, outcome: ScriptedOutcome<NextResponse>) {
        self.state.lock().next_queue.push_back(outcome);
    }

    pub fn push_tab_switch(&self, outcome: ScriptedOutcome<()>) {
        self.state.lock().tab_switch_queue.push_back(outcome);
    }

    pub fn push_metrics(&self, outcome: ScriptedOutcome<()>) {
        self.state.lock().metrics_queue.push_back(outcome);
    }

    pub fn push_summary(&self, outcome: ScriptedOutcome<SummaryResponse>) {
        self.state.lock().summary_queue.push_back(outcome);
    }

    /// Everything the gateway was asked to do so far.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    /// Convenience: a start response with both fields set.
    pub fn opening(greeting: &str, question: &str) -> StartResponse {
        StartResponse {
            question: question.to_string(),
            greeting: greeting.to_string(),
        }
    }

    /// Convenience: a next-turn response carrying only a question.
    pub fn question(text: &str) -> NextResponse {
        NextResponse {
            question: text.to_string(),
            feedback: None,
            tone: None,
            score: None,
        }
    }

    /// Convenience: the completion sentinel.
    pub fn completion() -> NextResponse {
        Self::question("")
    }

    async fn settle<T>(outcome: Option<ScriptedOutcome<T>>, operation: &str) -> GatewayResult<T> {
        match outcome {
            Some(ScriptedOutcome::Respond(value)) => Ok(value),
            Some(ScriptedOutcome::RespondAfter(delay, value)) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            Some(ScriptedOutcome::Fail(error)) => Err(error),
            Some(ScriptedOutcome::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(GatewayError::Transport(format!(
                "no scripted response queued for {operation}"
            ))),
        }
    }

    async fn settle_report(
        outcome: Option<ScriptedOutcome<()>>,
    ) -> GatewayResult<()> {
        match outcome {
            // Reports default to success so tests need not script them.
            None => Ok(()),
            other => Self::settle(other, "report").await,
        }
    }
}

#[async_trait]
impl TurnGateway for ScriptedGateway {
    async fn start(&self, request: StartRequest) -> GatewayResult<StartResponse> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(GatewayCall::Start {
                session_id: request.session_id.clone(),
            });
            state.start_queue.pop_front()
        };
        Self::settle(outcome, "start").await
    }

    async fn next(&self, request: NextRequest) -> GatewayResult<NextResponse> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(GatewayCall::Next {
                session_id: request.session_id.clone(),
                answer: request.answer.clone(),
            });
            state.next_queue.pop_front()
        };
        Self::settle(outcome, "next").await
    }

    async fn report_tab_switch(&self, report: TabSwitchReport) -> GatewayResult<()> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(GatewayCall::TabSwitch {
                count: report.tab_switch_count,
            });
            state.tab_switch_queue.pop_front()
        };
        Self::settle_report(outcome).await
    }

    async fn report_security_metrics(&self, report: SecurityMetricsReport) -> GatewayResult<()> {
        let outcome = {
            let mut state = self.state.lock();
            state
                .calls
                .push(GatewayCall::SecurityMetrics(report.clone()));
            state.metrics_queue.pop_front()
        };
        Self::settle_report(outcome).await
    }

    async fn fetch_summary(
        &self,
        session_id: &str,
        user_email: &str,
    ) -> GatewayResult<SummaryResponse> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(GatewayCall::Summary {
                session_id: session_id.to_string(),
                user_email: user_email.to_string(),
            });
            state.summary_queue.pop_front()
        };
        Self::settle(outcome, "summary").await
    }
}
