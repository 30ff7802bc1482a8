//! reqwest-backed turn gateway

use crate::error::{truncate_body, GatewayError, GatewayResult};
use crate::gateway::TurnGateway;
use crate::protocol::{
    NextRequest, NextResponse, SecurityMetricsReport, StartRequest, StartResponse,
    SummaryResponse, TabSwitchReport,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

pub struct HttpTurnGateway {
    client: Client,
    base_url: String,
}

impl HttpTurnGateway {
    /// Build a gateway for the given backend base URL. Trailing slashes are
    /// normalized away so endpoint joins are unambiguous.
    pub fn new(base_url: &str) -> GatewayResult<Self> {
        let client = Client::builder().build().map_err(|error| {
            GatewayError::Transport(format!("failed to initialize http client: {error}"))
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

async fn parse_json_response<T: DeserializeOwned>(
    operation: &str,
    response: reqwest::Response,
) -> GatewayResult<T> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }
    serde_json::from_str(&body).map_err(|error| {
        GatewayError::Decode(format!(
            "operation={operation} invalid json response: {error}"
        ))
    })
}

async fn check_status(response: reqwest::Response) -> GatewayResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

fn map_request_error(operation: &str, error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        return GatewayError::Transport(format!(
            "operation={operation} request timed out in transport"
        ));
    }
    GatewayError::Transport(format!("operation={operation} request failed: {error}"))
}

#[async_trait]
impl TurnGateway for HttpTurnGateway {
    async fn start(&self, request: StartRequest) -> GatewayResult<StartResponse> {
        debug!(target: "gateway", "POST interview/start session_id={}", request.session_id);
        let response = self
            .client
            .post(self.endpoint_url("interview/start"))
            .json(&request)
            .send()
            .await
            .map_err(|error| map_request_error("start", error))?;
        parse_json_response("start", response).await
    }

    async fn next(&self, request: NextRequest) -> GatewayResult<NextResponse> {
        debug!(target: "gateway", "POST interview/next session_id={} answer_chars={}",
            request.session_id, request.answer.len());
        let response = self
            .client
            .post(self.endpoint_url("interview/next"))
            .json(&request)
            .send()
            .await
            .map_err(|error| map_request_error("next", error))?;
        parse_json_response("next", response).await
    }

    async fn report_tab_switch(&self, report: TabSwitchReport) -> GatewayResult<()> {
        debug!(target: "gateway", "POST interview/tab-switch count={}", report.tab_switch_count);
        let response = self
            .client
            .post(self.endpoint_url("interview/tab-switch"))
            .json(&report)
            .send()
            .await
            .map_err(|error| map_request_error("tab-switch", error))?;
        check_status(response).await
    }

    async fn report_security_metrics(&self, report: SecurityMetricsReport) -> GatewayResult<()> {
        debug!(target: "gateway", "POST interview/security-metrics count={} fullscreen={} minutes={}",
            report.tab_switch_count, report.fullscreen_used, report.interview_duration_minutes);
        let response = self
            .client
            .post(self.endpoint_url("interview/security-metrics"))
            .json(&report)
            .send()
            .await
            .map_err(|error| map_request_error("security-metrics", error))?;
        check_status(response).await
    }

    async fn fetch_summary(
        &self,
        session_id: &str,
        user_email: &str,
    ) -> GatewayResult<SummaryResponse> {
        debug!(target: "gateway", "GET interview/summary/{}", session_id);
        let response = self
            .client
            .get(self.endpoint_url(&format!("interview/summary/{session_id}")))
            .query(&[("user_email", user_email)])
            .send()
            .await
            .map_err(|error| map_request_error("summary", error))?;
        parse_json_response("summary", response).await
    }
}
