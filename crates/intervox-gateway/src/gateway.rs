//! Turn gateway capability seam

use crate::error::GatewayResult;
use crate::protocol::{
    NextRequest, NextResponse, SecurityMetricsReport, StartRequest, StartResponse,
    SummaryResponse, TabSwitchReport,
};
use async_trait::async_trait;

/// Backend protocol surface the session controller depends on.
///
/// `start`, `next` and `fetch_summary` decode typed responses. The two report
/// operations only confirm delivery; callers treat their failures as
/// best-effort losses.
#[async_trait]
pub trait TurnGateway: Send + Sync {
    async fn start(&self, request: StartRequest) -> GatewayResult<StartResponse>;

    async fn next(&self, request: NextRequest) -> GatewayResult<NextResponse>;

    async fn report_tab_switch(&self, report: TabSwitchReport) -> GatewayResult<()>;

    async fn report_security_metrics(&self, report: SecurityMetricsReport) -> GatewayResult<()>;

    async fn fetch_summary(
        &self,
        session_id: &str,
        user_email: &str,
    ) -> GatewayResult<SummaryResponse>;
}
