//! First-settle-wins deadline arbitration
//!
//! A turn request races a local timer. Whichever settles first decides the
//! outcome; when the timer wins, the request is left running detached and its
//! eventual result is logged and discarded. Losing the race is therefore a
//! distinct failure from the transport reporting one.

use crate::error::{GatewayError, GatewayResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

pub async fn race_deadline<T, F>(
    operation: &'static str,
    deadline: Duration,
    future: F,
) -> GatewayResult<T>
where
    T: Send + 'static,
    F: Future<Output = GatewayResult<T>> + Send + 'static,
{
    let started = Instant::now();
    let mut request = tokio::spawn(future);

    tokio::select! {
        result = &mut request => match result {
            Ok(outcome) => outcome,
            Err(e) => Err(GatewayError::Transport(format!(
                "operation={operation} request task failed: {e}"
            ))),
        },
        _ = time::sleep(deadline) => {
            let elapsed = started.elapsed();
            warn!(target: "gateway", "{} exceeded local deadline {:?}, abandoning wait", operation, deadline);
            tokio::spawn(async move {
                match request.await {
                    Ok(Ok(_)) => {
                        debug!(target: "gateway", "{} settled successfully after deadline, discarding", operation)
                    }
                    Ok(Err(e)) => {
                        debug!(target: "gateway", "{} failed after deadline: {}", operation, e)
                    }
                    Err(e) => {
                        debug!(target: "gateway", "{} request task died after deadline: {}", operation, e)
                    }
                }
            });
            Err(GatewayError::DeadlineExceeded { elapsed })
        }
    }
}
