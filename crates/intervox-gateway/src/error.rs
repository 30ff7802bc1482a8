//! Error types for the turn gateway

use std::time::Duration;
use thiserror::Error;

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The local deadline elapsed before the request settled. The request
    /// keeps running server-side; only the caller stops waiting.
    #[error("No response within {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },

    /// The request could not be sent or the connection failed.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("Invalid response: {0}")]
    Decode(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Trim oversized error bodies before they reach error values and logs.
pub(crate) fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        trimmed.to_string()
    } else {
        let truncated: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let result = truncate_body(&body);
        assert!(result.len() < 600);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn short_bodies_pass_through_trimmed() {
        assert_eq!(truncate_body("  oops  "), "oops");
    }
}
