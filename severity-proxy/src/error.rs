use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Every way a proxied request can fail. Each maps to a status and `{ "error": ... }` body;
/// upstream response text never appears in it.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid request body")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Azure ML endpoint timed out")]
    Timeout,

    #[error("ML error {status}")]
    Upstream { status: u16 },

    #[error("Failed to reach ML endpoint")]
    Transport(#[from] reqwest::Error),

    #[error("ML endpoint returned invalid JSON")]
    InvalidUpstreamBody(#[source] serde_json::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();

        match std::error::Error::source(&self) {
            Some(source) => tracing::error!(%status, error = %self, %source, "request failed"),
            None => tracing::error!(%status, error = %self, "request failed"),
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_gateway_timeout() {
        assert_eq!(ProxyError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn upstream_failure_is_internal_error_without_detail() {
        let err = ProxyError::Upstream { status: 400 };

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "ML error 400");
    }

    #[test]
    fn invalid_body_hides_parser_detail() {
        let parse = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = ProxyError::InvalidBody(parse);

        assert_eq!(err.to_string(), "Invalid request body");
    }
}
