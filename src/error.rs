//! Error taxonomy shared by the gateway operations and the HTTP layer.

use http::StatusCode;
use thiserror::Error;

/// Failure of a gateway operation
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller supplied no usable input; maps to 400
    #[error("{0}")]
    InvalidInput(String),

    /// Upstream model answered, but not with the JSON shape we need
    #[error("{0}")]
    UpstreamFormat(String),

    /// Network or HTTP-status failure talking to an upstream API
    #[error("{0}")]
    UpstreamTransport(String),

    /// Speech synthesis failed
    #[error("{0}")]
    Synthesis(String),

    /// No usable LLM provider or API key configured
    #[error("LLM integration is not configured")]
    NotConfigured,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn missing_text() -> Self {
        GatewayError::InvalidInput("text required".to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GatewayError::UpstreamTransport(format!("upstream returned {status}: {err}")),
            None => GatewayError::UpstreamTransport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::UpstreamFormat(format!("model returned invalid JSON: {err}"))
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::missing_text().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::UpstreamFormat("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Synthesis("tts".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_json_error_is_upstream_format() {
        let err: GatewayError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, GatewayError::UpstreamFormat(_)));
        assert!(err.to_string().contains("invalid JSON"));
    }
}
