use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Upper bound on how much of an upstream error body is kept for diagnostics
pub const REJECTED_BODY_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid definition reference: {0}")]
    InvalidReference(String),

    #[error("definition not found: {0}")]
    NotFound(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("compute service unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("compute service did not respond within {0:?}")]
    UpstreamTimeout(std::time::Duration),

    #[error("compute service rejected the request ({status}): {body}")]
    UpstreamRejected { status: u16, body: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

/// JSON error body returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
    /// Set when the same request may succeed later (timeouts, outages)
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(kind: &'static str, message: &str) -> Self {
        Self {
            error: message.to_string(),
            kind,
            retryable: false,
            detail: None,
        }
    }
}

impl AppError {
    pub fn rejected(status: u16, body: &str) -> Self {
        AppError::UpstreamRejected {
            status,
            body: truncate_body(body),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidReference(_) => "invalid_reference",
            AppError::NotFound(_) => "not_found",
            AppError::MalformedInput(_) => "malformed_input",
            AppError::UpstreamUnreachable(_) => "upstream_unreachable",
            AppError::UpstreamTimeout(_) => "upstream_timeout",
            AppError::UpstreamRejected { .. } => "upstream_rejected",
            AppError::Io(_) => "io",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidReference(_) | AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // A 4xx from compute means the payload was wrong, relay it.
            AppError::UpstreamRejected { status, .. } => match StatusCode::from_u16(*status) {
                Ok(code) if code.is_client_error() => code,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the client may reasonably retry the same request later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamUnreachable(_) | AppError::UpstreamTimeout(_)
        ) || matches!(self, AppError::UpstreamRejected { status, .. } if *status >= 500)
    }

    /// Render as an HTTP status plus JSON body; `detail` only outside production
    pub fn to_response(&self, production: bool) -> (StatusCode, ErrorResponse) {
        let mut body = ErrorResponse::new(self.kind(), &self.to_string());
        body.retryable = self.is_transient();
        if !production {
            body.detail = Some(format!("{:?}", self));
        }
        (self.status_code(), body)
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= REJECTED_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = REJECTED_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::InvalidReference("../x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x.gh".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::UpstreamTimeout(Duration::from_secs(1)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::UpstreamUnreachable("refused".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::rejected(422, "bad tree").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::rejected(500, "boom").status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_rejected_body_is_truncated() {
        let long = "é".repeat(REJECTED_BODY_LIMIT);
        match AppError::rejected(500, &long) {
            AppError::UpstreamRejected { body, .. } => {
                assert!(body.ends_with("..."));
                assert!(body.len() <= REJECTED_BODY_LIMIT + 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_detail_hidden_in_production() {
        let err = AppError::NotFound("missing.gh".into());

        let (_, body) = err.to_response(true);
        assert!(body.detail.is_none());
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("detail").is_none());
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["retryable"], false);

        let (_, body) = err.to_response(false);
        assert!(body.detail.unwrap().contains("NotFound"));
    }

    #[test]
    fn test_timeout_is_distinguishable_from_rejection() {
        assert!(AppError::UpstreamTimeout(Duration::from_secs(30)).is_transient());
        assert!(!AppError::rejected(400, "bad").is_transient());
        assert!(AppError::rejected(503, "busy").is_transient());
    }
}
