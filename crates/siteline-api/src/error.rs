use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::ApiErrorBody;

/// Classification of a non-2xx API response, derived from the observed
/// HTTP status code.
///
/// The kind drives retry decisions: [`ServerError`](Self::ServerError) and
/// [`RateLimited`](Self::RateLimited) are transient, everything else is
/// deterministic and retrying wastes a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 400 -- and any other unexpected non-2xx status outside the set below.
    BadRequest,
    /// 401 -- missing or invalid API key.
    Unauthorized,
    /// 403 -- API key lacks permission for the resource.
    Forbidden,
    /// 404 -- site, device, or client does not exist.
    NotFound,
    /// 409 -- request conflicts with current resource state.
    Conflict,
    /// 429 -- request budget exhausted; may carry a retry-after hint.
    RateLimited,
    /// Any 5xx.
    ServerError,
}

impl ApiErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::BadRequest,
        }
    }

    /// Returns `true` if a request failing with this kind is worth retrying.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::ServerError | Self::RateLimited)
    }
}

/// Structured error from the Network API.
///
/// `status` is always the HTTP status observed on the wire -- the body's
/// `statusCode`/`statusName` fields are kept only as display metadata, since
/// a proxy or load balancer can serve an error body that disagrees with the
/// actual response status.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Observed HTTP status code (ground truth).
    pub status: u16,
    /// `statusName` token from the error body, e.g. `"UNAUTHORIZED"`.
    pub status_name: Option<String>,
    pub message: String,
    /// Server-side timestamp of the failure.
    pub timestamp: Option<DateTime<Utc>>,
    /// Request path echoed back by the server.
    pub request_path: Option<String>,
    /// Correlation token for support escalation. Preserved verbatim.
    pub request_id: Option<String>,
    /// Parsed `Retry-After` header, when the server supplied one.
    pub retry_after: Option<Duration>,
}

impl ApiError {
    /// Normalize a non-2xx response into an [`ApiError`].
    ///
    /// Parses the body as the documented error schema; if the body is absent
    /// or malformed, synthesizes an error from the status line alone.
    pub(crate) fn from_response(
        status: reqwest::StatusCode,
        retry_after: Option<Duration>,
        body: &[u8],
    ) -> Self {
        let code = status.as_u16();
        let parsed = serde_json::from_slice::<ApiErrorBody>(body).ok();

        match parsed {
            Some(b) => Self {
                kind: ApiErrorKind::from_status(code),
                status: code,
                status_name: b.status_name,
                message: b.message.unwrap_or_else(|| status.to_string()),
                timestamp: b.timestamp,
                request_path: b.request_path,
                request_id: b.request_id,
                retry_after,
            },
            None => Self {
                kind: ApiErrorKind::from_status(code),
                status: code,
                status_name: None,
                message: status.to_string(),
                timestamp: None,
                request_path: None,
                request_id: None,
                retry_after,
            },
        }
    }
}

/// Top-level error type for the `siteline-api` crate.
///
/// Covers every failure mode: local validation, transport, API-level
/// rejections, decode failures, and the special cases around retry and
/// non-idempotent actions.
#[derive(Debug, Error)]
pub enum Error {
    /// A required parameter failed local validation. No request was issued.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out before a response was obtained.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Classified non-2xx response from the API.
    #[error("API error (HTTP {}): {}", .0.status, .0.message)]
    Api(ApiError),

    /// 2xx response whose body failed schema validation, with the raw body
    /// for debugging.
    #[error("Deserialization error: {message}")]
    Decode { message: String, body: String },

    /// A non-idempotent call failed in a way that leaves the server-side
    /// outcome unknown. The caller cannot assume the action did not execute.
    #[error("Ambiguous outcome: {message}")]
    AmbiguousOutcome { message: String },

    /// The caller's cancellation signal fired.
    #[error("Operation cancelled")]
    Cancelled,

    /// A transient failure persisted through the whole retry budget.
    /// The final error is preserved unchanged as the source.
    #[error("Retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns `true` if this is a transient failure worth retrying
    /// (for idempotent operations only -- the retry policy enforces that).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api(err) => err.kind.is_transient(),
            _ => false,
        }
    }

    /// The API error classification, if this failure came from a non-2xx
    /// response. Looks through [`RetriesExhausted`](Self::RetriesExhausted).
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api(err) => Some(err.kind),
            Self::RetriesExhausted { source, .. } => source.api_kind(),
            _ => None,
        }
    }

    /// Observed HTTP status code, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::RetriesExhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The server's correlation token, when available. Preserved verbatim
    /// so failures stay traceable against server-side logs.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Api(err) => err.request_id.as_deref(),
            Self::RetriesExhausted { source, .. } => source.request_id(),
            _ => None,
        }
    }

    /// Server-supplied retry-after hint, if any.
    pub(crate) fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api(err) => err.retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> reqwest::StatusCode {
        reqwest::StatusCode::from_u16(code).expect("valid status code")
    }

    #[test]
    fn kind_classification_covers_documented_statuses() {
        assert_eq!(ApiErrorKind::from_status(400), ApiErrorKind::BadRequest);
        assert_eq!(ApiErrorKind::from_status(401), ApiErrorKind::Unauthorized);
        assert_eq!(ApiErrorKind::from_status(403), ApiErrorKind::Forbidden);
        assert_eq!(ApiErrorKind::from_status(404), ApiErrorKind::NotFound);
        assert_eq!(ApiErrorKind::from_status(409), ApiErrorKind::Conflict);
        assert_eq!(ApiErrorKind::from_status(429), ApiErrorKind::RateLimited);
        assert_eq!(ApiErrorKind::from_status(500), ApiErrorKind::ServerError);
        assert_eq!(ApiErrorKind::from_status(503), ApiErrorKind::ServerError);
        // Undocumented client errors are deterministic -- never retried.
        assert_eq!(ApiErrorKind::from_status(422), ApiErrorKind::BadRequest);
    }

    #[test]
    fn error_body_fields_are_preserved() {
        let body = br#"{
            "statusCode": 401,
            "statusName": "UNAUTHORIZED",
            "message": "Missing credentials",
            "timestamp": "2024-05-01T12:00:00Z",
            "requestPath": "/v1/sites",
            "requestId": "req-1234"
        }"#;

        let err = ApiError::from_response(status(401), None, body);

        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
        assert_eq!(err.status, 401);
        assert_eq!(err.status_name.as_deref(), Some("UNAUTHORIZED"));
        assert_eq!(err.message, "Missing credentials");
        assert_eq!(err.request_path.as_deref(), Some("/v1/sites"));
        assert_eq!(err.request_id.as_deref(), Some("req-1234"));
    }

    #[test]
    fn observed_status_wins_over_body_status() {
        // A proxy can serve a stale error body; the wire status is truth.
        let body = br#"{"statusCode": 404, "statusName": "NOT_FOUND", "message": "gone"}"#;

        let err = ApiError::from_response(status(503), None, body);

        assert_eq!(err.status, 503);
        assert_eq!(err.kind, ApiErrorKind::ServerError);
        assert_eq!(err.status_name.as_deref(), Some("NOT_FOUND"));
    }

    #[test]
    fn malformed_body_synthesizes_generic_error() {
        let err = ApiError::from_response(status(500), None, b"<html>oops</html>");

        assert_eq!(err.status, 500);
        assert_eq!(err.kind, ApiErrorKind::ServerError);
        assert!(err.request_id.is_none());
        assert!(!err.message.is_empty());
    }

    #[test]
    fn transience_follows_kind() {
        let transient = Error::Api(ApiError::from_response(status(503), None, b""));
        let deterministic = Error::Api(ApiError::from_response(status(404), None, b""));

        assert!(transient.is_transient());
        assert!(!deterministic.is_transient());
        assert!(Error::Timeout { timeout_secs: 30 }.is_transient());
        assert!(
            !Error::Validation {
                field: "site_id",
                reason: "must not be empty".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn request_id_survives_retry_exhaustion() {
        let body = br#"{"statusCode": 503, "message": "overloaded", "requestId": "req-99"}"#;
        let inner = Error::Api(ApiError::from_response(status(503), None, body));
        let wrapped = Error::RetriesExhausted {
            attempts: 3,
            source: Box::new(inner),
        };

        assert_eq!(wrapped.request_id(), Some("req-99"));
        assert_eq!(wrapped.status(), Some(503));
        assert_eq!(wrapped.api_kind(), Some(ApiErrorKind::ServerError));
    }
}
