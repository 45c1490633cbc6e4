//! api::errors
//!
//! Normalized error type for every call that crosses the network boundary.
//!
//! # Taxonomy
//!
//! - **Network-class** ([`ApiError::Network`], [`ApiError::Timeout`]): no
//!   structured response was received. These, and only these, let the
//!   resource service fall back to the cache or to an optimistic write.
//! - **Status** ([`ApiError::Status`]): the server answered with a non-2xx
//!   code. 4xx is a definite decision and is never retried automatically;
//!   5xx is retryable but never papered over with local writes.
//! - **InvalidResponse**: the server answered 2xx with a body we cannot
//!   decode.
//! - **InvalidRequest**: a body could not be encoded; nothing was sent.
//! - **NotAuthenticated**: a local precondition failed before any request
//!   was made (no session to resolve an owner from).
//!
//! Every variant exposes the same shape through [`ApiError::code`],
//! [`ApiError::message`] and [`ApiError::hint`].

use serde_json::Value;
use thiserror::Error;

const NETWORK_HINT: &str = "Check API_BASE_URL or your connection.";
const TIMEOUT_HINT: &str = "Check your connection or try again.";

/// Symbolic or numeric error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// HTTP status code returned by the server.
    Status(u16),
    /// No response was received.
    Network,
    /// The request exceeded its timeout.
    Timeout,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Status(status) => write!(f, "{}", status),
            ErrorCode::Network => write!(f, "NETWORK"),
            ErrorCode::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// Errors from API operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset, or any other failure where no
    /// response arrived.
    #[error("network error: {message}")]
    Network {
        /// Human-readable description
        message: String,
        /// Optional remediation hint
        hint: Option<String>,
    },

    /// The request timed out.
    #[error("request timed out: {message}")]
    Timeout {
        /// Human-readable description
        message: String,
        /// Optional remediation hint
        hint: Option<String>,
    },

    /// The server returned a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Server-supplied detail, or a default message
        message: String,
        /// Optional remediation hint
        hint: Option<String>,
    },

    /// A success response whose body could not be decoded.
    #[error("invalid response (HTTP {status}): {message}")]
    InvalidResponse {
        /// HTTP status code of the response
        status: u16,
        /// Decoder error
        message: String,
    },

    /// A request body could not be encoded; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No authenticated session was available for an operation that needs one.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),
}

impl ApiError {
    /// Network error with the default hint.
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
            hint: Some(NETWORK_HINT.to_string()),
        }
    }

    /// Timeout error with the default message and hint.
    pub fn timeout() -> Self {
        ApiError::Timeout {
            message: "the request exceeded its time limit".to_string(),
            hint: Some(TIMEOUT_HINT.to_string()),
        }
    }

    /// Build a status error from a response code and its (possibly empty)
    /// JSON body.
    ///
    /// The message is the body's `detail` (FastAPI style) or `message` field
    /// when present; otherwise a default per status class.
    pub fn from_status(status: u16, body: &Value) -> Self {
        let message = detail_text(body).unwrap_or_else(|| default_message(status).to_string());
        let hint = if (500..600).contains(&status) {
            Some("The server failed to process the request; try again later.".to_string())
        } else {
            None
        };
        ApiError::Status {
            status,
            message,
            hint,
        }
    }

    /// The normalized error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Network { .. } => ErrorCode::Network,
            ApiError::Timeout { .. } => ErrorCode::Timeout,
            ApiError::Status { status, .. } => ErrorCode::Status(*status),
            ApiError::InvalidResponse { status, .. } => ErrorCode::Status(*status),
            ApiError::InvalidRequest(_) => ErrorCode::Status(400),
            ApiError::NotAuthenticated(_) => ErrorCode::Status(401),
        }
    }

    /// The human-readable message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message, .. }
            | ApiError::Timeout { message, .. }
            | ApiError::Status { message, .. }
            | ApiError::InvalidResponse { message, .. } => message,
            ApiError::InvalidRequest(message) | ApiError::NotAuthenticated(message) => message,
        }
    }

    /// Optional remediation hint.
    pub fn hint(&self) -> Option<&str> {
        match self {
            ApiError::Network { hint, .. }
            | ApiError::Timeout { hint, .. }
            | ApiError::Status { hint, .. } => hint.as_deref(),
            ApiError::InvalidResponse { .. } | ApiError::InvalidRequest(_) => None,
            ApiError::NotAuthenticated(_) => Some("Log in to resolve the record owner."),
        }
    }

    /// Whether no structured response was received.
    ///
    /// Only these failures may trigger cache fallback or optimistic writes.
    pub fn is_network_class(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::Timeout { .. })
    }

    /// Whether replaying the same request later could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network { .. } | ApiError::Timeout { .. } => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::InvalidResponse { .. }
            | ApiError::InvalidRequest(_)
            | ApiError::NotAuthenticated(_) => false,
        }
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::InvalidResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Extract `detail` or `message` text from an error body.
///
/// FastAPI validation errors carry `detail` as a list of objects with a
/// `msg` field; the first one is used.
fn detail_text(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Array(items)) => {
            if let Some(msg) = items
                .iter()
                .find_map(|item| item.get("msg").and_then(Value::as_str))
            {
                return Some(msg.to_string());
            }
        }
        _ => {}
    }
    body.get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "bad request",
        401 => "invalid or expired session",
        403 => "permission denied",
        404 => "resource not found",
        409 => "data conflict",
        422 => "validation failed",
        500..=599 => "server error",
        _ => "request failed",
    }
}
