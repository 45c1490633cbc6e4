//! api::traits
//!
//! The HTTP capability consumed by the resource service and the reconciler.
//!
//! # Design
//!
//! The trait is async because every call is network I/O, and it speaks
//! `serde_json::Value` so it stays object-safe; typed encoding and decoding
//! happen in the callers. Any non-2xx response must come back as
//! [`ApiError::Status`], and any failure where no response arrived as
//! [`ApiError::Network`] or [`ApiError::Timeout`].
//!
//! # Example
//!
//! ```ignore
//! use goalsync::api::HttpClient;
//! use serde_json::json;
//!
//! async fn create(http: &dyn HttpClient) -> Result<(), ApiError> {
//!     let created = http.post("/metas", &json!({"Titulo": "A"})).await?;
//!     println!("server id: {}", created["Id"]);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;

/// HTTP method, used by the mock and by request logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Patch => write!(f, "PATCH"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// HTTP client capability.
///
/// Paths are relative to the client's base URL and start with `/`.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one client can be shared by
/// every service and reconciler behind an `Arc`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Base URL requests are resolved against.
    fn base_url(&self) -> &str;

    /// `GET path`, returning the decoded JSON body.
    async fn get(&self, path: &str) -> Result<Value, ApiError>;

    /// `POST path` with a JSON body, returning the decoded JSON body.
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    /// `PATCH path` with a JSON body, returning the decoded JSON body.
    async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    /// `DELETE path`. An empty response body decodes to `Value::Null`.
    async fn delete(&self, path: &str) -> Result<Value, ApiError>;
}

/// Encode a typed request body.
pub fn encode_body<T: Serialize>(body: &T) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::InvalidRequest(format!("cannot encode request body: {}", e)))
}

/// Decode a success body into a typed value.
pub fn decode_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::InvalidResponse {
        status: 200,
        message: format!("unexpected response shape: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_body_reports_shape_errors() {
        let ok: Vec<i64> = decode_body(json!([1, 2])).unwrap();
        assert_eq!(ok, vec![1, 2]);

        let err = decode_body::<Vec<i64>>(json!({"detail": "x"})).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { status: 200, .. }));
        assert!(!err.is_network_class());
    }

    #[test]
    fn method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
