//! api::http
//!
//! `HttpClient` implementation over `reqwest`.
//!
//! # Authentication
//!
//! When a [`SessionProvider`] is attached, its bearer token is read on every
//! request and sent as `Authorization: Bearer <token>`. Requests without a
//! token are sent unauthenticated; the server decides what that means.
//!
//! # Error mapping
//!
//! | Failure | Error |
//! |---|---|
//! | request exceeded the configured timeout | [`ApiError::Timeout`] |
//! | connect/DNS/reset, no response | [`ApiError::Network`] |
//! | non-2xx response | [`ApiError::Status`] with `detail` text |
//! | 2xx with undecodable body | [`ApiError::InvalidResponse`] |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use super::errors::ApiError;
use super::traits::{HttpClient, HttpMethod};
use crate::auth::SessionProvider;

/// Default base URL when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Real HTTP client.
#[derive(Clone)]
pub struct ReqwestHttp {
    client: Client,
    base_url: String,
    session: Option<Arc<dyn SessionProvider>>,
}

// Session is opaque; never print tokens.
impl std::fmt::Debug for ReqwestHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestHttp")
            .field("base_url", &self.base_url)
            .field("has_session", &self.session.is_some())
            .finish()
    }
}

impl ReqwestHttp {
    /// Create a client for `base_url` with the given request timeout.
    ///
    /// A trailing slash on the base URL is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the underlying client cannot be built
    /// (TLS backend initialization failure).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("goalsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::network(format!("cannot build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            session: None,
        })
    }

    /// Attach a session provider for bearer authentication.
    pub fn with_session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Value, ApiError> {
        let request = match &self.session {
            Some(session) => match session.bearer_token().await {
                Some(token) => request.bearer_auth(token),
                None => request,
            },
            None => request,
        };

        tracing::debug!(%method, path, "http request");
        let response = request.send().await.map_err(|e| {
            let err = map_transport_error(&e);
            tracing::debug!(%method, path, code = %err.code(), "http request failed");
            err
        })?;

        handle_response(response).await
    }
}

/// Map a `reqwest` failure where no usable response arrived.
fn map_transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout()
    } else {
        ApiError::network(err.to_string())
    }
}

/// Decode a response, turning non-2xx into [`ApiError::Status`].
async fn handle_response(response: Response) -> Result<Value, ApiError> {
    let status = response.status();

    // The status line is a server decision even if the body never arrives.
    if !status.is_success() {
        let body = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
            Err(e) => {
                tracing::debug!(status = status.as_u16(), error = %e, "error body unreadable");
                Value::Null
            }
        };
        return Err(ApiError::from_status(status.as_u16(), &body));
    }

    let bytes = response.bytes().await.map_err(|e| map_transport_error(&e))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse {
        status: status.as_u16(),
        message: format!("failed to parse response: {}", e),
    })
}

#[async_trait]
impl HttpClient for ReqwestHttp {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let request = self.client.get(self.url(path));
        self.send(HttpMethod::Get, path, request).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(HttpMethod::Post, path, request).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let request = self.client.patch(self.url(path)).json(body);
        self.send(HttpMethod::Patch, path, request).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        let request = self.client.delete(self.url(path));
        self.send(HttpMethod::Delete, path, request).await
    }
}
