//! api::mock
//!
//! Scripted HTTP client for deterministic testing.
//!
//! # Design
//!
//! Replies are registered per `(method, path)` route. One-shot replies
//! (`reply_once`) are consumed in registration order before the route's
//! standing reply (`reply`) is used. A request with no reply configured fails
//! with a network error, so an unscripted mock behaves like a server that
//! cannot be reached. `set_offline(true)` fails every request that way
//! regardless of routes.
//!
//! Every request is recorded, including ones that fail.
//!
//! # Example
//!
//! ```
//! use goalsync::api::mock::{MockHttp, MockReply};
//! use goalsync::api::{HttpClient, HttpMethod};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let http = MockHttp::new();
//! http.reply(HttpMethod::Get, "/metas", MockReply::ok(json!([])));
//! http.reply_once(HttpMethod::Post, "/metas", MockReply::status(409, json!({"detail": "Duplicado"})));
//!
//! assert_eq!(http.get("/metas").await.unwrap(), json!([]));
//! assert!(http.post("/metas", &json!({})).await.is_err());
//! assert_eq!(http.requests().len(), 2);
//! # });
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::errors::ApiError;
use super::traits::{HttpClient, HttpMethod};

/// A scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Respond with a status and JSON body. Non-2xx becomes `ApiError::Status`.
    Json { status: u16, body: Value },
    /// Fail as if the server were unreachable.
    NetworkError,
    /// Fail as if the request timed out.
    Timeout,
}

impl MockReply {
    /// `200` with a body.
    pub fn ok(body: Value) -> Self {
        MockReply::Json { status: 200, body }
    }

    /// `201` with a body.
    pub fn created(body: Value) -> Self {
        MockReply::Json { status: 201, body }
    }

    /// Arbitrary status with a body.
    pub fn status(status: u16, body: Value) -> Self {
        MockReply::Json { status, body }
    }

    /// `204` with no body.
    pub fn no_content() -> Self {
        MockReply::Json {
            status: 204,
            body: Value::Null,
        }
    }
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct Route {
    once: VecDeque<MockReply>,
    standing: Option<MockReply>,
}

#[derive(Debug, Default)]
struct MockHttpInner {
    routes: HashMap<(HttpMethod, String), Route>,
    offline: bool,
    requests: Vec<RecordedRequest>,
}

/// Mock HTTP client.
///
/// Clones share state, so a test can keep a handle after passing one to a
/// service.
#[derive(Debug, Clone, Default)]
pub struct MockHttp {
    inner: Arc<Mutex<MockHttpInner>>,
}

impl MockHttp {
    /// Create a mock with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockHttpInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the standing reply for a route, used whenever no one-shot reply
    /// is queued.
    pub fn reply(&self, method: HttpMethod, path: &str, reply: MockReply) {
        let mut inner = self.lock();
        inner
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .standing = Some(reply);
    }

    /// Queue a reply consumed by the next matching request.
    pub fn reply_once(&self, method: HttpMethod, path: &str, reply: MockReply) {
        let mut inner = self.lock();
        inner
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .once
            .push_back(reply);
    }

    /// Fail every request with a network error while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Remove all routes. Recorded requests are kept.
    pub fn clear_routes(&self) {
        self.lock().routes.clear();
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of recorded requests for one route.
    pub fn request_count(&self, method: HttpMethod, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut inner = self.lock();
        inner.requests.push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        if inner.offline {
            return Err(ApiError::network("mock: offline"));
        }

        let reply = inner
            .routes
            .get_mut(&(method, path.to_string()))
            .and_then(|route| route.once.pop_front().or_else(|| route.standing.clone()));

        match reply {
            Some(MockReply::Json { status, body }) if (200..300).contains(&status) => Ok(body),
            Some(MockReply::Json { status, body }) => Err(ApiError::from_status(status, &body)),
            Some(MockReply::NetworkError) => Err(ApiError::network("mock: connection refused")),
            Some(MockReply::Timeout) => Err(ApiError::timeout()),
            None => Err(ApiError::network(format!(
                "mock: no reply configured for {} {}",
                method, path
            ))),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    fn base_url(&self) -> &str {
        "http://mock.local"
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.dispatch(HttpMethod::Get, path, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.dispatch(HttpMethod::Post, path, Some(body))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.dispatch(HttpMethod::Patch, path, Some(body))
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.dispatch(HttpMethod::Delete, path, None)
    }
}
