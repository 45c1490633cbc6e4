//! auth::session
//!
//! Session providers: where the bearer token and the current user id come
//! from.
//!
//! # Storage
//!
//! [`StoredSession`] keeps both values in the same [`KeyValueStore`] as the
//! offline state:
//!
//! - `AUTH_TOKEN`: the raw bearer token
//! - `AUTH_USER_ID`: the JWT `sub` claim, decimal text
//!
//! The user id is derived once, when the token is stored, so reads never
//! parse tokens.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

use crate::store::KeyValueStore;

/// Store key holding the bearer token.
pub const AUTH_TOKEN_KEY: &str = "AUTH_TOKEN";

/// Store key holding the authenticated user id.
pub const AUTH_USER_ID_KEY: &str = "AUTH_USER_ID";

/// Source of credentials and identity for outgoing requests.
///
/// Both methods are infallible: a session that cannot be read is simply
/// absent.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Bearer token to attach to requests, if any.
    async fn bearer_token(&self) -> Option<String>;

    /// Id of the authenticated user, if known.
    async fn user_id(&self) -> Option<i64>;
}

/// Session persisted in the key-value store.
#[derive(Debug, Clone)]
pub struct StoredSession {
    store: Arc<KeyValueStore>,
}

impl StoredSession {
    pub fn new(store: Arc<KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist a token and the user id carried in its `sub` claim.
    ///
    /// Returns the user id when one could be decoded. A token without a
    /// usable claim is still stored, but any previous user id is removed.
    pub async fn store_session(&self, token: &str) -> Option<i64> {
        self.store.set(AUTH_TOKEN_KEY, token).await;
        match subject_from_jwt(token) {
            Some(user_id) => {
                self.store
                    .set(AUTH_USER_ID_KEY, &user_id.to_string())
                    .await;
                tracing::debug!(user_id, "session stored");
                Some(user_id)
            }
            None => {
                self.store.remove(AUTH_USER_ID_KEY).await;
                tracing::warn!("token has no numeric sub claim; user id unknown");
                None
            }
        }
    }

    /// Remove token and user id.
    pub async fn clear_session(&self) {
        self.store.remove(AUTH_TOKEN_KEY).await;
        self.store.remove(AUTH_USER_ID_KEY).await;
    }

    /// Whether a token is stored.
    pub async fn has_token(&self) -> bool {
        self.bearer_token().await.is_some()
    }
}

#[async_trait]
impl SessionProvider for StoredSession {
    async fn bearer_token(&self) -> Option<String> {
        self.store
            .get(AUTH_TOKEN_KEY)
            .await
            .filter(|t| !t.is_empty())
    }

    async fn user_id(&self) -> Option<i64> {
        self.store
            .get(AUTH_USER_ID_KEY)
            .await
            .and_then(|s| s.trim().parse().ok())
    }
}

/// Fixed session, for tests and one-off scripting.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    token: Option<String>,
    user_id: Option<i64>,
}

impl StaticSession {
    pub fn new(token: Option<String>, user_id: Option<i64>) -> Self {
        Self { token, user_id }
    }

    /// A session with neither token nor user.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }

    async fn user_id(&self) -> Option<i64> {
        self.user_id
    }
}

/// Decode the `sub` claim of a JWT without verifying it.
///
/// Accepts a JSON number or a string of digits.
pub fn subject_from_jwt(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    // Some issuers pad; the URL-safe alphabet is mandatory.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    match claims.get("sub")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
