//! client
//!
//! `OfflineClient`: one store, one HTTP client, one session and one writer
//! guard, wired into the services and reconcilers of every resource.
//!
//! # Single writer
//!
//! All services and reconcilers of a client share the same
//! [`WriterLock`], so an offline create can never interleave with a drain
//! of the same store. Independent clients over the same store are not
//! coordinated; across processes use [`SyncLock`](crate::offline::SyncLock).
//!
//! # Example
//!
//! ```no_run
//! use goalsync::client::OfflineClient;
//! use goalsync::config::Config;
//! use goalsync::model::NewGoal;
//!
//! # tokio_test::block_on(async {
//! let client = OfflineClient::from_config(&Config::load(None).unwrap()).unwrap();
//! let goal = client.goals().create(NewGoal::titled("Correr 5k")).await.unwrap();
//! if goal.id < 0 {
//!     println!("saved offline; run sync later");
//! }
//! let summary = client.sync_all().await;
//! println!("{} synced", summary.succeeded());
//! # });
//! ```

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::api::{ApiError, HttpClient, ReqwestHttp};
use crate::auth::{SessionProvider, StoredSession};
use crate::config::Config;
use crate::model::{Event, Goal};
use crate::offline::{writer_lock, WriterLock};
use crate::service::ResourceService;
use crate::store::{create_store, KeyValueStore, StoreError};
use crate::sync::{DrainReport, Reconciler};

/// Errors building a client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result of draining every queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub goals: DrainReport,
    pub events: DrainReport,
}

impl SyncSummary {
    pub fn succeeded(&self) -> usize {
        self.goals.succeeded + self.events.succeeded
    }

    pub fn failed(&self) -> usize {
        self.goals.failed + self.events.failed
    }
}

/// Pending operation counts per resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingCounts {
    pub goals: usize,
    pub events: usize,
}

impl PendingCounts {
    pub fn total(&self) -> usize {
        self.goals + self.events
    }
}

/// Server reachability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub ok: bool,
    pub url: String,
}

/// Offline-capable client for every resource.
pub struct OfflineClient {
    http: Arc<dyn HttpClient>,
    store: Arc<KeyValueStore>,
    writer: WriterLock,
    goals: ResourceService<Goal>,
    events: ResourceService<Event>,
    goal_sync: Reconciler<Goal>,
    event_sync: Reconciler<Event>,
}

impl std::fmt::Debug for OfflineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineClient")
            .field("base_url", &self.http.base_url())
            .field("store", &self.store)
            .finish()
    }
}

impl OfflineClient {
    /// Wire a client from its parts.
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<KeyValueStore>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        let writer = writer_lock();
        Self {
            goals: ResourceService::new(Arc::clone(&http), Arc::clone(&store), Arc::clone(&session))
                .with_writer(Arc::clone(&writer)),
            events: ResourceService::new(Arc::clone(&http), Arc::clone(&store), session)
                .with_writer(Arc::clone(&writer)),
            goal_sync: Reconciler::new(Arc::clone(&http), Arc::clone(&store))
                .with_writer(Arc::clone(&writer)),
            event_sync: Reconciler::new(Arc::clone(&http), Arc::clone(&store))
                .with_writer(Arc::clone(&writer)),
            http,
            store,
            writer,
        }
    }

    /// Build the store, session and HTTP client described by `config`.
    ///
    /// The session is read from the same store as the offline state.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let store = Arc::new(create_store(
            config.store_provider(),
            config.store_path().map(std::path::Path::to_path_buf),
        )?);
        let session: Arc<dyn SessionProvider> = Arc::new(StoredSession::new(Arc::clone(&store)));
        let http = ReqwestHttp::new(config.api_base_url(), config.timeout())?
            .with_session(Arc::clone(&session));
        Ok(Self::new(Arc::new(http), store, session))
    }

    pub fn goals(&self) -> &ResourceService<Goal> {
        &self.goals
    }

    pub fn events(&self) -> &ResourceService<Event> {
        &self.events
    }

    pub fn goal_reconciler(&self) -> &Reconciler<Goal> {
        &self.goal_sync
    }

    pub fn event_reconciler(&self) -> &Reconciler<Event> {
        &self.event_sync
    }

    /// The underlying store, shared with the session.
    pub fn store(&self) -> &Arc<KeyValueStore> {
        &self.store
    }

    /// A session handle over this client's store.
    pub fn stored_session(&self) -> StoredSession {
        StoredSession::new(Arc::clone(&self.store))
    }

    /// Drain goals, then events.
    pub async fn sync_all(&self) -> SyncSummary {
        SyncSummary {
            goals: self.goal_sync.drain().await,
            events: self.event_sync.drain().await,
        }
    }

    /// Drain goals, then events, through the batch endpoints.
    pub async fn sync_all_batch(&self) -> SyncSummary {
        SyncSummary {
            goals: self.goal_sync.drain_batch().await,
            events: self.event_sync.drain_batch().await,
        }
    }

    pub async fn pending_counts(&self) -> PendingCounts {
        PendingCounts {
            goals: self.goals.queue().len().await,
            events: self.events.queue().len().await,
        }
    }

    /// Discard every pending operation. Returns what was dropped.
    pub async fn clear_pending(&self) -> PendingCounts {
        let _guard = self.writer.lock().await;
        let dropped = PendingCounts {
            goals: self.goals.queue().clear().await,
            events: self.events.queue().clear().await,
        };
        tracing::info!(goals = dropped.goals, events = dropped.events, "pending operations discarded");
        dropped
    }

    /// Probe `/health`, falling back to `/salud`. Never fails.
    pub async fn ping(&self) -> Health {
        let response = match self.http.get("/health").await {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::debug!(code = %e.code(), "/health failed, trying /salud");
                self.http.get("/salud").await
            }
        };
        Health {
            ok: matches!(response, Ok(body) if !body.is_null()),
            url: self.http.base_url().to_string(),
        }
    }
}
