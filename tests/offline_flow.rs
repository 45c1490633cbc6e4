//! End-to-end offline flows: optimistic writes while the server is
//! unreachable, then reconciliation once it is back.
//!
//! Everything runs against `MockHttp` and an in-memory or temp-dir store.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use goalsync::api::mock::{MockHttp, MockReply};
use goalsync::api::HttpMethod;
use goalsync::auth::StaticSession;
use goalsync::client::OfflineClient;
use goalsync::model::{Goal, GoalChanges, NewGoal};
use goalsync::offline::{LocalCache, PendingOp, PendingQueue};
use goalsync::service::ResourceService;
use goalsync::store::{FileBackend, KeyValueStore, MemoryBackend};
use goalsync::sync::{DrainReport, Reconciler};

// =============================================================================
// Fixtures
// =============================================================================

fn memory_store() -> (MemoryBackend, Arc<KeyValueStore>) {
    let backend = MemoryBackend::new();
    let store = Arc::new(KeyValueStore::new(Arc::new(backend.clone())));
    (backend, store)
}

fn goals(http: &MockHttp, store: &Arc<KeyValueStore>) -> ResourceService<Goal> {
    ResourceService::new(
        Arc::new(http.clone()),
        Arc::clone(store),
        Arc::new(StaticSession::new(None, Some(1))),
    )
}

fn reconciler(http: &MockHttp, store: &Arc<KeyValueStore>) -> Reconciler<Goal> {
    Reconciler::new(Arc::new(http.clone()), Arc::clone(store))
}

fn server_goal(id: i64, title: &str) -> serde_json::Value {
    json!({
        "Id": id,
        "PropietarioId": 1,
        "Titulo": title,
        "TipoMeta": "Individual",
        "CreadoEn": "2024-05-01T10:00:00"
    })
}

fn create_op(temp_id: i64, title: &str) -> PendingOp<Goal> {
    PendingOp::Create {
        temp_id,
        payload: NewGoal {
            owner_id: Some(1),
            ..NewGoal::titled(title)
        },
    }
}

// =============================================================================
// Optimistic writes
// =============================================================================

#[tokio::test]
async fn offline_creates_get_distinct_negative_ids() {
    let http = MockHttp::new();
    http.set_offline(true);
    let (_, store) = memory_store();
    let service = goals(&http, &store);

    let mut ids = Vec::new();
    for title in ["A", "B", "C", "D"] {
        ids.push(service.create(NewGoal::titled(title)).await.unwrap().id);
    }

    assert_eq!(ids, vec![-1, -2, -3, -4]);
    assert_eq!(service.queue().len().await, 4);

    let cached = service.cache().get_cached().await.unwrap();
    assert_eq!(cached.len(), 4);
    assert!(cached.iter().all(|g| g.id < 0 && g.owner_id == 1));
}

#[tokio::test]
async fn offline_list_serves_cache_after_online_list() {
    let http = MockHttp::new();
    http.reply(
        HttpMethod::Get,
        "/metas",
        MockReply::ok(json!([server_goal(1, "A"), server_goal(2, "B")])),
    );
    let (_, store) = memory_store();
    let service = goals(&http, &store);

    let online = service.list().await.unwrap();
    http.set_offline(true);
    let offline = service.list().await.unwrap();
    assert_eq!(online, offline);
}

#[tokio::test]
async fn list_replaces_cache_with_latest_response() {
    let http = MockHttp::new();
    http.reply_once(
        HttpMethod::Get,
        "/metas",
        MockReply::ok(json!([server_goal(1, "A"), server_goal(2, "B")])),
    );
    http.reply_once(
        HttpMethod::Get,
        "/metas",
        MockReply::ok(json!([server_goal(3, "C")])),
    );
    let (_, store) = memory_store();
    let service = goals(&http, &store);

    service.list().await.unwrap();
    let second = service.list().await.unwrap();

    let cached = service.cache().get_cached().await.unwrap();
    assert_eq!(cached, second);
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, 3);
}

#[tokio::test]
async fn server_errors_are_not_queued() {
    let http = MockHttp::new();
    http.reply(
        HttpMethod::Post,
        "/metas",
        MockReply::status(500, json!({"detail": "boom"})),
    );
    let (_, store) = memory_store();
    let service = goals(&http, &store);

    let err = service.create(NewGoal::titled("A")).await.unwrap_err();
    assert_eq!(err.code().to_string(), "500");
    assert!(service.queue().is_empty().await);
    assert!(service.cache().get_cached().await.is_none());
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn create_then_update_replays_update_against_real_id() {
    let http = MockHttp::new();
    http.set_offline(true);
    let (_, store) = memory_store();
    let service = goals(&http, &store);

    let created = service.create(NewGoal::titled("A")).await.unwrap();
    assert_eq!(created.id, -1);
    let changes = GoalChanges {
        title: Some("B".into()),
        ..Default::default()
    };
    service.update(created.id, changes).await.unwrap();
    assert_eq!(service.queue().len().await, 2);

    http.set_offline(false);
    http.clear_requests();
    http.reply(
        HttpMethod::Post,
        "/metas",
        MockReply::created(server_goal(10, "A")),
    );
    http.reply(
        HttpMethod::Patch,
        "/metas/10",
        MockReply::ok(server_goal(10, "B")),
    );

    let report = reconciler(&http, &store).drain().await;
    assert_eq!(report, DrainReport { succeeded: 2, failed: 0 });
    assert!(service.queue().is_empty().await);
    assert_eq!(http.request_count(HttpMethod::Patch, "/metas/10"), 1);
    assert_eq!(http.request_count(HttpMethod::Patch, "/metas/-1"), 0);

    let cached = service.cache().get_cached().await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, 10);
    assert_eq!(cached[0].title, "B");
}

#[tokio::test]
async fn conflict_keeps_only_the_failed_operation() {
    let http = MockHttp::new();
    let (_, store) = memory_store();
    let queue: PendingQueue<Goal> = PendingQueue::new(Arc::clone(&store));
    let first = create_op(-1, "A");
    queue.set_queue(&[first.clone(), create_op(-2, "B")]).await;

    http.reply_once(
        HttpMethod::Post,
        "/metas",
        MockReply::status(409, json!({"detail": "Duplicado"})),
    );
    http.reply_once(
        HttpMethod::Post,
        "/metas",
        MockReply::created(server_goal(11, "B")),
    );

    let report = reconciler(&http, &store).drain().await;
    assert_eq!(report, DrainReport { succeeded: 1, failed: 1 });
    assert_eq!(queue.get_queue().await, vec![first]);
}

#[tokio::test]
async fn single_create_is_remapped_to_server_id() {
    let http = MockHttp::new();
    let (_, store) = memory_store();
    let cache: LocalCache<Goal> = LocalCache::new(Arc::clone(&store));
    let queue: PendingQueue<Goal> = PendingQueue::new(Arc::clone(&store));

    http.set_offline(true);
    goals(&http, &store).create(NewGoal::titled("A")).await.unwrap();
    assert_eq!(queue.get_queue().await[0].temp_id(), Some(-1));

    http.set_offline(false);
    http.reply(
        HttpMethod::Post,
        "/metas",
        MockReply::created(server_goal(10, "A")),
    );

    let report = reconciler(&http, &store).drain().await;
    assert_eq!(report, DrainReport { succeeded: 1, failed: 0 });
    assert_eq!(queue.len().await, 0);
    let cached = cache.get_cached().await.unwrap();
    assert_eq!(cached[0].id, 10);
    assert_eq!(cached[0].title, "A");
}

#[tokio::test]
async fn timeout_keeps_operation_in_original_form() {
    let http = MockHttp::new();
    let (_, store) = memory_store();
    let queue: PendingQueue<Goal> = PendingQueue::new(Arc::clone(&store));
    let first = create_op(-1, "A");
    queue.set_queue(&[first.clone(), create_op(-2, "B")]).await;

    http.reply_once(HttpMethod::Post, "/metas", MockReply::Timeout);
    http.reply_once(
        HttpMethod::Post,
        "/metas",
        MockReply::created(server_goal(12, "B")),
    );

    let report = reconciler(&http, &store).drain().await;
    assert_eq!(report, DrainReport { succeeded: 1, failed: 1 });
    assert_eq!(queue.get_queue().await, vec![first]);
}

#[tokio::test]
async fn failed_operations_are_retried_by_the_next_drain() {
    let http = MockHttp::new();
    http.set_offline(true);
    let (_, store) = memory_store();
    let service = goals(&http, &store);
    service.create(NewGoal::titled("A")).await.unwrap();

    http.clear_requests();
    let sync = reconciler(&http, &store);
    assert_eq!(sync.drain().await, DrainReport { succeeded: 0, failed: 1 });
    assert_eq!(service.queue().len().await, 1);

    http.set_offline(false);
    http.reply(
        HttpMethod::Post,
        "/metas",
        MockReply::created(server_goal(10, "A")),
    );
    assert_eq!(sync.drain().await, DrainReport { succeeded: 1, failed: 0 });
    assert_eq!(sync.drain().await, DrainReport::default());
    assert_eq!(http.request_count(HttpMethod::Post, "/metas"), 2);
}

#[tokio::test]
async fn batch_drain_applies_server_mappings() {
    let http = MockHttp::new();
    http.set_offline(true);
    let (_, store) = memory_store();
    let service = goals(&http, &store);
    service.create(NewGoal::titled("A")).await.unwrap();
    service.create(NewGoal::titled("B")).await.unwrap();

    http.set_offline(false);
    http.reply(
        HttpMethod::Post,
        "/sync/metas",
        MockReply::ok(json!({
            "results": [
                {"index": 0, "kind": "create", "ok": true, "id": 20, "tempId": -1},
                {"index": 1, "kind": "create", "ok": false, "tempId": -2, "error": "invalid"}
            ],
            "mappings": {"-1": 20}
        })),
    );

    let report = reconciler(&http, &store).drain_batch().await;
    assert_eq!(report, DrainReport { succeeded: 1, failed: 1 });

    let remaining = service.queue().get_queue().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].temp_id(), Some(-2));

    let ids: Vec<i64> = service
        .cache()
        .get_cached()
        .await
        .unwrap()
        .iter()
        .map(|g| g.id)
        .collect();
    assert!(ids.contains(&20));
    assert!(ids.contains(&-2));
}

// =============================================================================
// Durability
// =============================================================================

#[tokio::test]
async fn queue_survives_restart_on_shared_backend() {
    let (backend, store) = memory_store();
    let ops = vec![
        create_op(-1, "A"),
        PendingOp::Update {
            target_id: -1,
            payload: GoalChanges {
                title: Some("B".into()),
                ..Default::default()
            },
        },
    ];
    PendingQueue::<Goal>::new(store).set_queue(&ops).await;

    let reopened = Arc::new(KeyValueStore::new(Arc::new(backend)));
    assert_eq!(PendingQueue::<Goal>::new(reopened).get_queue().await, ops);
}

#[tokio::test]
async fn offline_state_survives_restart_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.json");
    let http = MockHttp::new();
    http.set_offline(true);

    {
        let store = Arc::new(KeyValueStore::new(Arc::new(FileBackend::with_path(
            path.clone(),
        ))));
        goals(&http, &store).create(NewGoal::titled("A")).await.unwrap();
    }

    let store = Arc::new(KeyValueStore::new(Arc::new(FileBackend::with_path(path))));
    let service = goals(&http, &store);
    assert_eq!(service.queue().len().await, 1);
    assert_eq!(service.cache().get_cached().await.unwrap()[0].id, -1);

    // Ids keep counting down across restarts.
    assert_eq!(service.create(NewGoal::titled("B")).await.unwrap().id, -2);
}

// =============================================================================
// Facade
// =============================================================================

#[tokio::test]
async fn client_syncs_goals_and_events() {
    let http = MockHttp::new();
    let (_, store) = memory_store();
    let client = OfflineClient::new(
        Arc::new(http.clone()),
        store,
        Arc::new(StaticSession::new(Some("t".into()), Some(1))),
    );

    http.set_offline(true);
    client.goals().create(NewGoal::titled("A")).await.unwrap();
    assert_eq!(client.pending_counts().await.total(), 1);

    http.set_offline(false);
    http.reply(
        HttpMethod::Post,
        "/metas",
        MockReply::created(server_goal(10, "A")),
    );
    let summary = client.sync_all().await;
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 0);
    assert_eq!(client.pending_counts().await.total(), 0);
}
