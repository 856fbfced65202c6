//! Snapshot and crash-recovery tests.

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use integration_tests::{fixtures, setup::TestContext};

use aggregator::restore_sessions;
use mysql_store::StatsStore;
use sessions::{SessionsManager, DEFAULT_DELTA_CAPACITY};
use stats_core::Dimension;

#[tokio::test]
async fn snapshot_restart_restore_round_trip() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let events = vec![
        fixtures::play_started("a", "s1", "c1", "u1"),
        fixtures::play_started("b", "s1", "c2", "u2"),
        fixtures::play_started("c", "s2", "c1", "u3"),
    ];
    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&events).into())
        .await
        .assert_status_ok();

    // Snapshot tick, then "restart" into a fresh context sharing the store.
    ctx.snapshot().await;
    assert_eq!(ctx.store.session_rows().len(), 3);

    let restarted = TestContext::new();
    let restored = restore_sessions(
        &Arc::new(SessionsManager::new(DEFAULT_DELTA_CAPACITY)),
        ctx.store.as_ref(),
        None,
    )
    .await
    .expect("recovery");
    assert_eq!(restored, 3);

    // And through the restarted context's own manager for the endpoints.
    restore_sessions(&restarted.manager, ctx.store.as_ref(), None)
        .await
        .expect("recovery");
    restarted.mark_ready();

    let server = TestServer::new(restarted.router.clone()).expect("test server");
    let response = server.get("/stats/active").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], 3);

    // The next minute's peak covers the restored sessions without any new
    // events or sessions_started deltas.
    restarted.flush().await;
    let rows = restarted
        .store
        .last_rows(Dimension::Global)
        .expect("global rows");
    assert_eq!(rows[0].sessions_started, 0);
    assert!(rows[0].peak_concurrent >= 3);
}

#[tokio::test]
async fn restored_snapshot_matches_the_one_written_before_restart() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&[
            fixtures::play_started("a", "s1", "c1", "u1"),
            fixtures::play_started("b", "s2", "c2", "u2"),
        ]).into())
        .await
        .assert_status_ok();
    ctx.snapshot().await;
    let mut before = ctx.store.session_rows();

    let restarted = TestContext::new();
    restore_sessions(&restarted.manager, ctx.store.as_ref(), None)
        .await
        .expect("recovery");
    restarted.snapshot().await;
    let mut after = restarted.store.session_rows();

    // Byte-identical modulo last_seen_at.
    before.sort_by(|x, y| x.id.cmp(&y.id));
    after.sort_by(|x, y| x.id.cmp(&y.id));
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter_mut().zip(after.iter_mut()) {
        b.last_seen_at = a.last_seen_at;
        assert_eq!(b, a);
    }
}

#[tokio::test]
async fn stale_snapshot_rows_are_discarded() {
    let store = TestContext::new().store.clone();

    let old_ms = (Utc::now() - Duration::hours(48)).timestamp_millis();
    let fresh_ms = Utc::now().timestamp_millis();
    let manager = Arc::new(SessionsManager::new(DEFAULT_DELTA_CAPACITY));
    {
        let seeding = SessionsManager::new(DEFAULT_DELTA_CAPACITY);
        let open = |id: &str, ms: i64| {
            let value = fixtures::play_started_at(id, "s1", "c1", "u1", ms);
            let event: stats_core::StreamEvent = serde_json::from_value(value).unwrap();
            seeding.ingest(&event);
        };
        open("old", old_ms);
        open("fresh", fresh_ms);
        let rows: Vec<mysql_store::SessionRow> = seeding
            .snapshot_live()
            .iter()
            .map(mysql_store::SessionRow::from)
            .collect();
        store.sync_active_sessions(&rows).await.unwrap();
    }

    let restored = restore_sessions(&manager, store.as_ref(), Some(Duration::hours(24)))
        .await
        .expect("recovery");
    assert_eq!(restored, 1);
    assert_eq!(manager.live_len(), 1);
    assert_eq!(manager.snapshot_live()[0].id, "fresh");
}

#[tokio::test]
async fn snapshot_prunes_closed_sessions() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&[
            fixtures::play_started("a", "s1", "c1", "u1"),
            fixtures::play_started("b", "s1", "c1", "u2"),
        ]).into())
        .await
        .assert_status_ok();
    ctx.snapshot().await;
    assert_eq!(ctx.store.session_rows().len(), 2);

    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&[fixtures::play_closed(
            "a", 1000, 60_000,
        )]).into())
        .await
        .assert_status_ok();
    ctx.snapshot().await;

    let rows = ctx.store.session_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "b");
}
