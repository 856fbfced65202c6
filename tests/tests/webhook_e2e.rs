//! End-to-end tests for the webhook → sessions → aggregation path.
//!
//! POST /api/webhook → SessionsManager → rotate → MockStore. The mock
//! implements the same `StatsStore` trait as the MySQL store, so every
//! production code path except the SQL transport is exercised.

use axum_test::TestServer;
use chrono::{Duration, Utc};
use integration_tests::{fixtures, setup::TestContext};
use stats_core::{minute_floor, Dimension};

#[tokio::test]
async fn batch_of_opens_is_accepted_and_counted() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let events = vec![
        fixtures::play_started("a", "s1", "c1", "u1"),
        fixtures::play_started("b", "s1", "c2", "u2"),
        fixtures::play_started("c", "s2", "c1", "u3"),
    ];
    let response = server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&events).into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["processed"], 3);
    assert_eq!(body["rejected"], 0);

    assert_eq!(ctx.manager.live_len(), 3);
    let counts = ctx.manager.active_counts();
    assert_eq!(counts.total, 3);
    assert_eq!(counts.by_channel.get("c1"), Some(&2));
    assert_eq!(counts.by_server.get("s2"), Some(&1));
}

#[tokio::test]
async fn single_object_body_is_a_one_element_batch() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let response = server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::play_started("solo", "s1", "c1", "u1").to_string().into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["processed"], 1);
    assert_eq!(ctx.manager.live_len(), 1);
}

#[tokio::test]
async fn malformed_json_is_rejected_with_error_object() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let response = server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"].is_string());
    assert_eq!(ctx.manager.live_len(), 0);
}

#[tokio::test]
async fn schema_invalid_event_fails_the_whole_batch() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    // play_closed without closed_at/reason
    let mut bad = fixtures::play_started("a", "s1", "c1", "u1");
    bad["event"] = serde_json::json!("play_closed");
    let events = vec![fixtures::play_started("ok", "s1", "c1", "u1"), bad];

    let response = server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&events).into())
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        ctx.manager.live_len(),
        0,
        "nothing from an invalid batch reaches the manager"
    );
}

#[tokio::test]
async fn duplicate_open_is_rejected_but_batch_succeeds() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let events = vec![
        fixtures::play_started("a", "s1", "c1", "u1"),
        fixtures::play_started("a", "s1", "c1", "u1"),
    ];
    let response = server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&events).into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["rejected"], 1);
    assert_eq!(ctx.manager.live_len(), 1);

    ctx.flush().await;
    let rows = ctx.store.last_rows(Dimension::Global).expect("global rows");
    assert_eq!(rows[0].sessions_started, 1);
}

#[tokio::test]
async fn unknown_close_leaves_counters_untouched() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let events = vec![
        fixtures::play_started("a", "s1", "c1", "u1"),
        fixtures::play_closed("zzz", 1000, 60_000),
    ];
    let response = server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&events).into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["rejected"], 1);
    assert_eq!(ctx.manager.live_len(), 1);

    ctx.flush().await;
    let rows = ctx.store.last_rows(Dimension::Global).expect("global rows");
    assert_eq!(rows[0].sessions_closed, 0);
    assert_eq!(rows[0].total_bytes, 0);
}

#[tokio::test]
async fn two_sessions_one_close_rolls_up_by_channel() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let events = vec![
        fixtures::play_started("a", "s1", "c1", "u1"),
        fixtures::play_started("b", "s1", "c1", "u2"),
    ];
    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&events).into())
        .await
        .assert_status_ok();

    let mut close = fixtures::play_closed("a", 1_000_000, 125_000);
    close["media"] = serde_json::json!("c1");
    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&[close]).into())
        .await
        .assert_status_ok();

    ctx.flush().await;

    let rows = ctx
        .store
        .last_rows(Dimension::Channel)
        .expect("channel rows");
    let c1 = rows
        .iter()
        .find(|r| r.dimension_value == "c1")
        .expect("c1 row");
    assert_eq!(c1.sessions_started, 2);
    assert_eq!(c1.sessions_closed, 1);
    assert_eq!(c1.peak_concurrent, 2);
    assert_eq!(c1.unique_users, 2);
    assert_eq!(c1.total_bytes, 1_000_000);
}

#[tokio::test]
async fn session_spanning_three_minutes_draws_a_flat_line() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let m0 = minute_floor(Utc::now());
    let m1 = m0 + Duration::seconds(60);
    let m2 = m0 + Duration::seconds(120);
    let t0 = Utc::now().timestamp_millis();

    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&[fixtures::play_started_at(
            "a", "s1", "c1", "u1", t0,
        )]).into())
        .await
        .assert_status_ok();
    ctx.flush_at(m0).await;

    // Quiet minute: no events, session still live.
    ctx.flush_at(m1).await;

    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&[fixtures::play_closed_at(
            "a",
            1_000_000,
            t0,
            t0 + 125_000,
        )]).into())
        .await
        .assert_status_ok();
    ctx.flush_at(m2).await;

    let minutes = ctx.store.upserts_for(Dimension::Global);
    assert_eq!(minutes.len(), 3);

    let row_at = |minute| {
        minutes
            .iter()
            .find(|(m, _)| *m == minute)
            .map(|(_, rows)| rows[0].clone())
            .expect("row for minute")
    };

    let first = row_at(m0);
    assert_eq!(first.sessions_started, 1);
    assert_eq!(first.sessions_closed, 0);
    assert_eq!(first.peak_concurrent, 1);
    assert_eq!(first.unique_users, 1);

    let second = row_at(m1);
    assert_eq!(second.sessions_started, 0);
    assert_eq!(second.sessions_closed, 0);
    assert_eq!(second.peak_concurrent, 1);
    assert_eq!(second.unique_users, 0);

    let third = row_at(m2);
    assert_eq!(third.sessions_started, 0);
    assert_eq!(third.sessions_closed, 1);
    assert_eq!(third.peak_concurrent, 1);
    assert_eq!(third.total_bytes, 1_000_000);
    assert_eq!(third.watch_time_seconds, 125);
}

#[tokio::test]
async fn failing_store_drops_the_minute_but_ingest_continues() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&[fixtures::random_open()]).into())
        .await
        .assert_status_ok();

    ctx.store.set_should_fail(true);
    ctx.flush().await;
    assert_eq!(ctx.store.upsert_count(), 0);

    // The process keeps serving; the next minute persists normally.
    ctx.store.set_should_fail(false);
    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&[fixtures::random_open()]).into())
        .await
        .assert_status_ok();
    ctx.flush().await;
    assert!(ctx.store.upsert_count() > 0);
}
