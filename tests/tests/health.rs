//! Health and introspection endpoint tests.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn health_serves_503_until_recovery_completes() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let response = server.get("/health").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    ctx.mark_ready();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn active_stats_reflect_live_sessions() {
    let ctx = TestContext::new();
    ctx.mark_ready();
    let server = TestServer::new(ctx.router.clone()).expect("test server");

    let events = vec![
        fixtures::play_started("a", "s1", "c1", "u1"),
        fixtures::play_started("b", "s2", "c1", "u2"),
    ];
    server
        .post("/api/webhook")
        .content_type("application/json")
        .bytes(fixtures::array_payload(&events).into())
        .await
        .assert_status_ok();

    let response = server.get("/stats/active").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["by_channel"]["c1"], 2);
    assert_eq!(body["by_server"]["s1"], 1);
    assert_eq!(body["by_country"]["AU"], 2);
    assert_eq!(body["by_protocol"]["hls"], 2);
    assert_eq!(body["by_user_agent_class"]["streaming_server"], 2);
}
