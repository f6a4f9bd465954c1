//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use guild_core::clock::SystemClock;
use guild_core::random::ScriptedRandom;
use guild_core::runtime::{AgentRuntime, RuntimeConfig};
use guild_core::store::{EventFeedStore, FeedSettings, SharedFeed};
use guild_observer::router::build_router;
use guild_observer::state::AppState;
use guild_types::MemberId;
use serde_json::Value;
use tower::ServiceExt;

fn seeded_feed() -> SharedFeed {
    EventFeedStore::seeded(FeedSettings::default(), Arc::new(SystemClock))
        .unwrap()
        .into_shared()
}

fn make_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(seeded_feed()))
}

fn make_runtime_state() -> (Arc<AppState>, Arc<AgentRuntime>) {
    let runtime = Arc::new(AgentRuntime::new(
        seeded_feed(),
        RuntimeConfig::default(),
        ScriptedRandom::new(),
    ));
    let state = Arc::new(AppState::with_runtime(Arc::clone(&runtime)));
    (state, runtime)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_json(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = build_router(Arc::clone(state))
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post_json(state: &Arc<AppState>, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = build_router(Arc::clone(state))
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_owned()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn warn_uri(id: MemberId) -> String {
    format!("/api/members/{id}/warn")
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let state = make_test_state();
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_get_feed_snapshot() {
    let state = make_test_state();
    let (status, json) = get_json(&state, "/api/feed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    assert_eq!(json["members"].as_array().unwrap().len(), 5);
    assert_eq!(json["actions"].as_array().unwrap().len(), 3);
    assert_eq!(json["agent_status"], "idle");
    assert_eq!(json["stats"]["active_members"], 4);
}

#[tokio::test]
async fn test_list_messages() {
    let state = make_test_state();
    let (status, json) = get_json(&state, "/api/messages").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["messages"][0]["kind"], "agent");
    assert_eq!(json["messages"][0]["sender"], "Guild Agent");
}

#[tokio::test]
async fn test_send_message_without_runtime() {
    let state = make_test_state();
    let (status, json) = post_json(&state, "/api/messages", r#"{"content":"hello"}"#).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["content"], "hello");
    assert_eq!(json["sender"], "You");
    assert_eq!(json["kind"], "user");

    let (_, json) = get_json(&state, "/api/messages").await;
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn test_send_empty_message_rejected() {
    let state = make_test_state();
    let (status, json) = post_json(&state, "/api/messages", r#"{"content":"   "}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("empty"));

    let (_, json) = get_json(&state, "/api/messages").await;
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn test_send_message_malformed_body_is_json_error() {
    let state = make_test_state();

    for body in [r#"{"text":1}"#, r#"{"content":42}"#, "{"] {
        let (status, json) = post_json(&state, "/api/messages", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["status"], 400);
        assert!(!json["error"].as_str().unwrap().is_empty());
    }

    let (_, json) = get_json(&state, "/api/messages").await;
    assert_eq!(json["count"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_send_message_schedules_reply() {
    let (state, _runtime) = make_runtime_state();
    let (status, _) = post_json(&state, "/api/messages", r#"{"content":"hello"}"#).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, json) = get_json(&state, "/api/messages").await;
    assert_eq!(json["count"], 2);

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let (_, json) = get_json(&state, "/api/messages").await;
    assert_eq!(json["count"], 3);
    assert_eq!(json["messages"][2]["kind"], "agent");
    assert_eq!(json["messages"][2]["sender"], "Guild Agent");
}

#[tokio::test]
async fn test_send_message_after_stop_conflicts() {
    let (state, runtime) = make_runtime_state();
    runtime.stop().await;

    let (status, json) = post_json(&state, "/api/messages", r#"{"content":"hello"}"#).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);
}

#[tokio::test]
async fn test_list_members() {
    let state = make_test_state();
    let (status, json) = get_json(&state, "/api/members").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 5);
    assert_eq!(json["members"][0]["name"], "Rahul Kumar");
    assert_eq!(json["members"][0]["role"], "admin");
    assert_eq!(json["members"][2]["warning_count"], 1);
}

#[tokio::test]
async fn test_warn_member() {
    let state = make_test_state();
    let (status, json) = post_json(&state, &warn_uri(MemberId::from_u128(3)), "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "warned");
    assert_eq!(json["warning_count"], 2);

    let (_, json) = get_json(&state, "/api/feed").await;
    assert_eq!(json["members"][2]["warning_count"], 2);
    assert_eq!(json["actions"][0]["kind"], "warning_issued");
    assert_eq!(json["actions"][0]["description"], "Warning issued to Amit Patel");
    let messages = json["messages"].as_array().unwrap();
    let notice = messages.last().unwrap();
    assert_eq!(notice["kind"], "system");
    assert!(notice["content"].as_str().unwrap().contains("Amit Patel"));
}

#[tokio::test]
async fn test_warn_admin_is_exempt() {
    let state = make_test_state();
    let (status, json) = post_json(&state, &warn_uri(MemberId::from_u128(1)), "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "admin_exempt");

    let (_, json) = get_json(&state, "/api/stats").await;
    assert_eq!(json["total_warnings"], 3);
    assert_eq!(json["agent_actions"], 3);
}

#[tokio::test]
async fn test_warn_unknown_member_not_found() {
    let state = make_test_state();
    let (status, json) = post_json(&state, &warn_uri(MemberId::new()), "").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);

    let (_, json) = get_json(&state, "/api/stats").await;
    assert_eq!(json["total_warnings"], 3);
}

#[tokio::test]
async fn test_warn_invalid_uuid() {
    let state = make_test_state();
    let (status, json) = post_json(&state, "/api/members/not-a-uuid/warn", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_list_actions_with_limit() {
    let state = make_test_state();

    let (status, json) = get_json(&state, "/api/actions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    assert_eq!(json["actions"][0]["kind"], "auto_moderation");

    let (_, json) = get_json(&state, "/api/actions?limit=2").await;
    assert_eq!(json["count"], 2);

    let (_, json) = get_json(&state, "/api/actions?limit=100").await;
    assert_eq!(json["count"], 3);
}

#[tokio::test]
async fn test_list_actions_bad_limit_is_json_error() {
    let state = make_test_state();

    for uri in ["/api/actions?limit=abc", "/api/actions?limit=-1"] {
        let (status, json) = get_json(&state, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(json["status"], 400);
        assert!(!json["error"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_get_stats() {
    let state = make_test_state();
    let (status, json) = get_json(&state, "/api/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_members"], 5);
    assert_eq!(json["active_members"], 4);
    assert_eq!(json["total_warnings"], 3);
    assert_eq!(json["agent_actions"], 3);
}

#[tokio::test]
async fn test_agent_control_without_runtime() {
    let state = make_test_state();

    let (status, json) = get_json(&state, "/api/agent").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["runtime_attached"], false);
    assert_eq!(json["status"], "idle");

    let (status, json) = post_json(&state, "/api/agent/pause", "").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);

    let (status, _) = post_json(&state, "/api/agent/resume", "").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_agent_pause_and_resume() {
    let (state, runtime) = make_runtime_state();
    runtime.start().await.unwrap();

    let (_, json) = get_json(&state, "/api/agent").await;
    assert_eq!(json["runtime_attached"], true);
    assert_eq!(json["running"], true);
    assert_eq!(json["paused"], false);
    assert_eq!(json["status"], "active");

    let (status, json) = post_json(&state, "/api/agent/pause", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "idle");
    assert!(runtime.is_paused());

    let (status, json) = post_json(&state, "/api/agent/resume", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "active");
    assert!(!runtime.is_paused());

    runtime.stop().await;
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let state = make_test_state();
    let response = build_router(state)
        .oneshot(Request::get("/api/nothing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutations_reach_feed_subscribers() {
    let state = make_test_state();
    let mut rx = state.subscribe().await;

    post_json(&state, "/api/messages", r#"{"content":"hello"}"#).await;

    let event = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
    assert_eq!(event["type"], "message_appended");
    assert_eq!(event["payload"]["content"], "hello");
}
