//! REST API endpoint handlers for the Observer server.
//!
//! All handlers work against the shared feed store in [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/feed` | Full feed snapshot |
//! | `GET` | `/api/messages` | Chat history, oldest first |
//! | `POST` | `/api/messages` | Send a user message |
//! | `GET` | `/api/members` | Member list |
//! | `POST` | `/api/members/:id/warn` | Warn a member |
//! | `GET` | `/api/actions` | Action log, newest first |
//! | `GET` | `/api/stats` | Group stats |
//! | `GET` | `/api/agent` | Agent status |
//! | `POST` | `/api/agent/pause` | Pause the simulated agent |
//! | `POST` | `/api/agent/resume` | Resume the simulated agent |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use guild_core::runtime::AgentRuntime;
use guild_core::store::WarnOutcome;
use guild_types::MemberId;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / query structs
// ---------------------------------------------------------------------------

/// Request body for `POST /api/messages`.
#[derive(Debug, serde::Deserialize)]
pub struct SendMessageRequest {
    /// The text the user typed.
    pub content: String,
}

/// Query parameters for the `GET /api/actions` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct ActionsQuery {
    /// Maximum number of actions to return (default: the whole log).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the stats grid and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let feed = state.feed.read().await;
    let stats = feed.stats();
    let status = format!("{:?}", feed.agent_status()).to_uppercase();
    let agent_name = feed.settings().agent_name.clone();
    let message_count = feed.messages().len();
    drop(feed);

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Guild Manager Observer</title>
    <style>
        body {{
            background: #0b141a;
            color: #e9edef;
            font-family: 'Segoe UI', 'Helvetica Neue', sans-serif;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #25d366; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8696a0; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #111b21;
            border: 1px solid #2a3942;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8696a0; font-size: 0.85rem; }}
        .metric .value {{ color: #25d366; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #53bdeb; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #25d366; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #2a3942; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Guild Manager Observer</h1>
    <p class="subtitle">{agent_name} -- simulated group management agent</p>

    <p>Agent: <span class="status">{status}</span></p>

    <div>
        <div class="metric">
            <div class="label">Total Members</div>
            <div class="value">{total_members}</div>
        </div>
        <div class="metric">
            <div class="label">Active Members</div>
            <div class="value">{active_members}</div>
        </div>
        <div class="metric">
            <div class="label">Warnings</div>
            <div class="value">{total_warnings}</div>
        </div>
        <div class="metric">
            <div class="label">Agent Actions</div>
            <div class="value">{agent_actions}</div>
        </div>
        <div class="metric">
            <div class="label">Messages</div>
            <div class="value">{message_count}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/feed">/api/feed</a> -- Full feed snapshot</li>
        <li>GET <a href="/api/messages">/api/messages</a> -- Chat history</li>
        <li>POST /api/messages -- Send a message (<code>{{"content": ".."}}</code>)</li>
        <li>GET <a href="/api/members">/api/members</a> -- Member list</li>
        <li>POST /api/members/:id/warn -- Warn a member</li>
        <li>GET <a href="/api/actions">/api/actions</a> -- Action log (?limit=N)</li>
        <li>GET <a href="/api/stats">/api/stats</a> -- Group stats</li>
        <li>GET <a href="/api/agent">/api/agent</a> -- Agent status</li>
        <li>POST /api/agent/pause, /api/agent/resume -- Agent control</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/feed</code> -- Live feed event stream</li>
    </ul>
</body>
</html>"#,
        total_members = stats.total_members,
        active_members = stats.active_members,
        total_warnings = stats.total_warnings,
        agent_actions = stats.agent_actions,
    ))
}

// ---------------------------------------------------------------------------
// GET /api/feed -- full snapshot
// ---------------------------------------------------------------------------

/// Return messages, members, actions, agent status, and stats in one body.
pub async fn get_feed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.feed.read().await.snapshot();
    Json(snapshot)
}

// ---------------------------------------------------------------------------
// GET /api/messages -- chat history
// ---------------------------------------------------------------------------

/// List chat messages, oldest first.
pub async fn list_messages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let feed = state.feed.read().await;
    let messages = feed.messages();

    Json(serde_json::json!({
        "count": messages.len(),
        "messages": messages,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/messages -- send a user message
// ---------------------------------------------------------------------------

/// Append a user message and, when a runtime is attached, schedule the
/// agent's reply.
///
/// Returns `201 Created` with the stored message, `400` when the body is
/// not a valid request or the content is empty after trimming, or `409`
/// when the attached runtime has been stopped.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ObserverError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected malformed message body");
        ObserverError::InvalidBody(rejection.body_text())
    })?;

    let message = if let Some(runtime) = &state.runtime {
        runtime.submit_user_message(&body.content).await?
    } else {
        let mut feed = state.feed.write().await;
        feed.send_user_message(&body.content)
            .and_then(|_| feed.messages().last().cloned())
    };

    let message = message.ok_or_else(|| {
        warn!("Rejected empty user message");
        ObserverError::InvalidBody("message content must not be empty".to_owned())
    })?;

    Ok((StatusCode::CREATED, Json(message)))
}

// ---------------------------------------------------------------------------
// GET /api/members -- member list
// ---------------------------------------------------------------------------

/// List members in display order.
pub async fn list_members(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let feed = state.feed.read().await;
    let members = feed.members();

    Json(serde_json::json!({
        "count": members.len(),
        "members": members,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/members/:id/warn -- warn a member
// ---------------------------------------------------------------------------

/// Issue a warning to a member.
///
/// Admins are exempt: the response is `200` with an `admin_exempt`
/// outcome and nothing changes. An unknown ID is `404`.
pub async fn warn_member(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let member_id = MemberId::from(parse_uuid(&id_str)?);

    let outcome = state.feed.write().await.warn_member(member_id);

    match outcome {
        WarnOutcome::UnknownMember { .. } => {
            Err(ObserverError::NotFound(format!("member {member_id}")))
        }
        WarnOutcome::AdminExempt { .. } | WarnOutcome::Warned { .. } => Ok(Json(outcome)),
    }
}

// ---------------------------------------------------------------------------
// GET /api/actions -- action log
// ---------------------------------------------------------------------------

/// List the action log, newest first.
///
/// # Query Parameters
///
/// - `limit`: maximum entries to return (default: all retained entries)
///
/// A `limit` that is not a non-negative integer is `400`.
pub async fn list_actions(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ActionsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ObserverError> {
    let Query(params) =
        params.map_err(|rejection| ObserverError::InvalidQuery(rejection.body_text()))?;

    let feed = state.feed.read().await;
    let actions = feed.recent_actions(params.limit.unwrap_or(usize::MAX));

    Ok(Json(serde_json::json!({
        "count": actions.len(),
        "actions": actions,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/stats -- group stats
// ---------------------------------------------------------------------------

/// Return the derived group stats.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.feed.read().await.stats();
    Json(stats)
}

// ---------------------------------------------------------------------------
// Agent status and control
// ---------------------------------------------------------------------------

/// Return the agent's activity flag and runtime state.
pub async fn get_agent(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.feed.read().await.agent_status();
    let (running, paused) = match &state.runtime {
        Some(runtime) => (runtime.is_running().await, runtime.is_paused()),
        None => (false, false),
    };

    Json(serde_json::json!({
        "status": status,
        "runtime_attached": state.runtime.is_some(),
        "running": running,
        "paused": paused,
    }))
}

/// Pause the simulated agent's periodic activity.
pub async fn pause_agent(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let runtime = require_runtime(&state)?;
    runtime.pause().await?;
    info!("Agent paused via observer API");

    let status = state.feed.read().await.agent_status();
    Ok(Json(serde_json::json!({
        "ok": true,
        "status": status,
    })))
}

/// Resume the simulated agent's periodic activity.
pub async fn resume_agent(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let runtime = require_runtime(&state)?;
    runtime.resume().await?;
    info!("Agent resumed via observer API");

    let status = state.feed.read().await.agent_status();
    Ok(Json(serde_json::json!({
        "ok": true,
        "status": status,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_runtime(state: &AppState) -> Result<&Arc<AgentRuntime>, ObserverError> {
    state
        .runtime
        .as_ref()
        .ok_or_else(|| ObserverError::Conflict("agent runtime not attached".to_owned()))
}

fn parse_uuid(s: &str) -> Result<Uuid, ObserverError> {
    s.parse::<Uuid>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}
