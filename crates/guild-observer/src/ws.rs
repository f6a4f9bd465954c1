//! `WebSocket` handler for real-time feed event streaming.
//!
//! Clients connect to `GET /ws/feed`. The first frame is the current
//! feed state:
//!
//! ```json
//! { "type": "snapshot", "payload": { "messages": [..], "members": [..], ... } }
//! ```
//!
//! Every later frame is a JSON-encoded [`FeedEvent`] describing one change
//! to the store: a message appended, an action recorded, a member warned,
//! or the agent status flipped. The subscription is taken under the same
//! read lock as the snapshot, so no change falls between the two.
//!
//! If a client falls behind, lagged events are skipped and the client
//! resumes from the most recent one.
//!
//! [`FeedEvent`]: guild_types::FeedEvent

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use guild_types::{FeedEvent, FeedSnapshot};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::error::ObserverError;
use crate::state::AppState;

/// Opening frame; shares the `type`/`payload` envelope of [`FeedEvent`].
#[derive(Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
enum InitialFrame<'a> {
    Snapshot(&'a FeedSnapshot),
}

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming feed events.
///
/// # Route
///
/// `GET /ws/feed`
pub async fn ws_feed(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

fn snapshot_frame(snapshot: &FeedSnapshot) -> Result<String, ObserverError> {
    Ok(serde_json::to_string(&InitialFrame::Snapshot(snapshot))?)
}

fn event_frame(event: &FeedEvent) -> Result<String, ObserverError> {
    Ok(serde_json::to_string(event)?)
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let (mut rx, snapshot) = state.subscribe_with_snapshot().await;
    debug!(
        messages = snapshot.messages.len(),
        members = snapshot.members.len(),
        "WebSocket client connected"
    );

    match snapshot_frame(&snapshot) {
        Ok(frame) => {
            if socket.send(Message::Text(frame.into())).await.is_err() {
                debug!("WebSocket client disconnected before the snapshot");
                return;
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to encode feed snapshot");
            return;
        }
    }
    drop(snapshot);

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        let frame = match event_frame(&event) {
                            Ok(frame) => frame,
                            Err(e) => {
                                warn!(error = %e, "Failed to encode feed event");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(frame.into())).await.is_err() {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Feed channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket error");
                        return;
                    }
                    // The stream is one-way; client text and binary frames are ignored.
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use guild_core::clock::SystemClock;
    use guild_core::store::{EventFeedStore, FeedSettings};
    use serde_json::Value;

    use super::*;

    fn seeded_state() -> AppState {
        let feed = EventFeedStore::seeded(FeedSettings::default(), Arc::new(SystemClock))
            .unwrap()
            .into_shared();
        AppState::new(feed)
    }

    #[tokio::test]
    async fn opening_frame_carries_the_whole_feed() {
        let state = seeded_state();
        let (_rx, snapshot) = state.subscribe_with_snapshot().await;

        let frame: Value = serde_json::from_str(&snapshot_frame(&snapshot).unwrap()).unwrap();
        assert_eq!(frame["type"], "snapshot");
        assert_eq!(frame["payload"]["members"].as_array().unwrap().len(), 5);
        assert_eq!(frame["payload"]["messages"].as_array().unwrap().len(), 1);
        assert_eq!(frame["payload"]["agent_status"], "idle");
    }

    #[tokio::test]
    async fn changes_after_the_snapshot_arrive_as_events() {
        let state = seeded_state();
        let (mut rx, snapshot) = state.subscribe_with_snapshot().await;

        state.feed.write().await.send_user_message("hello");

        assert_eq!(snapshot.messages.len(), 1);
        let event = rx.try_recv().unwrap();
        let frame: Value = serde_json::from_str(&event_frame(&event).unwrap()).unwrap();
        assert_eq!(frame["type"], "message_appended");
        assert_eq!(frame["payload"]["content"], "hello");
    }
}
