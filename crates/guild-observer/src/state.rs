//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the shared feed store and, when the engine runs the
//! simulated agent, the [`AgentRuntime`] that drives it.

use std::sync::Arc;

use guild_core::runtime::AgentRuntime;
use guild_core::store::SharedFeed;
use guild_types::{FeedEvent, FeedSnapshot};
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The feed store every handler reads and mutates.
    pub feed: SharedFeed,
    /// The agent runtime (present when the simulated agent is running).
    pub runtime: Option<Arc<AgentRuntime>>,
}

impl AppState {
    /// Create state serving `feed` with no runtime attached.
    ///
    /// User messages are stored but never answered, and the agent
    /// control endpoints return `409 Conflict`.
    pub const fn new(feed: SharedFeed) -> Self {
        Self {
            feed,
            runtime: None,
        }
    }

    /// Create state serving the runtime's feed with the runtime attached.
    pub fn with_runtime(runtime: Arc<AgentRuntime>) -> Self {
        Self {
            feed: Arc::clone(runtime.feed()),
            runtime: Some(runtime),
        }
    }

    /// Subscribe to the store's change notifications.
    pub async fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.feed.read().await.subscribe()
    }

    /// Subscribe and capture the current feed under one read lock.
    ///
    /// Every change not reflected in the snapshot is delivered on the
    /// returned receiver.
    pub async fn subscribe_with_snapshot(
        &self,
    ) -> (broadcast::Receiver<FeedEvent>, FeedSnapshot) {
        let feed = self.feed.read().await;
        (feed.subscribe(), feed.snapshot())
    }
}
