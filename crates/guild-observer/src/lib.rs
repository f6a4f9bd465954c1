//! Observer API server for the Guild Manager event feed.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/feed`) streaming every store mutation
//!   as a JSON [`FeedEvent`]
//! - **REST endpoints** for reading the chat, member list, action log,
//!   and group stats, and for sending messages and warning members
//! - **Agent control endpoints** (`/api/agent/pause`, `/api/agent/resume`)
//!   when an [`AgentRuntime`] is attached
//! - **Minimal HTML status page** (`GET /`) with the stats grid and links
//!   to the API endpoints
//!
//! # Architecture
//!
//! Handlers share the same [`SharedFeed`] the runtime drives. Reads take
//! the store's read lock; mutations take the write lock and run one store
//! operation. `WebSocket` clients subscribe to the store's broadcast
//! channel with automatic lag handling.
//!
//! [`FeedEvent`]: guild_types::FeedEvent
//! [`AgentRuntime`]: guild_core::runtime::AgentRuntime
//! [`SharedFeed`]: guild_core::store::SharedFeed

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
