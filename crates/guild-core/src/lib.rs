//! Event feed store, action generator, and agent runtime for the Guild Manager.
//!
//! This crate owns all state behind the dashboard: the chat history, the
//! member list with warning counts, and the bounded agent-action log. It
//! also drives the simulated agent that periodically records actions and
//! replies to user messages.
//!
//! # Modules
//!
//! - [`catalog`] -- Action templates, canned replies, and warning texts.
//! - [`clock`] -- [`Clock`] trait with wall-clock and manual implementations.
//! - [`config`] -- Configuration loading from `guild-config.yaml` into
//!   strongly-typed structs.
//! - [`random`] -- [`RandomSource`] trait and [`ScriptedRandom`].
//! - [`runtime`] -- [`AgentRuntime`] owning the periodic and reply tasks.
//! - [`seed`] -- The fixed dataset a fresh store starts with.
//! - [`store`] -- [`EventFeedStore`] and its mutation rules.
//!
//! [`Clock`]: clock::Clock
//! [`RandomSource`]: random::RandomSource
//! [`ScriptedRandom`]: random::ScriptedRandom
//! [`AgentRuntime`]: runtime::AgentRuntime
//! [`EventFeedStore`]: store::EventFeedStore

pub mod catalog;
pub mod clock;
pub mod config;
pub mod random;
pub mod runtime;
pub mod seed;
pub mod store;
