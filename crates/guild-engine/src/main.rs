//! Engine binary for the Guild Manager.
//!
//! Wires the feed store, the simulated agent runtime, and the observer
//! API together, then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `guild-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Seed the event feed store
//! 4. Create the random source (seeded from config when set)
//! 5. Start the agent runtime
//! 6. Spawn the observer API server
//! 7. Wait for `Ctrl-C`
//! 8. Stop the runtime and the observer

mod error;

use std::path::Path;
use std::sync::Arc;

use guild_core::clock::SystemClock;
use guild_core::config::{GuildConfig, LoggingConfig};
use guild_core::runtime::{AgentRuntime, RuntimeConfig};
use guild_core::store::{EventFeedStore, FeedSettings};
use guild_observer::startup::spawn_observer;
use guild_observer::{AppState, ServerConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Configuration file read from the working directory.
const CONFIG_PATH: &str = "guild-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging depends on it, so report the source after init.
    let (config, from_file) = load_config(Path::new(CONFIG_PATH))?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("guild-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        agent = config.agent.name,
        activity_interval_ms = config.agent.activity_interval_ms,
        activity_probability = config.agent.activity_probability,
        seed = config.agent.seed,
        "Configuration loaded"
    );

    // 3. Seed the event feed store.
    let settings = FeedSettings::from_config(&config);
    let feed = EventFeedStore::seeded(settings, Arc::new(SystemClock))?.into_shared();
    {
        let stats = feed.read().await.stats();
        info!(
            members = stats.total_members,
            warnings = stats.total_warnings,
            actions = stats.agent_actions,
            "Feed store seeded"
        );
    }

    // 4. Create the random source.
    let rng = config
        .agent
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    // 5. Start the agent runtime.
    let runtime = Arc::new(AgentRuntime::new(
        feed,
        RuntimeConfig::from_config(&config.agent),
        rng,
    ));
    runtime.start().await?;

    // 6. Spawn the observer API server.
    let state = Arc::new(AppState::with_runtime(Arc::clone(&runtime)));
    let (addr, observer) = spawn_observer(&ServerConfig::from(&config.observer), state).await?;
    info!(%addr, "Observer API available");

    // 7. Wait for Ctrl-C.
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| EngineError::Signal {
            message: format!("failed to listen for Ctrl-C: {e}"),
        })?;
    info!("Shutdown requested");

    // 8. Tear down.
    runtime.stop().await;
    observer.abort();

    let stats = runtime.feed().read().await.stats();
    info!(
        members = stats.total_members,
        active_members = stats.active_members,
        warnings = stats.total_warnings,
        actions = stats.agent_actions,
        "guild-engine stopped"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load and validate configuration.
///
/// A missing file yields defaults; environment overrides apply either
/// way. The returned flag is `true` when the file was read.
fn load_config(path: &Path) -> Result<(GuildConfig, bool), EngineError> {
    let (config, from_file) = if path.exists() {
        (GuildConfig::from_file(path)?, true)
    } else {
        let mut config = GuildConfig::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        (config, false)
    };
    config.validate()?;
    Ok((config, from_file))
}
