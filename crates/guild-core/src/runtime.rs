//! Owned background tasks that drive the simulated agent.
//!
//! The [`AgentRuntime`] holds two kinds of Tokio tasks against a
//! [`SharedFeed`]:
//!
//! - **Activity task** -- fires every `activity_interval` (first tick one
//!   interval after start) and runs
//!   [`EventFeedStore::generate_random_action`] unless paused.
//! - **Reply tasks** -- one per accepted user message; sleeps for
//!   `reply_delay`, then runs [`EventFeedStore::generate_agent_reply`].
//!
//! [`AgentRuntime::stop`] aborts both and waits for them to finish, so no
//! task touches the store after it returns. Dropping the runtime aborts
//! them as well.
//!
//! [`EventFeedStore::generate_random_action`]: crate::store::EventFeedStore::generate_random_action
//! [`EventFeedStore::generate_agent_reply`]: crate::store::EventFeedStore::generate_agent_reply

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use guild_types::{AgentStatus, ChatMessage};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::random::RandomSource;
use crate::store::SharedFeed;

/// Errors returned by [`AgentRuntime`] lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The runtime was stopped and cannot be restarted or reused.
    #[error("agent runtime has been stopped")]
    Stopped,
}

/// Timer settings for the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Time between periodic activity ticks.
    pub activity_interval: Duration,
    /// Delay before the agent replies to a user message.
    pub reply_delay: Duration,
}

impl RuntimeConfig {
    /// Derive timer settings from the agent configuration.
    ///
    /// A zero activity interval is raised to one millisecond.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            activity_interval: Duration::from_millis(config.activity_interval_ms.max(1)),
            reply_delay: Duration::from_millis(config.reply_delay_ms),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

type SharedRandom = Arc<Mutex<Box<dyn RandomSource>>>;

/// Lifecycle owner for the activity task and pending reply tasks.
pub struct AgentRuntime {
    feed: SharedFeed,
    config: RuntimeConfig,
    rng: SharedRandom,
    paused: Arc<AtomicBool>,
    stopped: AtomicBool,
    activity: Mutex<Option<JoinHandle<()>>>,
    replies: Mutex<JoinSet<()>>,
}

impl core::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("config", &self.config)
            .field("paused", &self.is_paused())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

impl AgentRuntime {
    /// Create a runtime over `feed`. No tasks run until [`Self::start`].
    pub fn new(feed: SharedFeed, config: RuntimeConfig, rng: impl RandomSource + 'static) -> Self {
        Self {
            feed,
            config,
            rng: Arc::new(Mutex::new(Box::new(rng))),
            paused: Arc::new(AtomicBool::new(false)),
            stopped: AtomicBool::new(false),
            activity: Mutex::new(None),
            replies: Mutex::new(JoinSet::new()),
        }
    }

    /// The store this runtime drives.
    pub const fn feed(&self) -> &SharedFeed {
        &self.feed
    }

    /// The runtime's timer settings.
    pub const fn config(&self) -> RuntimeConfig {
        self.config
    }

    /// Whether the activity task is currently gated off.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Whether [`Self::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Whether the activity task has been spawned and not stopped.
    pub async fn is_running(&self) -> bool {
        self.activity.lock().await.is_some()
    }

    /// Spawn the periodic activity task and mark the agent active.
    ///
    /// Calling `start` on a running runtime is a no-op.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        let mut activity = self.activity.lock().await;
        self.ensure_live()?;
        if activity.is_some() {
            debug!("Agent runtime already started");
            return Ok(());
        }

        let feed = Arc::clone(&self.feed);
        let rng = Arc::clone(&self.rng);
        let paused = Arc::clone(&self.paused);
        let period = self.config.activity_interval;
        *activity = Some(tokio::spawn(run_activity(feed, rng, paused, period)));
        drop(activity);

        if !self.is_paused() {
            self.feed.write().await.set_agent_status(AgentStatus::Active);
        }
        info!(
            interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "Agent runtime started"
        );
        Ok(())
    }

    /// Append a user message and schedule the agent's reply.
    ///
    /// Returns the stored message, or `None` when the input was empty and
    /// nothing was appended (no reply is scheduled in that case).
    pub async fn submit_user_message(
        &self,
        content: &str,
    ) -> Result<Option<ChatMessage>, RuntimeError> {
        self.ensure_live()?;

        let message = {
            let mut feed = self.feed.write().await;
            if feed.send_user_message(content).is_none() {
                return Ok(None);
            }
            feed.messages().last().cloned()
        };

        let feed = Arc::clone(&self.feed);
        let rng = Arc::clone(&self.rng);
        let delay = self.config.reply_delay;
        let prompt = content.to_owned();

        let mut replies = self.replies.lock().await;
        // `stop` flips the flag under this lock, so a reply is either
        // spawned before its shutdown or never spawned at all.
        if self.is_stopped() {
            debug!("Runtime stopped before the reply was scheduled");
            return Ok(message);
        }
        // Reap finished replies so the set does not grow without bound.
        while replies.try_join_next().is_some() {}
        replies.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut rng = rng.lock().await;
            let mut feed = feed.write().await;
            let reply_id = feed.generate_agent_reply(&prompt, rng.as_mut());
            debug!(message_id = %reply_id, "Agent reply delivered");
        });
        debug!(pending = replies.len(), "Agent reply scheduled");

        Ok(message)
    }

    /// Gate off the activity task and mark the agent idle.
    pub async fn pause(&self) -> Result<(), RuntimeError> {
        self.ensure_live()?;
        self.paused.store(true, Ordering::Release);
        self.feed.write().await.set_agent_status(AgentStatus::Idle);
        info!("Agent runtime paused");
        Ok(())
    }

    /// Lift the pause gate. The agent is marked active if the activity
    /// task is running.
    pub async fn resume(&self) -> Result<(), RuntimeError> {
        self.ensure_live()?;
        self.paused.store(false, Ordering::Release);
        if self.is_running().await {
            self.feed.write().await.set_agent_status(AgentStatus::Active);
        }
        info!("Agent runtime resumed");
        Ok(())
    }

    /// Abort the activity task and every pending reply, then mark the
    /// agent idle. Safe to call more than once.
    pub async fn stop(&self) {
        // Lock order: activity, then replies.
        let mut activity = self.activity.lock().await;
        let mut replies = self.replies.lock().await;
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let pending = replies.len();
        replies.shutdown().await;
        drop(replies);

        let handle = activity.take();
        drop(activity);
        if let Some(handle) = handle {
            handle.abort();
            match handle.await {
                Err(e) if !e.is_cancelled() => {
                    warn!(error = %e, "Activity task ended abnormally");
                }
                _ => {}
            }
        }

        self.feed.write().await.set_agent_status(AgentStatus::Idle);
        info!(aborted_replies = pending, "Agent runtime stopped");
    }

    fn ensure_live(&self) -> Result<(), RuntimeError> {
        if self.is_stopped() {
            return Err(RuntimeError::Stopped);
        }
        Ok(())
    }
}

impl Drop for AgentRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.activity.get_mut().take() {
            handle.abort();
        }
        self.replies.get_mut().abort_all();
    }
}

async fn run_activity(
    feed: SharedFeed,
    rng: SharedRandom,
    paused: Arc<AtomicBool>,
    period: Duration,
) {
    let first = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticker = tokio::time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if paused.load(Ordering::Acquire) {
            continue;
        }
        let mut rng = rng.lock().await;
        let mut feed = feed.write().await;
        match feed.generate_random_action(rng.as_mut()) {
            Some(action_id) => debug!(%action_id, "Activity tick recorded an action"),
            None => debug!("Activity tick skipped"),
        }
    }
}
