//! Configuration loading and typed config structures for the Guild Manager.
//!
//! The canonical configuration lives in `guild-config.yaml` in the working
//! directory. Every field has a default matching the dashboard's observed
//! behavior, so an empty or missing file yields a working setup.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range or an override could not be parsed.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Guild Manager configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GuildConfig {
    /// Simulated agent behavior (names, timers, probability).
    #[serde(default)]
    pub agent: AgentConfig,

    /// Feed bounds and derived-view parameters.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Observer API bind address.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GuildConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `GUILD_OBSERVER_HOST` overrides `observer.host`
    /// - `GUILD_OBSERVER_PORT` overrides `observer.port`
    /// - `GUILD_SEED` overrides `agent.seed`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No env overrides applied.
    ///
    /// A document with no content (blank, or only comments) yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if !has_content(yaml) {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides using `lookup` to resolve environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric override does not parse.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GUILD_OBSERVER_HOST") {
            self.observer.host = host;
        }
        if let Some(port) = lookup("GUILD_OBSERVER_PORT") {
            self.observer.port = port.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("GUILD_OBSERVER_PORT={port}: {e}"),
            })?;
        }
        if let Some(seed) = lookup("GUILD_SEED") {
            let seed = seed.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("GUILD_SEED={seed}: {e}"),
            })?;
            self.agent.seed = Some(seed);
        }
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.agent.activity_probability) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "agent.activity_probability must be within 0.0..=1.0, got {}",
                    self.agent.activity_probability
                ),
            });
        }
        if self.agent.activity_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "agent.activity_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.feed.action_log_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "feed.action_log_capacity must be at least 1".to_owned(),
            });
        }
        if self.feed.max_messages == Some(0) {
            return Err(ConfigError::Invalid {
                reason: "feed.max_messages must be at least 1 when set".to_owned(),
            });
        }
        Ok(())
    }
}

/// Simulated agent configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// Sender name used for agent replies.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Sender name used for messages typed in the dashboard.
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Sender name used for system notices.
    #[serde(default = "default_system_name")]
    pub system_name: String,

    /// Real-time milliseconds between periodic activity ticks.
    #[serde(default = "default_activity_interval_ms")]
    pub activity_interval_ms: u64,

    /// Chance (0.0 to 1.0) that a tick records an action.
    #[serde(default = "default_activity_probability")]
    pub activity_probability: f64,

    /// Milliseconds between a user message and the agent reply.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    /// Random seed for reproducible runs. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            user_name: default_user_name(),
            system_name: default_system_name(),
            activity_interval_ms: default_activity_interval_ms(),
            activity_probability: default_activity_probability(),
            reply_delay_ms: default_reply_delay_ms(),
            seed: None,
        }
    }
}

/// Feed bounds and derived-view parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// Maximum retained action-log entries.
    #[serde(default = "default_action_log_capacity")]
    pub action_log_capacity: usize,

    /// Optional cap on retained chat messages. `None` keeps everything.
    #[serde(default)]
    pub max_messages: Option<usize>,

    /// Number of actions shown in the activity panel.
    #[serde(default = "default_activity_view_len")]
    pub activity_view_len: usize,

    /// Members with fewer warnings than this count as active.
    #[serde(default = "default_active_warning_threshold")]
    pub active_warning_threshold: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            action_log_capacity: default_action_log_capacity(),
            max_messages: None,
            activity_view_len: default_activity_view_len(),
            active_warning_threshold: default_active_warning_threshold(),
        }
    }
}

/// Observer API bind address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Host address to bind to.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Whether `yaml` holds anything beyond blank lines, comments, and
/// document markers.
fn has_content(yaml: &str) -> bool {
    yaml.lines().map(str::trim).any(|line| {
        !(line.is_empty() || line.starts_with('#') || line == "---" || line == "...")
    })
}

fn default_agent_name() -> String {
    "Guild Agent".to_owned()
}

fn default_user_name() -> String {
    "You".to_owned()
}

fn default_system_name() -> String {
    "System".to_owned()
}

const fn default_activity_interval_ms() -> u64 {
    8000
}

const fn default_activity_probability() -> f64 {
    0.3
}

const fn default_reply_delay_ms() -> u64 {
    1000
}

const fn default_action_log_capacity() -> usize {
    10
}

const fn default_activity_view_len() -> usize {
    8
}

const fn default_active_warning_threshold() -> u32 {
    2
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GuildConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.name, "Guild Agent");
        assert_eq!(config.agent.activity_interval_ms, 8000);
        assert_eq!(config.agent.reply_delay_ms, 1000);
        assert_eq!(config.feed.action_log_capacity, 10);
        assert_eq!(config.feed.max_messages, None);
        assert_eq!(config.observer.port, 8080);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
agent:
  name: "Moderator"
  user_name: "Me"
  system_name: "Notice"
  activity_interval_ms: 2000
  activity_probability: 0.5
  reply_delay_ms: 250
  seed: 99

feed:
  action_log_capacity: 20
  max_messages: 500
  activity_view_len: 5
  active_warning_threshold: 3

observer:
  host: "127.0.0.1"
  port: 9090

logging:
  level: "debug"
  json: true
"#;

        let config = GuildConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.agent.name, "Moderator");
        assert_eq!(config.agent.seed, Some(99));
        assert_eq!(config.agent.reply_delay_ms, 250);
        assert_eq!(config.feed.action_log_capacity, 20);
        assert_eq!(config.feed.max_messages, Some(500));
        assert_eq!(config.observer.host, "127.0.0.1");
        assert_eq!(config.observer.port, 9090);
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = GuildConfig::parse("agent:\n  seed: 7\n")
            .ok()
            .unwrap_or_default();

        assert_eq!(config.agent.seed, Some(7));
        assert_eq!(config.agent.activity_interval_ms, 8000);
        assert_eq!(config.feed.activity_view_len, 8);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = GuildConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn parse_commented_out_yaml_uses_defaults() {
        let yaml = "# Guild Manager configuration\n---\n# agent:\n#   name: \"Moderator\"\n\n";
        assert_eq!(GuildConfig::parse(yaml).ok(), Some(GuildConfig::default()));
    }

    #[test]
    fn parse_reports_malformed_yaml() {
        let result = GuildConfig::parse("agent: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let mut config = GuildConfig::default();
        config.agent.activity_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut config = GuildConfig::default();
        config.feed.action_log_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = GuildConfig::default();
        config.feed.max_messages = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let env: BTreeMap<&str, &str> = [
            ("GUILD_OBSERVER_HOST", "127.0.0.1"),
            ("GUILD_OBSERVER_PORT", "3000"),
            ("GUILD_SEED", "42"),
        ]
        .into_iter()
        .collect();

        let mut config = GuildConfig::default();
        let result = config.apply_env_overrides(|key| env.get(key).map(|v| (*v).to_owned()));
        assert!(result.is_ok());
        assert_eq!(config.observer.host, "127.0.0.1");
        assert_eq!(config.observer.port, 3000);
        assert_eq!(config.agent.seed, Some(42));
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = GuildConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "GUILD_OBSERVER_PORT").then(|| "not-a-port".to_owned())
        });
        assert!(result.is_err());
        assert_eq!(config.observer.port, 8080);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("guild-config.yaml");
        if path.exists() {
            let config = GuildConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
