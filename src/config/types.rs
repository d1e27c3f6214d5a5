//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::limits::{LimitsConfig, RateLimitConfig};
use super::oper::OperBlock;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity.
    pub server: ServerConfig,
    /// Listener.
    pub listen: ListenConfig,
    /// Capacity limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Liveness and scheduling intervals.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Inbound message-rate policy.
    #[serde(default)]
    pub rate: RateLimitConfig,
    /// Message of the day.
    #[serde(default)]
    pub motd: MotdConfig,
    /// Operator blocks.
    #[serde(default)]
    pub oper: Vec<OperBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used as the origin of numeric replies.
    pub name: String,
    /// Network name shown in the welcome line.
    #[serde(default = "default_network")]
    pub network: String,
    /// Free-text description for WHOIS and INFO.
    #[serde(default = "default_description")]
    pub description: String,
    /// Shared connection password; when set, clients must PASS first.
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "irc.lircd.local".to_string(),
            network: default_network(),
            description: default_description(),
            password: None,
        }
    }
}

fn default_network() -> String {
    "LircNet".to_string()
}

fn default_description() -> String {
    "lircd chat server".to_string()
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:6667").
    pub address: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([0, 0, 0, 0], 6667)),
        }
    }
}

/// Liveness timeouts and scheduled-task cadence.
///
/// Seconds unless the field name says otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    /// Idle time after which an active client is sent a keepalive PING.
    #[serde(default = "default_ping_interval")]
    pub ping: u64,
    /// Idle time after which a client is disconnected ("Ping timeout").
    #[serde(default = "default_ping_timeout")]
    pub timeout: u64,
    /// Time a client has to complete NICK/USER after connecting.
    #[serde(default = "default_login_timeout")]
    pub login: u64,
    /// Minimum spacing between two evaluations of the same scheduled task.
    #[serde(default = "default_task_interval_ms")]
    pub task_interval_ms: u64,
    /// How often the supervisor looks for scheduled tasks due for evaluation.
    #[serde(default = "default_task_tick_ms")]
    pub task_tick_ms: u64,
}

impl TimeoutsConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login)
    }

    pub fn task_interval(&self) -> Duration {
        Duration::from_millis(self.task_interval_ms)
    }

    pub fn task_tick(&self) -> Duration {
        Duration::from_millis(self.task_tick_ms.max(1))
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            ping: default_ping_interval(),
            timeout: default_ping_timeout(),
            login: default_login_timeout(),
            task_interval_ms: default_task_interval_ms(),
            task_tick_ms: default_task_tick_ms(),
        }
    }
}

fn default_ping_interval() -> u64 {
    90
}

fn default_ping_timeout() -> u64 {
    120
}

fn default_login_timeout() -> u64 {
    30
}

fn default_task_interval_ms() -> u64 {
    350
}

fn default_task_tick_ms() -> u64 {
    100
}

/// Message of the Day (MOTD) configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MotdConfig {
    /// Path to MOTD file (one line per MOTD line).
    pub file: Option<String>,
    /// Inline MOTD lines (used when `file` is not set or unreadable).
    #[serde(default)]
    pub lines: Vec<String>,
}

impl MotdConfig {
    /// Load MOTD lines from file, falling back to the inline lines.
    pub fn load_lines(&self) -> Vec<String> {
        if let Some(ref path) = self.file {
            match std::fs::read_to_string(path) {
                Ok(content) => return content.lines().map(str::to_string).collect(),
                Err(e) => tracing::warn!(%path, error = %e, "Failed to read MOTD file"),
            }
        }
        self.lines.clone()
    }
}
