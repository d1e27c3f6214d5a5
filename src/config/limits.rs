//! Capacity limits and message-rate policy.

use serde::Deserialize;
use std::time::Duration;

/// Capacity limits.
///
/// These bound how much any single client or channel can hold, so one
/// busy peer cannot exhaust the server.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum members per channel (default: 256).
    #[serde(default = "default_max_channel_members")]
    pub max_channel_members: usize,
    /// Maximum channels a single client may be in (default: 64).
    #[serde(default = "default_max_channels_per_client")]
    pub max_channels_per_client: usize,
    /// Maximum nickname length (default: 30).
    #[serde(default = "default_nick_len")]
    pub nick_len: usize,
    /// Parsed messages buffered per client ahead of dispatch (default: 32).
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    /// Outbound lines buffered per client before it is dropped (default: 1024).
    #[serde(default = "default_sendq_capacity")]
    pub sendq_capacity: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_channel_members: default_max_channel_members(),
            max_channels_per_client: default_max_channels_per_client(),
            nick_len: default_nick_len(),
            mailbox_capacity: default_mailbox_capacity(),
            sendq_capacity: default_sendq_capacity(),
        }
    }
}

fn default_max_channel_members() -> usize {
    256
}

fn default_max_channels_per_client() -> usize {
    64
}

fn default_nick_len() -> usize {
    30
}

fn default_mailbox_capacity() -> usize {
    32
}

fn default_sendq_capacity() -> usize {
    1024
}

/// Inbound message-rate policy: at most `message_cap` lines per `window`
/// seconds. Counters reset at the end of every window.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_message_cap")]
    pub message_cap: u32,
    #[serde(default = "default_window")]
    pub window: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window.max(1))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            message_cap: default_message_cap(),
            window: default_window(),
        }
    }
}

fn default_message_cap() -> u32 {
    10
}

fn default_window() -> u64 {
    5
}
