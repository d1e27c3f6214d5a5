//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: the top-level `Config` plus server, listener, timeout and MOTD sections
//! - [`limits`]: capacity limits (`LimitsConfig`) and message-rate policy (`RateLimitConfig`)
//! - [`oper`]: operator credentials (`OperBlock`)

mod limits;
mod oper;
mod types;

pub use limits::{LimitsConfig, RateLimitConfig};
pub use oper::OperBlock;
pub use types::{Config, ConfigError, ListenConfig, MotdConfig, ServerConfig, TimeoutsConfig};
