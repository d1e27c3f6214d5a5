//! Network module.
//!
//! Contains the Gateway (TCP listener), the per-connection tasks and the
//! Supervisor that polices timeouts and message rates.

mod connection;
mod gateway;
mod supervisor;

pub use connection::Connection;
pub use gateway::Gateway;
pub use supervisor::Supervisor;
