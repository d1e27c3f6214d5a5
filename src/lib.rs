//! lircd - a line-protocol multi-user chat daemon.
//!
//! The library holds everything but process setup so integration tests can
//! run a server in-process.

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod state;
