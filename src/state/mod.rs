//! State management module.
//!
//! Contains the Matrix (shared server state) and the entities it owns.

mod channel;
mod client;
mod dashmap_ext;
mod ids;
mod matrix;
mod sanitizer;
mod task;

pub use channel::{
    Channel, ChannelFlag, ChannelModes, JoinOutcome, Member, MemberRoles, PartOutcome, RoleFlag,
    Topic,
};
pub use client::{Client, ClientState, Session};
pub use dashmap_ext::DashMapExt;
pub use ids::{ClientId, IdAllocator};
pub use matrix::{Matrix, ServerInfo};
pub use sanitizer::{NickSanitizer, Sanitizer};
pub use task::{ScheduledTask, TaskKind, TaskOutcome, TaskValue};
