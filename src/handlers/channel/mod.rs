//! Channel-related handlers.
//!
//! Handles JOIN, PART, TOPIC, NAMES, LIST, KICK and INVITE.

mod invite;
mod join;
mod kick;
mod list;
mod names;
mod part;
mod topic;

pub use invite::InviteHandler;
pub use join::JoinHandler;
pub use kick::KickHandler;
pub use list::ListHandler;
pub use names::{NamesHandler, paginate_names, send_names};
pub use part::PartHandler;
pub use topic::TopicHandler;
