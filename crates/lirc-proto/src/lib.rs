//! # lirc-proto
//!
//! Wire-level building blocks for the lircd chat server:
//!
//! - [`Message`] parsing and serialization, including the trailing `:` parameter
//! - [`Prefix`] origins (`server` or `nick!user@host`)
//! - [`Response`] numeric reply codes
//! - [`LineCodec`] framing for tokio (`feature = "tokio"`)
//! - nickname validity, channel-name classification and RFC 1459 case mapping
//!
//! ```rust
//! use lirc_proto::{Message, Prefix};
//!
//! let msg: Message = "PRIVMSG #test :hello there".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.arg(1), Some("hello there"));
//!
//! let echo = msg.with_prefix(Prefix::new_user("alice", "a", "127.0.0.1"));
//! assert_eq!(echo.to_string(), ":alice!a@127.0.0.1 PRIVMSG #test :hello there");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod chan;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod nick;
pub mod prefix;
pub mod response;

pub use casemap::{irc_eq, irc_to_lower};
pub use chan::{ChannelExt, ChannelPrefix};
pub use error::{MessageParseError, ProtocolError};
#[cfg(feature = "tokio")]
pub use line::LineCodec;
pub use message::Message;
pub use nick::NickExt;
pub use prefix::Prefix;
pub use response::Response;

/// Maximum length of a protocol line payload, excluding the CRLF terminator.
pub const MAX_LINE_LEN: usize = 510;
