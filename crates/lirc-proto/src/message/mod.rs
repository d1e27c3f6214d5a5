//! Protocol messages.
//!
//! A message is an optional origin prefix, a command tag and an ordered
//! list of parameters. The last parameter may be a free-text "trailing"
//! parameter, written after a `:` and allowed to contain spaces.

mod parse;
mod serialize;

use crate::prefix::Prefix;

/// A single protocol line, parsed or about to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Origin of the message, if any.
    pub prefix: Option<Prefix>,
    /// Command tag (`PRIVMSG`) or three-digit numeric (`001`).
    pub command: String,
    /// Parameters, the trailing one included.
    pub params: Vec<String>,
    /// Whether the last parameter is written in trailing form.
    pub trailing: bool,
}

impl Message {
    /// Message with plain middle parameters.
    pub fn new<C, I, S>(command: C, params: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
            trailing: false,
        }
    }

    /// Append a free-text trailing parameter.
    pub fn with_trailing(mut self, text: impl Into<String>) -> Self {
        self.params.push(text.into());
        self.trailing = true;
        self
    }

    /// Attach an origin prefix.
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Parameter at `index`, trailing included.
    #[inline]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Number of parameters, trailing included.
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.params.len()
    }

    /// Nickname of the originating user, if the prefix names one.
    pub fn source_nickname(&self) -> Option<&str> {
        match &self.prefix {
            Some(Prefix::Nickname(nick, _, _)) => Some(nick),
            _ => None,
        }
    }

    /// `PRIVMSG <target> :<text>`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", [target]).with_trailing(text)
    }

    /// `NOTICE <target> :<text>`
    pub fn notice(target: &str, text: &str) -> Self {
        Self::new("NOTICE", [target]).with_trailing(text)
    }

    /// `JOIN <channel>`
    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", [channel])
    }

    /// `PART <channel> [:<reason>]`
    pub fn part(channel: &str, reason: Option<&str>) -> Self {
        let msg = Self::new("PART", [channel]);
        match reason {
            Some(reason) => msg.with_trailing(reason),
            None => msg,
        }
    }

    /// `QUIT :<reason>`
    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", None::<String>).with_trailing(reason)
    }

    /// `NICK <nickname>`
    pub fn nick(nickname: &str) -> Self {
        Self::new("NICK", [nickname])
    }

    /// `PING :<token>`
    pub fn ping(token: &str) -> Self {
        Self::new("PING", None::<String>).with_trailing(token)
    }

    /// `PONG <server> :<token>`
    pub fn pong(server: &str, token: &str) -> Self {
        Self::new("PONG", [server]).with_trailing(token)
    }

    /// `ERROR :<text>`
    pub fn error(text: &str) -> Self {
        Self::new("ERROR", None::<String>).with_trailing(text)
    }
}
