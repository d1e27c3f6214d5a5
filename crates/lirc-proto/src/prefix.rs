//! Message origins.

use std::fmt::{self, Display, Formatter};

/// Origin of a message: the server itself, or a user as `nick!user@host`.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Prefix {
    /// Server name.
    ServerName(String),
    /// User origin: (nickname, username, hostname).
    Nickname(String, String, String),
}

impl Prefix {
    /// Build a user prefix from its three components.
    pub fn new_user(nick: &str, user: &str, host: &str) -> Self {
        Prefix::Nickname(nick.to_string(), user.to_string(), host.to_string())
    }

    /// Lenient parse of a raw prefix token (without the leading `:`).
    ///
    /// Anything containing `!` or `@` is a user origin; otherwise the whole
    /// token is taken as a server name.
    pub fn parse(s: &str) -> Self {
        if !s.contains(['!', '@']) {
            return Prefix::ServerName(s.to_string());
        }
        let (nick_user, host) = s.split_once('@').unwrap_or((s, ""));
        let (nick, user) = nick_user.split_once('!').unwrap_or((nick_user, ""));
        Prefix::new_user(nick, user, host)
    }

    /// Nickname or server name, whichever this prefix carries.
    pub fn name(&self) -> &str {
        match self {
            Prefix::ServerName(name) => name,
            Prefix::Nickname(nick, _, _) => nick,
        }
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(nick, user, host) => {
                f.write_str(nick)?;
                if !user.is_empty() {
                    write!(f, "!{}", user)?;
                }
                if !host.is_empty() {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_user_mask() {
        assert_eq!(
            Prefix::parse("alice!a@127.0.0.1"),
            Prefix::new_user("alice", "a", "127.0.0.1")
        );
    }

    #[test]
    fn parses_partial_masks() {
        assert_eq!(Prefix::parse("alice@host"), Prefix::new_user("alice", "", "host"));
        assert_eq!(Prefix::parse("alice!a"), Prefix::new_user("alice", "a", ""));
        assert_eq!(
            Prefix::parse("irc.example.net"),
            Prefix::ServerName("irc.example.net".into())
        );
    }

    #[test]
    fn displays_like_the_wire() {
        assert_eq!(
            Prefix::new_user("bob", "b", "10.0.0.1").to_string(),
            "bob!b@10.0.0.1"
        );
        assert_eq!(Prefix::ServerName("srv".into()).to_string(), "srv");
    }
}
