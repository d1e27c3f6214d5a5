//! Channel names and their visibility class.

/// Leading character of a channel name; selects its visibility class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelPrefix {
    /// `#` network-wide channel.
    Default,
    /// `&` server-local channel.
    Server,
}

impl ChannelPrefix {
    /// The prefix character as written on the wire.
    pub fn as_char(self) -> char {
        match self {
            Self::Default => '#',
            Self::Server => '&',
        }
    }

    /// Split a full channel name into its prefix and bare name.
    ///
    /// Returns `None` when the name does not start with a known prefix or
    /// the remainder is not a valid channel name.
    pub fn split(name: &str) -> Option<(ChannelPrefix, &str)> {
        if !name.is_channel_name() {
            return None;
        }
        let prefix = match name.as_bytes().first() {
            Some(b'#') => Self::Default,
            Some(b'&') => Self::Server,
            _ => return None,
        };
        Some((prefix, &name[1..]))
    }
}

/// Maximum channel name length including the prefix.
pub const MAX_CHANNEL_LEN: usize = 50;

/// Extension trait for checking if a string names a channel.
pub trait ChannelExt {
    /// `#` or `&` followed by at least one character, no spaces, commas,
    /// BEL or other control characters, at most [`MAX_CHANNEL_LEN`] chars.
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        let mut chars = self.chars();
        if !matches!(chars.next(), Some('#' | '&')) {
            return false;
        }
        if self.len() < 2 || self.chars().count() > MAX_CHANNEL_LEN {
            return false;
        }
        chars.all(|c| c != ' ' && c != ',' && !c.is_control())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_known_prefixes() {
        assert_eq!(
            ChannelPrefix::split("#test"),
            Some((ChannelPrefix::Default, "test"))
        );
        assert_eq!(
            ChannelPrefix::split("&local"),
            Some((ChannelPrefix::Server, "local"))
        );
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(ChannelPrefix::split("test"), None);
        assert_eq!(ChannelPrefix::split("#"), None);
        assert_eq!(ChannelPrefix::split("#a b"), None);
        assert_eq!(ChannelPrefix::split("#a,b"), None);
        assert_eq!(ChannelPrefix::split("+modeless"), None);
        assert!(!"#\x07bell".is_channel_name());
    }

    #[test]
    fn enforces_length() {
        let long = format!("#{}", "x".repeat(MAX_CHANNEL_LEN));
        assert!(!long.is_channel_name());
        let fits = format!("#{}", "x".repeat(MAX_CHANNEL_LEN - 1));
        assert!(fits.is_channel_name());
    }
}
