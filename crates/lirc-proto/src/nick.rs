//! Nickname validity.
//!
//! A nickname starts with a letter or one of `` [ ] \ ` ^ _ { | } `` and
//! continues with letters, digits, those specials or `-`.

/// Extension trait for checking whether a string is a usable nickname.
pub trait NickExt {
    /// Valid with the default length limit.
    fn is_valid_nick(&self) -> bool;

    /// Valid with a caller-supplied length limit.
    fn is_valid_nick_len(&self, max_len: usize) -> bool;
}

/// Default maximum nickname length.
pub const DEFAULT_NICK_MAX_LEN: usize = 30;

#[inline]
fn is_special(c: char) -> bool {
    matches!(c, '[' | ']' | '\\' | '`' | '_' | '^' | '{' | '|' | '}')
}

impl NickExt for str {
    fn is_valid_nick(&self) -> bool {
        self.is_valid_nick_len(DEFAULT_NICK_MAX_LEN)
    }

    fn is_valid_nick_len(&self, max_len: usize) -> bool {
        if self.is_empty() || self.len() > max_len {
            return false;
        }

        let mut chars = self.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || is_special(first) => {}
            _ => return false,
        }

        chars.all(|c| c.is_ascii_alphanumeric() || is_special(c) || c == '-')
    }
}
