//! RFC 1459 case mapping.
//!
//! Nicknames and channel names compare case-insensitively, with `[]\~`
//! folding onto `{}|^` in addition to ASCII letters.

/// Fold a single character.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Fold a string; used for every nickname and channel lookup key.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive equality under RFC 1459 folding.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.chars()
            .zip(b.chars())
            .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_specials_and_letters() {
        assert_eq!(irc_to_lower("#Room[1]"), "#room{1}");
        assert_eq!(irc_to_lower("Nick\\Away~"), "nick|away^");
    }

    #[test]
    fn equality_ignores_case() {
        assert!(irc_eq("Alice", "aLICE"));
        assert!(irc_eq("[x]", "{X}"));
        assert!(!irc_eq("alice", "alicia"));
    }
}
