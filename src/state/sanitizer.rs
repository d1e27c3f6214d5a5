//! Nickname sanitizing.

use lirc_proto::NickExt;

/// Turns a raw token into a usable identifier, or rejects it.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, raw: &str) -> Option<String>;
}

/// Accepts tokens that are already well-formed nicknames within a length limit.
#[derive(Debug, Clone)]
pub struct NickSanitizer {
    max_len: usize,
}

impl NickSanitizer {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Sanitizer for NickSanitizer {
    fn sanitize(&self, raw: &str) -> Option<String> {
        raw.is_valid_nick_len(self.max_len).then(|| raw.to_string())
    }
}
