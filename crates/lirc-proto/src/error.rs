//! Error types for the line protocol.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while framing lines off a stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line payload exceeded the configured limit.
    #[error("line too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Observed payload length in bytes.
        actual: usize,
        /// Configured maximum payload length.
        limit: usize,
    },

    /// A line could not be parsed into a message.
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] MessageParseError),
}

/// Errors raised while parsing a single line into a [`crate::Message`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MessageParseError {
    /// The line held nothing but whitespace.
    #[error("empty message")]
    EmptyMessage,

    /// The command token was missing or not an identifier.
    #[error("invalid command in {0:?}")]
    InvalidCommand(String),
}
