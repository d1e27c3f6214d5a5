//! Error handling utilities for connection management.
//!
//! Classifies transport read errors and turns handler errors into the
//! reply or disconnect the client should see.

use crate::error::HandlerError;
use crate::state::{Client, Matrix};
use lirc_proto::{Message, ProtocolError};
use tracing::debug;

/// Classification of transport read errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ReadErrorAction {
    /// Line exceeded the payload limit; the peer is dropped.
    LineTooLong,
    /// The socket is broken.
    IoError,
}

/// Classify a transport read error into an actionable category.
pub(super) fn classify_read_error(e: &ProtocolError) -> ReadErrorAction {
    match e {
        ProtocolError::MessageTooLong { .. } => ReadErrorAction::LineTooLong,
        _ => ReadErrorAction::IoError,
    }
}

/// What the dispatch loop does after a handler returned an error.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum ErrorAction {
    /// Send this reply and keep going.
    Reply(Message),
    /// Tear the connection down with this reason.
    Disconnect(String),
    /// Nothing visible to the client.
    Silent,
}

pub(super) fn handler_error_action(
    server_name: &str,
    nick: &str,
    error: &HandlerError,
    msg: &Message,
) -> ErrorAction {
    match error {
        HandlerError::Quit(Some(reason)) => ErrorAction::Disconnect(reason.clone()),
        HandlerError::Quit(None) => ErrorAction::Disconnect("Client quit".to_string()),
        HandlerError::AccessDenied(reason) => ErrorAction::Disconnect(reason.clone()),
        _ => match error.to_irc_reply(server_name, nick, &msg.command) {
            Some(reply) => ErrorAction::Reply(reply),
            None => ErrorAction::Silent,
        },
    }
}

/// Apply a handler error to the client that caused it.
pub(super) fn handle_handler_error(matrix: &Matrix, client: &Client, msg: &Message, error: HandlerError) {
    debug!(
        id = client.id(),
        command = %msg.command,
        code = error.error_code(),
        error = %error,
        "Command failed"
    );
    match handler_error_action(&matrix.server_info.name, &client.nick_or_star(), &error, msg) {
        ErrorAction::Reply(reply) => client.send(reply),
        ErrorAction::Disconnect(reason) => {
            matrix.disconnect(client, &reason);
        }
        ErrorAction::Silent => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(line: &str) -> Message {
        line.parse().expect("parse")
    }

    #[test]
    fn overlong_lines_are_distinguished_from_io_failures() {
        let too_long = ProtocolError::MessageTooLong {
            actual: 600,
            limit: 510,
        };
        assert_eq!(classify_read_error(&too_long), ReadErrorAction::LineTooLong);

        let io = ProtocolError::Io(std::io::Error::other("reset"));
        assert_eq!(classify_read_error(&io), ReadErrorAction::IoError);
    }

    #[test]
    fn quit_reason_is_carried_into_disconnect() {
        let action = handler_error_action(
            "irc.test",
            "alice",
            &HandlerError::Quit(Some("bye".into())),
            &msg("QUIT :bye"),
        );
        assert_eq!(action, ErrorAction::Disconnect("bye".into()));

        let action = handler_error_action("irc.test", "alice", &HandlerError::Quit(None), &msg("QUIT"));
        assert_eq!(action, ErrorAction::Disconnect("Client quit".into()));
    }

    #[test]
    fn protocol_errors_become_numeric_replies() {
        let action = handler_error_action(
            "irc.test",
            "*",
            &HandlerError::NotRegistered,
            &msg("JOIN #a"),
        );
        match action {
            ErrorAction::Reply(reply) => assert_eq!(reply.command, "451"),
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[test]
    fn ignored_errors_are_silent() {
        let action = handler_error_action(
            "irc.test",
            "alice",
            &HandlerError::Ignored("notice"),
            &msg("NOTICE bob :hi"),
        );
        assert_eq!(action, ErrorAction::Silent);
    }
}
