//! Helper functions for IRC command handlers.

use lirc_proto::{Message, Prefix, Response};

/// Helper to create a server reply message (numeric response).
pub fn server_reply(server_name: &str, response: Response, params: Vec<String>) -> Message {
    Message {
        prefix: Some(Prefix::ServerName(server_name.to_string())),
        command: response.to_string(),
        params,
        trailing: true,
    }
}

/// Helper to create a server NOTICE message.
pub fn server_notice(server_name: &str, target: &str, text: &str) -> Message {
    Message::notice(target, text).with_prefix(Prefix::ServerName(server_name.to_string()))
}

/// Split a comma-separated target list, skipping empty items.
pub fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').filter(|item| !item.is_empty())
}
