//! Unified error handling for lircd.
//!
//! Handler and channel failures carry enough context to produce the numeric
//! reply the client should see, and a static label for logs.

use crate::handlers::server_reply;
use lirc_proto::{Message, Response};
use thiserror::Error;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("no recipient given")]
    NoRecipient,

    #[error("no text to send")]
    NoTextToSend,

    #[error("no such nick/channel: {0}")]
    NoSuchNick(String),

    #[error("no origin specified")]
    NoOrigin,

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("password mismatch")]
    PasswordMismatch,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{channel}: {source}")]
    Channel {
        channel: String,
        #[source]
        source: ChannelError,
    },

    /// Absorbed without a reply; the reason is only logged.
    #[error("ignored: {0}")]
    Ignored(&'static str),

    /// Close the connection; any reply has already been sent.
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("client quit: {0:?}")]
    Quit(Option<String>),
}

impl HandlerError {
    /// Attach the channel name a [`ChannelError`] refers to.
    pub fn channel(channel: &str, source: ChannelError) -> Self {
        Self::Channel {
            channel: channel.to_string(),
            source,
        }
    }

    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreParams => "need_more_params",
            Self::NoNicknameGiven => "no_nickname_given",
            Self::NoRecipient => "no_recipient",
            Self::NoTextToSend => "no_text_to_send",
            Self::NoSuchNick(_) => "no_such_nick",
            Self::NoOrigin => "no_origin",
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::ErroneousNickname(_) => "erroneous_nickname",
            Self::NotRegistered => "not_registered",
            Self::AlreadyRegistered => "already_registered",
            Self::PasswordMismatch => "password_mismatch",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Channel { source, .. } => source.error_code(),
            Self::Ignored(_) => "ignored",
            Self::AccessDenied(_) => "access_denied",
            Self::Quit(_) => "quit",
        }
    }

    /// Convert to an IRC error reply message.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, cmd_name: &str) -> Option<Message> {
        let (response, params) = match self {
            Self::NeedMoreParams => (
                Response::ERR_NEEDMOREPARAMS,
                vec![nick.to_string(), cmd_name.to_string(), "Not enough parameters".to_string()],
            ),
            Self::NoNicknameGiven => (
                Response::ERR_NONICKNAMEGIVEN,
                vec![nick.to_string(), "No nickname given".to_string()],
            ),
            Self::NoRecipient => (
                Response::ERR_NORECIPIENT,
                vec![nick.to_string(), format!("No recipient given ({})", cmd_name)],
            ),
            Self::NoTextToSend => (
                Response::ERR_NOTEXTTOSEND,
                vec![nick.to_string(), "No text to send".to_string()],
            ),
            Self::NoSuchNick(target) => (
                Response::ERR_NOSUCHNICK,
                vec![nick.to_string(), target.clone(), "No such nick/channel".to_string()],
            ),
            Self::NoOrigin => (
                Response::ERR_NOORIGIN,
                vec![nick.to_string(), "No origin specified".to_string()],
            ),
            Self::NicknameInUse(bad_nick) => (
                Response::ERR_NICKNAMEINUSE,
                vec![nick.to_string(), bad_nick.clone(), "Nickname is already in use".to_string()],
            ),
            Self::ErroneousNickname(bad_nick) => (
                Response::ERR_ERRONEUSNICKNAME,
                vec![nick.to_string(), bad_nick.clone(), "Erroneous nickname".to_string()],
            ),
            Self::NotRegistered => (
                Response::ERR_NOTREGISTERED,
                vec![nick.to_string(), "You have not registered".to_string()],
            ),
            Self::AlreadyRegistered => (
                Response::ERR_ALREADYREGISTRED,
                vec![nick.to_string(), "You may not reregister".to_string()],
            ),
            Self::PasswordMismatch => (
                Response::ERR_PASSWDMISMATCH,
                vec![nick.to_string(), "Password incorrect".to_string()],
            ),
            Self::UnknownCommand(cmd) => (
                Response::ERR_UNKNOWNCOMMAND,
                vec![nick.to_string(), cmd.clone(), "Unknown command".to_string()],
            ),
            Self::Channel { channel, source } => {
                return source.to_irc_reply(server_name, nick, channel);
            }

            // These errors don't get client-visible replies
            Self::Ignored(_) | Self::AccessDenied(_) | Self::Quit(_) => return None,
        };

        Some(server_reply(server_name, response, params))
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Channel Errors
// ============================================================================

/// Channel operation errors.
///
/// These errors represent channel-specific failures that can be mapped
/// to numeric replies by handler code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("no such channel")]
    NoSuchChannel,

    #[error("not on channel")]
    NotOnChannel,

    #[error("cannot join channel (+l)")]
    ChannelIsFull,

    #[error("cannot join channel (+k)")]
    BadChannelKey,

    #[error("too many channels")]
    TooManyChannels,

    #[error("cannot send to channel")]
    CannotSendToChan,

    #[error("you're not channel operator")]
    ChanOpPrivsNeeded,

    #[error("user {0} is not on that channel")]
    UserNotInChannel(String),

    #[error("user {0} is already on that channel")]
    UserOnChannel(String),

    #[error("unknown mode char {0}")]
    UnknownMode(char),

    /// The channel was torn down while the operation was in flight.
    #[error("channel is gone")]
    Defunct,

    /// The joining client was disconnected while the join was in flight.
    #[error("client is disconnected")]
    ClientGone,
}

impl ChannelError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoSuchChannel => "no_such_channel",
            Self::NotOnChannel => "not_on_channel",
            Self::ChannelIsFull => "channel_is_full",
            Self::BadChannelKey => "bad_channel_key",
            Self::TooManyChannels => "too_many_channels",
            Self::CannotSendToChan => "cannot_send_to_chan",
            Self::ChanOpPrivsNeeded => "chanop_privs_needed",
            Self::UserNotInChannel(_) => "user_not_in_channel",
            Self::UserOnChannel(_) => "user_on_channel",
            Self::UnknownMode(_) => "unknown_mode",
            Self::Defunct => "defunct",
            Self::ClientGone => "client_gone",
        }
    }

    /// Convert to an IRC error reply message.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, channel: &str) -> Option<Message> {
        let nick = nick.to_string();
        let channel = channel.to_string();
        let (response, params) = match self {
            Self::NoSuchChannel => (
                Response::ERR_NOSUCHCHANNEL,
                vec![nick, channel, "No such channel".to_string()],
            ),
            Self::NotOnChannel => (
                Response::ERR_NOTONCHANNEL,
                vec![nick, channel, "You're not on that channel".to_string()],
            ),
            Self::ChannelIsFull => (
                Response::ERR_CHANNELISFULL,
                vec![nick, channel, "Cannot join channel (+l)".to_string()],
            ),
            Self::BadChannelKey => (
                Response::ERR_BADCHANNELKEY,
                vec![nick, channel, "Cannot join channel (+k)".to_string()],
            ),
            Self::TooManyChannels => (
                Response::ERR_TOOMANYCHANNELS,
                vec![nick, channel, "You have joined too many channels".to_string()],
            ),
            Self::CannotSendToChan => (
                Response::ERR_CANNOTSENDTOCHAN,
                vec![nick, channel, "Cannot send to channel".to_string()],
            ),
            Self::ChanOpPrivsNeeded => (
                Response::ERR_CHANOPRIVSNEEDED,
                vec![nick, channel, "You're not channel operator".to_string()],
            ),
            Self::UserNotInChannel(target) => (
                Response::ERR_USERNOTINCHANNEL,
                vec![nick, target.clone(), channel, "They aren't on that channel".to_string()],
            ),
            Self::UserOnChannel(target) => (
                Response::ERR_USERONCHANNEL,
                vec![nick, target.clone(), channel, "is already on channel".to_string()],
            ),
            Self::UnknownMode(c) => (
                Response::ERR_UNKNOWNMODE,
                vec![nick, c.to_string(), "is unknown mode char to me".to_string()],
            ),
            Self::Defunct | Self::ClientGone => return None,
        };
        Some(server_reply(server_name, response, params))
    }
}
