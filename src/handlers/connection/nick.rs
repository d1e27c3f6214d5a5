//! NICK command handler for registration and renames.

use super::super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::ClientState;
use lirc_proto::Message;
use tracing::{debug, info};

/// Handler for NICK command.
///
/// `NICK nickname`
///
/// Sets the first nickname while awaiting one, or renames an active client.
/// Renames are announced to the client and to everyone sharing a channel.
pub struct NickHandler;

impl Handler for NickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let state = ctx.client.state();
        if !matches!(state, ClientState::AwaitingNick | ClientState::Active) {
            return Err(HandlerError::NotRegistered);
        }

        let raw = msg.arg(0).unwrap_or_default();
        if raw.is_empty() {
            return Err(HandlerError::NoNicknameGiven);
        }
        if msg.arg_count() > 1 {
            return Err(HandlerError::ErroneousNickname(msg.params.join(" ")));
        }
        let nick = ctx
            .matrix
            .sanitizer()
            .sanitize(raw)
            .ok_or_else(|| HandlerError::ErroneousNickname(raw.to_string()))?;

        let origin = ctx.client.prefix();
        let old = ctx.matrix.claim_nickname(ctx.client, &nick)?;

        if state == ClientState::AwaitingNick {
            let mut session = ctx.client.session_mut();
            if session.state == ClientState::AwaitingNick {
                session.state = ClientState::AwaitingUser;
            }
            debug!(id = ctx.client.id(), %nick, "Nickname set");
            return Ok(());
        }

        if old.as_deref() != Some(nick.as_str()) {
            let announce = Message::nick(&nick).with_prefix(origin);
            ctx.client.send(announce.clone());
            ctx.matrix.announce_to_peers(ctx.client, &announce);
            info!(id = ctx.client.id(), old = ?old, new = %nick, "Nickname changed");
        }
        Ok(())
    }
}
