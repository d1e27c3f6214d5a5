//! INVITE command handler.

use super::super::{Context, Handler};
use crate::error::{ChannelError, HandlerError, HandlerResult};
use lirc_proto::{Message, Response};
use tracing::debug;

/// Handler for INVITE command.
///
/// `INVITE nick #chan`
///
/// Informational only: no channel mode restricts joining to invitees.
pub struct InviteHandler;

impl Handler for InviteHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let target_nick = msg.arg(0).unwrap_or_default();
        let name = msg.arg(1).unwrap_or_default();

        let target = ctx
            .matrix
            .find_by_nickname(target_nick)
            .ok_or_else(|| HandlerError::NoSuchNick(target_nick.to_string()))?;

        if let Some(channel) = ctx.matrix.find_channel(name) {
            if !channel.is_member(ctx.client.id()) {
                return Err(HandlerError::channel(channel.name(), ChannelError::NotOnChannel));
            }
            if channel.is_member(target.id()) {
                return Err(HandlerError::channel(
                    channel.name(),
                    ChannelError::UserOnChannel(target_nick.to_string()),
                ));
            }
        }

        let target_name = target.nick_or_star();
        ctx.reply(
            Response::RPL_INVITING,
            vec![target_name.clone(), name.to_string()],
        );
        target.send(
            Message::new("INVITE", [target_name.as_str(), name]).with_prefix(ctx.client.prefix()),
        );
        debug!(id = ctx.client.id(), target = %target_name, channel = %name, "Invite sent");
        Ok(())
    }
}
