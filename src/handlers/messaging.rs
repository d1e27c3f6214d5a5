//! PRIVMSG and NOTICE handlers.
//!
//! Both route the same way: channel targets go through the channel's
//! broadcast queue, nickname targets straight to the recipient. NOTICE
//! never produces an error reply.

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use lirc_proto::{ChannelExt, Message};
use tracing::debug;

fn route(ctx: &Context<'_>, msg: &Message) -> HandlerResult {
    let target = msg.arg(0).ok_or(HandlerError::NoRecipient)?;
    let text = msg
        .arg(1)
        .filter(|text| !text.is_empty())
        .ok_or(HandlerError::NoTextToSend)?;

    if target.is_channel_name() {
        let channel = ctx
            .matrix
            .find_channel(target)
            .ok_or_else(|| HandlerError::NoSuchNick(target.to_string()))?;
        let relayed = channel
            .message(ctx.client, &msg.command, text)
            .map_err(|err| HandlerError::channel(channel.name(), err))?;
        if !relayed {
            debug!(id = ctx.client.id(), channel = %channel.name(), "Dropped by moderation");
        }
        return Ok(());
    }

    let recipient = ctx
        .matrix
        .find_by_nickname(target)
        .ok_or_else(|| HandlerError::NoSuchNick(target.to_string()))?;
    let line = Message::new(msg.command.as_str(), [recipient.nick_or_star()])
        .with_trailing(text)
        .with_prefix(ctx.client.prefix());
    recipient.send(line);
    Ok(())
}

/// Handler for PRIVMSG command.
///
/// `PRIVMSG target :text`
pub struct PrivmsgHandler;

impl Handler for PrivmsgHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        route(ctx, msg)
    }
}

/// Handler for NOTICE command.
///
/// `NOTICE target :text`
pub struct NoticeHandler;

impl Handler for NoticeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        route(ctx, msg).map_err(|err| {
            debug!(id = ctx.client.id(), error = %err, "NOTICE not delivered");
            HandlerError::Ignored("NOTICE failures are not reported")
        })
    }
}
