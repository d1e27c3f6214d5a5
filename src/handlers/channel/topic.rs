//! TOPIC command handler.

use super::super::{Context, Handler};
use crate::error::{ChannelError, HandlerError, HandlerResult};
use crate::state::Channel;
use lirc_proto::{Message, Response};

/// Send the topic of `channel`. When joining, an unset topic is sent as an
/// empty 332; otherwise it is 331.
pub fn send_topic(ctx: &Context<'_>, channel: &Channel, on_join: bool) {
    let name = channel.name().to_string();
    match channel.topic() {
        Some(topic) => {
            ctx.reply(Response::RPL_TOPIC, vec![name.clone(), topic.text]);
            ctx.reply(
                Response::RPL_TOPICWHOTIME,
                vec![name, topic.set_by, topic.set_at.to_string()],
            );
        }
        None if on_join => ctx.reply(Response::RPL_TOPIC, vec![name, String::new()]),
        None => ctx.reply(Response::RPL_NOTOPIC, vec![name, "No topic is set".to_string()]),
    }
}

/// Handler for TOPIC command.
///
/// `TOPIC #chan [:new topic]`
pub struct TopicHandler;

impl Handler for TopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).unwrap_or_default();
        let channel = ctx
            .matrix
            .find_channel(name)
            .ok_or_else(|| HandlerError::channel(name, ChannelError::NoSuchChannel))?;

        let Some(text) = msg.arg(1) else {
            send_topic(ctx, &channel, false);
            return Ok(());
        };

        if !channel.is_member(ctx.client.id()) {
            return Err(HandlerError::channel(channel.name(), ChannelError::NotOnChannel));
        }

        let setter = ctx.client.nick_or_star();
        channel.set_topic(text, &setter);
        let announce = Message::new("TOPIC", [channel.name()])
            .with_trailing(text)
            .with_prefix(ctx.client.prefix());
        channel.broadcast(&announce, None);
        Ok(())
    }
}
