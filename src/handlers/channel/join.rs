//! JOIN command handler.

use super::super::helpers::split_list;
use super::super::{Context, Handler};
use super::names::send_names;
use super::topic::send_topic;
use crate::error::{ChannelError, HandlerError, HandlerResult};
use crate::state::JoinOutcome;
use lirc_proto::Message;
use tracing::debug;

/// Handler for JOIN command.
///
/// `JOIN #chan1,#chan2 [key1,key2]`
///
/// Each channel is joined independently; a failure on one is reported and
/// the rest are still attempted.
pub struct JoinHandler;

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let targets = msg.arg(0).unwrap_or_default();
        let keys: Vec<&str> = msg.arg(1).map(|k| k.split(',').collect()).unwrap_or_default();

        for (i, name) in split_list(targets).enumerate() {
            let key = keys.get(i).copied().filter(|k| !k.is_empty());
            if let Err(err) = join_one(ctx, name, key) {
                debug!(id = ctx.client.id(), channel = %name, error = %err, "JOIN refused");
                let err = HandlerError::channel(name, err);
                if let Some(reply) =
                    err.to_irc_reply(ctx.server_name(), &ctx.client.nick_or_star(), "JOIN")
                {
                    ctx.client.send(reply);
                }
            }
        }
        Ok(())
    }
}

fn join_one(ctx: &Context<'_>, name: &str, key: Option<&str>) -> Result<(), ChannelError> {
    let (channel, outcome) = ctx.matrix.join_channel(ctx.client, name, key)?;
    let JoinOutcome::Joined(roles) = outcome else {
        return Ok(());
    };

    let join = Message::join(channel.name()).with_prefix(ctx.client.prefix());
    ctx.client.send(join.clone());
    channel.broadcast(&join, Some(ctx.client.id()));

    send_topic(ctx, &channel, true);
    send_names(ctx, &channel);

    debug!(
        id = ctx.client.id(),
        channel = %channel.name(),
        operator = roles.operator,
        members = channel.member_count(),
        "Joined channel"
    );
    Ok(())
}
