//! KICK command handler.

use super::super::{Context, Handler};
use crate::error::{ChannelError, HandlerError, HandlerResult};
use lirc_proto::Message;
use tracing::info;

/// Handler for KICK command.
///
/// `KICK #chan nick [:reason]`
///
/// Requires channel operator. The target sees the KICK directly, the rest
/// of the channel through its broadcast queue.
pub struct KickHandler;

impl Handler for KickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).unwrap_or_default();
        let target_nick = msg.arg(1).unwrap_or_default();

        let channel = ctx
            .matrix
            .find_channel(name)
            .ok_or_else(|| HandlerError::channel(name, ChannelError::NoSuchChannel))?;
        let channel_err = |err| HandlerError::channel(channel.name(), err);

        let roles = channel
            .member_roles(ctx.client.id())
            .ok_or_else(|| channel_err(ChannelError::NotOnChannel))?;
        if !roles.operator {
            return Err(channel_err(ChannelError::ChanOpPrivsNeeded));
        }

        let target = ctx
            .matrix
            .find_by_nickname(target_nick)
            .ok_or_else(|| HandlerError::NoSuchNick(target_nick.to_string()))?;
        if !channel.is_member(target.id()) {
            return Err(channel_err(ChannelError::UserNotInChannel(
                target_nick.to_string(),
            )));
        }

        let kicker = ctx.client.nick_or_star();
        let reason = msg.arg(2).unwrap_or(&kicker).to_string();
        let target_name = target.nick_or_star();
        let kick = Message::new("KICK", [channel.name(), target_name.as_str()])
            .with_trailing(reason.as_str())
            .with_prefix(ctx.client.prefix());

        target.send(kick.clone());
        channel.broadcast(&kick, Some(target.id()));

        let outcome = channel.part(target.id()).map_err(channel_err)?;
        target.session_mut().channels.remove(&channel.lookup_key());
        if outcome.defunct {
            ctx.matrix.remove_channel(&channel);
        }

        info!(channel = %channel.name(), %kicker, target = %target_name, %reason, "Kicked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::{ChannelError, HandlerError};
    use crate::handlers::test_support::{lines, run};
    use crate::state::test_support::{recv_line, registered};
    use crate::state::Matrix;
    use std::sync::Arc;

    fn matrix() -> Arc<Matrix> {
        Arc::new(Matrix::new(Config::default()))
    }

    #[tokio::test]
    async fn operator_kicks_member() {
        let matrix = matrix();
        let (alice, mut a_rx) = registered(&matrix, "alice");
        let (bob, mut b_rx) = registered(&matrix, "bob");
        run(&matrix, &alice, "JOIN #test").expect("join");
        run(&matrix, &bob, "JOIN #test").expect("join");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        lines(&mut a_rx);
        lines(&mut b_rx);

        run(&matrix, &alice, "KICK #test bob :behave").expect("kick");
        let expected = ":alice!alice@127.0.0.1 KICK #test bob :behave";
        assert_eq!(lines(&mut b_rx), vec![expected]);
        assert_eq!(recv_line(&mut a_rx).await, expected);
        assert_eq!(bob.channel_count(), 0);
        assert_eq!(matrix.find_channel("#test").map(|c| c.member_count()), Some(1));
    }

    #[tokio::test]
    async fn non_operator_cannot_kick() {
        let matrix = matrix();
        let (alice, _a) = registered(&matrix, "alice");
        let (bob, _b) = registered(&matrix, "bob");
        run(&matrix, &alice, "JOIN #test").expect("join");
        run(&matrix, &bob, "JOIN #test").expect("join");

        assert!(matches!(
            run(&matrix, &bob, "KICK #test alice"),
            Err(HandlerError::Channel {
                source: ChannelError::ChanOpPrivsNeeded,
                ..
            })
        ));
        assert_eq!(alice.channel_count(), 1);
    }

    #[tokio::test]
    async fn target_must_be_a_member() {
        let matrix = matrix();
        let (alice, _a) = registered(&matrix, "alice");
        let (_bob, _b) = registered(&matrix, "bob");
        run(&matrix, &alice, "JOIN #test").expect("join");

        assert!(matches!(
            run(&matrix, &alice, "KICK #test bob"),
            Err(HandlerError::Channel {
                source: ChannelError::UserNotInChannel(_),
                ..
            })
        ));
        assert!(matches!(
            run(&matrix, &alice, "KICK #test nobody"),
            Err(HandlerError::NoSuchNick(_))
        ));
    }
}
