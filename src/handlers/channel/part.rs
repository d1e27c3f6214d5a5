//! PART command handler.

use super::super::helpers::split_list;
use super::super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use lirc_proto::Message;
use tracing::debug;

/// Handler for PART command.
///
/// `PART #chan1,#chan2 [:message]`
pub struct PartHandler;

impl Handler for PartHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let targets = msg.arg(0).unwrap_or_default();
        let reason = msg.arg(1);

        for name in split_list(targets) {
            match ctx.matrix.part_channel(ctx.client, name, reason) {
                Ok(()) => debug!(id = ctx.client.id(), channel = %name, "Left channel"),
                Err(err) => {
                    let err = HandlerError::channel(name, err);
                    if let Some(reply) =
                        err.to_irc_reply(ctx.server_name(), &ctx.client.nick_or_star(), "PART")
                    {
                        ctx.client.send(reply);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::handlers::test_support::{codes, lines, run};
    use crate::state::test_support::{recv_line, registered};
    use crate::state::Matrix;
    use std::sync::Arc;

    fn matrix() -> Arc<Matrix> {
        Arc::new(Matrix::new(Config::default()))
    }

    #[tokio::test]
    async fn part_is_seen_by_leaver_and_remaining_members() {
        let matrix = matrix();
        let (alice, mut a_rx) = registered(&matrix, "alice");
        let (bob, mut b_rx) = registered(&matrix, "bob");
        run(&matrix, &alice, "JOIN #test").expect("join");
        run(&matrix, &bob, "JOIN #test").expect("join");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        lines(&mut a_rx);
        lines(&mut b_rx);

        run(&matrix, &bob, "PART #test :see ya").expect("part");
        assert_eq!(lines(&mut b_rx), vec![":bob!bob@127.0.0.1 PART #test :see ya"]);
        assert_eq!(recv_line(&mut a_rx).await, ":bob!bob@127.0.0.1 PART #test :see ya");
        assert!(matrix.has_channel("#test"));
    }

    #[tokio::test]
    async fn unknown_or_foreign_channels_are_errors() {
        let matrix = matrix();
        let (alice, mut a_rx) = registered(&matrix, "alice");
        let (bob, _b) = registered(&matrix, "bob");
        run(&matrix, &bob, "JOIN #busy").expect("join");

        run(&matrix, &alice, "PART #nowhere,#busy").expect("part");
        assert_eq!(codes(&mut a_rx), vec!["403", "442"]);
    }

    #[tokio::test]
    async fn sticky_channel_outlives_its_last_member() {
        let matrix = matrix();
        let (alice, _a) = registered(&matrix, "alice");
        run(&matrix, &alice, "JOIN #keep").expect("join");
        run(&matrix, &alice, "MODE #keep +g").expect("mode");
        run(&matrix, &alice, "PART #keep").expect("part");

        let channel = matrix.find_channel("#keep").expect("still registered");
        assert_eq!(channel.member_count(), 0);
    }
}
