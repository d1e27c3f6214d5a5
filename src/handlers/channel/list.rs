//! LIST command handler.

use super::super::helpers::split_list;
use super::super::{Context, Handler};
use crate::error::HandlerResult;
use crate::state::Channel;
use lirc_proto::{Message, Response};
use std::sync::Arc;

/// Handler for LIST command.
///
/// `LIST [#chan1,#chan2]`
pub struct ListHandler;

impl Handler for ListHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let mut channels: Vec<Arc<Channel>> = match msg.arg(0) {
            Some(targets) => split_list(targets)
                .filter_map(|name| ctx.matrix.find_channel(name))
                .collect(),
            None => ctx.matrix.channels_snapshot(),
        };
        channels.sort_by(|a, b| a.name().cmp(b.name()));

        ctx.reply(
            Response::RPL_LISTSTART,
            vec!["Channel".to_string(), "Users  Name".to_string()],
        );
        for channel in channels {
            let topic = channel.topic().map(|t| t.text).unwrap_or_default();
            ctx.reply(
                Response::RPL_LIST,
                vec![
                    channel.name().to_string(),
                    channel.member_count().to_string(),
                    topic,
                ],
            );
        }
        ctx.reply(Response::RPL_LISTEND, vec!["End of /LIST".to_string()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::handlers::test_support::{lines, run};
    use crate::state::test_support::registered;
    use crate::state::Matrix;
    use std::sync::Arc;

    #[tokio::test]
    async fn lists_channels_with_counts_and_topics() {
        let matrix = Arc::new(Matrix::new(Config::default()));
        let (alice, mut rx) = registered(&matrix, "alice");
        run(&matrix, &alice, "JOIN #b,#a").expect("join");
        run(&matrix, &alice, "TOPIC #a :first").expect("topic");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        lines(&mut rx);

        run(&matrix, &alice, "LIST").expect("list");
        let got = lines(&mut rx);
        assert_eq!(got.len(), 4);
        assert!(got[0].contains(" 321 "));
        assert_eq!(got[1], ":irc.lircd.local 322 alice #a 1 :first");
        assert_eq!(got[2], ":irc.lircd.local 322 alice #b 1 :");
        assert!(got[3].contains(" 323 "));
    }
}
