//! NAMES command handler and member-list pagination.

use super::super::helpers::split_list;
use super::super::{Context, Handler};
use crate::error::HandlerResult;
use crate::state::Channel;
use lirc_proto::{MAX_LINE_LEN, Message, Response};

/// Pack `names` into space-separated lines of at most `budget` bytes.
///
/// Every name appears in exactly one line. A single name longer than the
/// budget gets a line of its own.
pub fn paginate_names(names: &[String], budget: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for name in names {
        if !current.is_empty() && current.len() + 1 + name.len() > budget {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(name);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Send 353 pages for `channel` followed by 366.
pub fn send_names(ctx: &Context<'_>, channel: &Channel) {
    let nick = ctx.client.nick_or_star();
    let name = channel.name();

    let overhead = format!(":{} 353 {} = {} :", ctx.server_name(), nick, name).len();
    let budget = MAX_LINE_LEN.saturating_sub(overhead).max(1);

    for page in paginate_names(&channel.display_names(), budget) {
        ctx.reply(
            Response::RPL_NAMREPLY,
            vec!["=".to_string(), name.to_string(), page],
        );
    }
    send_end_of_names(ctx, name);
}

fn send_end_of_names(ctx: &Context<'_>, name: &str) {
    ctx.reply(
        Response::RPL_ENDOFNAMES,
        vec![name.to_string(), "End of /NAMES list.".to_string()],
    );
}

/// Handler for NAMES command.
///
/// `NAMES [#chan1,#chan2]`
pub struct NamesHandler;

impl Handler for NamesHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(targets) = msg.arg(0) else {
            send_end_of_names(ctx, "*");
            return Ok(());
        };

        for name in split_list(targets) {
            match ctx.matrix.find_channel(name) {
                Some(channel) => send_names(ctx, &channel),
                None => send_end_of_names(ctx, name),
            }
        }
        Ok(())
    }
}
