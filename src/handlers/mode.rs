//! MODE command handler for channel modes.
//!
//! Channel flags: `a` anonymous, `g` sticky, `m` moderated, `k` key.
//! Member flags: `o` operator, `v` voice, `G` ghost; each takes a nickname.

use super::{Context, Handler};
use crate::error::{ChannelError, HandlerError, HandlerResult};
use crate::state::{Channel, ChannelFlag, RoleFlag};
use lirc_proto::{ChannelExt, Message, Response};
use tracing::debug;

/// One applied change, for the broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Change {
    add: bool,
    letter: char,
    param: Option<String>,
}

/// Render changes as `+mk-v key bob` style arguments.
fn format_changes(changes: &[Change]) -> Vec<String> {
    let mut modes = String::new();
    let mut params = Vec::new();
    let mut sign = None;

    for change in changes {
        if sign != Some(change.add) {
            modes.push(if change.add { '+' } else { '-' });
            sign = Some(change.add);
        }
        modes.push(change.letter);
        if let Some(param) = &change.param {
            params.push(param.clone());
        }
    }

    let mut out = vec![modes];
    out.extend(params);
    out
}

/// Handler for MODE command.
///
/// `MODE #chan [modestring [params...]]`
pub struct ModeHandler;

impl Handler for ModeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let target = msg.arg(0).unwrap_or_default();
        if !target.is_channel_name() {
            return Err(HandlerError::Ignored("user modes are not supported"));
        }

        let channel = ctx
            .matrix
            .find_channel(target)
            .ok_or_else(|| HandlerError::channel(target, ChannelError::NoSuchChannel))?;

        let Some(modestring) = msg.arg(1) else {
            send_channel_modes(ctx, &channel);
            return Ok(());
        };

        let roles = channel
            .member_roles(ctx.client.id())
            .ok_or_else(|| HandlerError::channel(channel.name(), ChannelError::NotOnChannel))?;
        if !roles.operator {
            return Err(HandlerError::channel(
                channel.name(),
                ChannelError::ChanOpPrivsNeeded,
            ));
        }

        let changes = apply_modes(ctx, &channel, modestring, &msg.params[2..]);
        if changes.is_empty() {
            return Ok(());
        }

        let mut args = vec![channel.name().to_string()];
        args.extend(format_changes(&changes));
        let announce = Message::new("MODE", args).with_prefix(ctx.client.prefix());
        debug!(id = ctx.client.id(), line = %announce, "Channel modes changed");
        channel.broadcast(&announce, None);
        Ok(())
    }
}

fn send_channel_modes(ctx: &Context<'_>, channel: &Channel) {
    let key = channel.key();
    let mut params = vec![
        channel.name().to_string(),
        channel.modes().as_mode_string(key.is_some()),
    ];
    if let Some(key) = key {
        if channel.is_member(ctx.client.id()) {
            params.push(key);
        }
    }
    ctx.reply(Response::RPL_CHANNELMODEIS, params);
}

/// Apply every change in `modestring`, reporting bad letters and targets
/// inline. Returns what was applied.
fn apply_modes(
    ctx: &Context<'_>,
    channel: &Channel,
    modestring: &str,
    params: &[String],
) -> Vec<Change> {
    let mut params = params.iter();
    let mut add = true;
    let mut changes = Vec::new();

    for letter in modestring.chars() {
        match letter {
            '+' => add = true,
            '-' => add = false,
            'k' => {
                if add {
                    let Some(key) = params.next().filter(|k| !k.is_empty()) else {
                        continue;
                    };
                    channel.set_key(Some(key.as_str()));
                    changes.push(Change {
                        add,
                        letter,
                        param: Some(key.clone()),
                    });
                } else {
                    params.next();
                    channel.set_key(None);
                    changes.push(Change {
                        add,
                        letter,
                        param: None,
                    });
                }
            }
            _ => {
                if let Some(flag) = ChannelFlag::from_char(letter) {
                    channel.set_flag(flag, add);
                    changes.push(Change {
                        add,
                        letter,
                        param: None,
                    });
                } else if let Some(role) = RoleFlag::from_char(letter) {
                    let Some(nick) = params.next() else {
                        continue;
                    };
                    let target = ctx.matrix.find_by_nickname(nick);
                    match target {
                        Some(target) if channel.set_role(target.id(), role, add) => {
                            changes.push(Change {
                                add,
                                letter,
                                param: Some(target.nick_or_star()),
                            });
                        }
                        _ => report(ctx, channel, ChannelError::UserNotInChannel(nick.clone())),
                    }
                } else {
                    report(ctx, channel, ChannelError::UnknownMode(letter));
                }
            }
        }
    }
    changes
}

fn report(ctx: &Context<'_>, channel: &Channel, err: ChannelError) {
    if let Some(reply) = err.to_irc_reply(ctx.server_name(), &ctx.client.nick_or_star(), channel.name()) {
        ctx.client.send(reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::test_support::{codes, lines, run};
    use crate::state::test_support::{recv_line, registered};
    use crate::state::{Matrix, MemberRoles};
    use std::sync::Arc;

    fn matrix() -> Arc<Matrix> {
        Arc::new(Matrix::new(Config::default()))
    }

    #[test]
    fn changes_group_by_sign() {
        let changes = vec![
            Change { add: true, letter: 'm', param: None },
            Change { add: true, letter: 'k', param: Some("key".into()) },
            Change { add: false, letter: 'v', param: Some("bob".into()) },
        ];
        assert_eq!(format_changes(&changes), vec!["+mk-v", "key", "bob"]);
    }

    #[tokio::test]
    async fn operator_sets_flags_and_members_see_it() {
        let matrix = matrix();
        let (alice, mut a_rx) = registered(&matrix, "alice");
        run(&matrix, &alice, "JOIN #test").expect("join");
        lines(&mut a_rx);

        run(&matrix, &alice, "MODE #test +gm").expect("mode");
        assert_eq!(recv_line(&mut a_rx).await, ":alice!alice@127.0.0.1 MODE #test +gm");
        let modes = matrix.find_channel("#test").expect("channel").modes();
        assert!(modes.sticky && modes.moderated && !modes.anonymous);
    }

    #[tokio::test]
    async fn query_reports_current_modes() {
        let matrix = matrix();
        let (alice, mut a_rx) = registered(&matrix, "alice");
        run(&matrix, &alice, "JOIN #test").expect("join");
        run(&matrix, &alice, "MODE #test +ak secret").expect("mode");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        lines(&mut a_rx);

        run(&matrix, &alice, "MODE #test").expect("query");
        assert_eq!(
            lines(&mut a_rx),
            vec![":irc.lircd.local 324 alice #test +ak :secret"]
        );
    }

    #[tokio::test]
    async fn removing_key_reopens_channel() {
        let matrix = matrix();
        let (alice, _a) = registered(&matrix, "alice");
        run(&matrix, &alice, "JOIN #test").expect("join");
        run(&matrix, &alice, "MODE #test +k secret").expect("mode");
        assert_eq!(matrix.find_channel("#test").and_then(|c| c.key()).as_deref(), Some("secret"));
        run(&matrix, &alice, "MODE #test -k").expect("mode");
        assert_eq!(matrix.find_channel("#test").and_then(|c| c.key()), None);
    }

    #[tokio::test]
    async fn member_flags_need_a_member() {
        let matrix = matrix();
        let (alice, mut a_rx) = registered(&matrix, "alice");
        let (bob, _b) = registered(&matrix, "bob");
        let (_carol, _c) = registered(&matrix, "carol");
        run(&matrix, &alice, "JOIN #test").expect("join");
        run(&matrix, &bob, "JOIN #test").expect("join");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        lines(&mut a_rx);

        run(&matrix, &alice, "MODE #test +ov bob carol").expect("mode");
        assert_eq!(codes(&mut a_rx), vec!["441"]);
        let channel = matrix.find_channel("#test").expect("channel");
        assert_eq!(
            channel.member_roles(bob.id()),
            Some(MemberRoles { operator: true, ..MemberRoles::default() })
        );
    }

    #[tokio::test]
    async fn unknown_letters_are_reported() {
        let matrix = matrix();
        let (alice, mut a_rx) = registered(&matrix, "alice");
        run(&matrix, &alice, "JOIN #test").expect("join");
        lines(&mut a_rx);
        run(&matrix, &alice, "MODE #test +z").expect("mode");
        assert_eq!(codes(&mut a_rx), vec!["472"]);
    }

    #[tokio::test]
    async fn only_operators_change_modes() {
        let matrix = matrix();
        let (alice, _a) = registered(&matrix, "alice");
        let (bob, _b) = registered(&matrix, "bob");
        let (carol, _c) = registered(&matrix, "carol");
        run(&matrix, &alice, "JOIN #test").expect("join");
        run(&matrix, &bob, "JOIN #test").expect("join");

        assert!(matches!(
            run(&matrix, &bob, "MODE #test +m"),
            Err(HandlerError::Channel { source: ChannelError::ChanOpPrivsNeeded, .. })
        ));
        assert!(matches!(
            run(&matrix, &carol, "MODE #test +m"),
            Err(HandlerError::Channel { source: ChannelError::NotOnChannel, .. })
        ));
        assert!(!matrix.find_channel("#test").expect("channel").modes().moderated);
    }

    #[tokio::test]
    async fn user_targets_are_ignored() {
        let matrix = matrix();
        let (alice, mut a_rx) = registered(&matrix, "alice");
        assert!(matches!(
            run(&matrix, &alice, "MODE alice +i"),
            Err(HandlerError::Ignored(_))
        ));
        assert!(lines(&mut a_rx).is_empty());
    }
}
