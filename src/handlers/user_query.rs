//! WHOIS command handler.

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use lirc_proto::{Message, Response};

/// Handler for WHOIS command.
///
/// `WHOIS [server] nick`
pub struct WhoisHandler;

impl Handler for WhoisHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let wanted = msg.params.last().map(String::as_str).unwrap_or_default();
        let target = ctx
            .matrix
            .find_by_nickname(wanted)
            .ok_or_else(|| HandlerError::NoSuchNick(wanted.to_string()))?;

        let (nick, user, realname, oper, joined) = {
            let session = target.session();
            (
                session.nick.clone().unwrap_or_else(|| "*".to_string()),
                session.user.clone(),
                session.realname.clone(),
                session.oper,
                session.channels.iter().cloned().collect::<Vec<_>>(),
            )
        };

        ctx.reply(
            Response::RPL_WHOISUSER,
            vec![
                nick.clone(),
                user,
                target.host().to_string(),
                "*".to_string(),
                realname,
            ],
        );

        let mut channels: Vec<String> = joined
            .iter()
            .filter_map(|name| ctx.matrix.find_channel(name))
            .filter_map(|channel| {
                let roles = channel.member_roles(target.id())?;
                if roles.ghost {
                    return None;
                }
                Some(format!("{}{}", roles.display_prefix(false), channel.name()))
            })
            .collect();
        channels.sort();
        if !channels.is_empty() {
            ctx.reply(
                Response::RPL_WHOISCHANNELS,
                vec![nick.clone(), channels.join(" ")],
            );
        }

        let info = &ctx.matrix.server_info;
        ctx.reply(
            Response::RPL_WHOISSERVER,
            vec![nick.clone(), info.name.clone(), info.description.clone()],
        );
        if oper {
            ctx.reply(
                Response::RPL_WHOISOPERATOR,
                vec![nick.clone(), "is an IRC operator".to_string()],
            );
        }
        ctx.reply(
            Response::RPL_ENDOFWHOIS,
            vec![nick, "End of /WHOIS list".to_string()],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::HandlerError;
    use crate::handlers::test_support::{codes, lines, run};
    use crate::state::test_support::registered;
    use crate::state::Matrix;
    use std::sync::Arc;

    #[tokio::test]
    async fn whois_describes_the_user() {
        let matrix = Arc::new(Matrix::new(Config::default()));
        let (alice, mut a_rx) = registered(&matrix, "alice");
        let (bob, _b) = registered(&matrix, "bob");
        run(&matrix, &bob, "JOIN #rust").expect("join");
        bob.session_mut().oper = true;
        lines(&mut a_rx);

        run(&matrix, &alice, "WHOIS BOB").expect("whois");
        let got = lines(&mut a_rx);
        assert_eq!(got[0], ":irc.lircd.local 311 alice bob bob 127.0.0.1 * :bob");
        assert_eq!(got[1], ":irc.lircd.local 319 alice bob :@#rust");
        assert!(got[2].contains(" 312 "));
        assert!(got[3].contains(" 313 "));
        assert!(got[4].contains(" 318 "));
    }

    #[tokio::test]
    async fn whois_unknown_nick() {
        let matrix = Arc::new(Matrix::new(Config::default()));
        let (alice, mut a_rx) = registered(&matrix, "alice");
        assert!(matches!(
            run(&matrix, &alice, "WHOIS ghost"),
            Err(HandlerError::NoSuchNick(_))
        ));
        assert!(codes(&mut a_rx).is_empty());
    }
}
