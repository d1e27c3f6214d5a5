//! OPER command handler.

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use lirc_proto::{Message, Response};
use tracing::{info, warn};

/// Handler for OPER command.
///
/// `OPER name password`
///
/// Grants global operator status, shown as `&` in channel member lists.
pub struct OperHandler;

impl Handler for OperHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).unwrap_or_default();
        let password = msg.arg(1).unwrap_or_default();

        let authorized = ctx
            .matrix
            .find_oper(name)
            .is_some_and(|block| block.verify_password(password));
        if !authorized {
            warn!(id = ctx.client.id(), %name, "Failed OPER attempt");
            return Err(HandlerError::PasswordMismatch);
        }

        ctx.client.session_mut().oper = true;
        ctx.reply(
            Response::RPL_YOUREOPER,
            vec!["You are now an IRC operator".to_string()],
        );
        info!(id = ctx.client.id(), nick = ?ctx.client.nick(), %name, "Operator authenticated");
        Ok(())
    }
}
