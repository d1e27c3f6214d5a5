//! USER command handler for connection registration.

use super::super::{Context, Handler};
use super::welcome::send_welcome_burst;
use crate::error::{HandlerError, HandlerResult};
use crate::state::{ClientState, ScheduledTask};
use lirc_proto::Message;
use tracing::info;

/// Handler for USER command.
///
/// `USER username mode unused :realname`
///
/// Completes registration and sends the welcome burst. Out-of-sequence or
/// malformed USER lines are ignored without a reply.
pub struct UserHandler;

impl Handler for UserHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if msg.arg_count() != 4 {
            return Err(HandlerError::Ignored("USER takes exactly four fields"));
        }

        {
            let mut session = ctx.client.session_mut();
            if session.state != ClientState::AwaitingUser {
                return Err(HandlerError::Ignored("USER out of sequence"));
            }
            session.user = msg.params[0].clone();
            session.mode = msg.params[1].clone();
            session.realname = msg.params[3].clone();
            session.state = ClientState::Active;
        }

        info!(
            id = ctx.client.id(),
            nick = ?ctx.client.nick(),
            addr = %ctx.client.addr(),
            "Client registered"
        );
        send_welcome_burst(ctx);
        ctx.client.arm(ScheduledTask::keepalive(ctx.client.id()));
        Ok(())
    }
}
