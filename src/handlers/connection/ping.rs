//! PING, PONG and QUIT handlers.

use super::super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use lirc_proto::Message;
use tracing::{debug, info};

/// Handler for PING command.
pub struct PingHandler;

impl Handler for PingHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        // PING <token>
        let token = msg.arg(0).ok_or(HandlerError::NoOrigin)?;
        ctx.client.send(Message::pong(ctx.server_name(), token));
        Ok(())
    }
}

/// Handler for PONG command.
pub struct PongHandler;

impl Handler for PongHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        // Activity was already stamped by the reader.
        debug!(id = ctx.client.id(), token = ?msg.params.last(), "PONG received");
        Ok(())
    }
}

/// Handler for QUIT command.
pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let reason = msg.arg(0).map(str::to_string);

        info!(
            id = ctx.client.id(),
            nick = ?ctx.client.nick(),
            message = ?reason,
            "Client quit"
        );

        // The dispatch loop performs the disconnect.
        Err(HandlerError::Quit(reason))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::HandlerError;
    use crate::handlers::test_support::{lines, run};
    use crate::state::test_support::connect;
    use crate::state::Matrix;
    use std::sync::Arc;

    #[tokio::test]
    async fn ping_echoes_token_before_registration() {
        let matrix = Arc::new(Matrix::new(Config::default()));
        let (client, mut rx) = connect(&matrix);
        run(&matrix, &client, "PING :abc 123").expect("ping");
        assert_eq!(lines(&mut rx), vec!["PONG irc.lircd.local :abc 123"]);
    }

    #[tokio::test]
    async fn ping_without_token_is_an_error() {
        let matrix = Arc::new(Matrix::new(Config::default()));
        let (client, _rx) = connect(&matrix);
        assert!(matches!(
            run(&matrix, &client, "PING"),
            Err(HandlerError::NoOrigin)
        ));
    }

    #[tokio::test]
    async fn quit_carries_reason() {
        let matrix = Arc::new(Matrix::new(Config::default()));
        let (client, _rx) = connect(&matrix);
        assert!(matches!(
            run(&matrix, &client, "QUIT :gone fishing"),
            Err(HandlerError::Quit(Some(ref r))) if r == "gone fishing"
        ));
        assert!(matches!(run(&matrix, &client, "QUIT"), Err(HandlerError::Quit(None))));
        assert!(run(&matrix, &client, "PONG :x").is_ok());
    }
}
