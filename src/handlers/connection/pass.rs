//! PASS command handler for connection registration.

use super::super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::ClientState;
use lirc_proto::Message;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

/// Handler for PASS command.
///
/// `PASS password`
///
/// Only accepted while the connection is waiting for the shared password.
pub struct PassHandler;

impl Handler for PassHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if ctx.client.state() != ClientState::AwaitingPassword {
            return Err(HandlerError::AlreadyRegistered);
        }

        let given = msg.arg(0).unwrap_or_default();
        let expected = ctx.matrix.config.server.password.as_deref().unwrap_or_default();
        let matches: bool = expected.as_bytes().ct_eq(given.as_bytes()).into();

        if !matches {
            info!(id = ctx.client.id(), addr = %ctx.client.addr(), "Bad connection password");
            if let Some(reply) = HandlerError::PasswordMismatch.to_irc_reply(
                ctx.server_name(),
                &ctx.client.nick_or_star(),
                "PASS",
            ) {
                ctx.client.send(reply);
            }
            return Err(HandlerError::AccessDenied("Bad password".to_string()));
        }

        let mut session = ctx.client.session_mut();
        if session.state == ClientState::AwaitingPassword {
            session.state = ClientState::AwaitingNick;
        }
        debug!(id = ctx.client.id(), "PASS accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::HandlerError;
    use crate::handlers::test_support::{codes, run};
    use crate::state::test_support::connect;
    use crate::state::{ClientState, Matrix};
    use std::sync::Arc;

    fn locked() -> Arc<Matrix> {
        let mut config = Config::default();
        config.server.password = Some("sesame".into());
        Arc::new(Matrix::new(config))
    }

    #[tokio::test]
    async fn correct_password_opens_nick_step() {
        let matrix = locked();
        let (client, _rx) = connect(&matrix);
        run(&matrix, &client, "PASS sesame").expect("pass");
        assert_eq!(client.state(), ClientState::AwaitingNick);
    }

    #[tokio::test]
    async fn wrong_password_is_refused() {
        let matrix = locked();
        let (client, mut rx) = connect(&matrix);
        let err = run(&matrix, &client, "PASS nope").expect_err("mismatch");
        assert!(matches!(err, HandlerError::AccessDenied(ref r) if r == "Bad password"));
        assert_eq!(codes(&mut rx), vec!["464"]);
        assert_eq!(client.state(), ClientState::AwaitingPassword);
    }

    #[tokio::test]
    async fn nick_before_pass_is_out_of_sequence() {
        let matrix = locked();
        let (client, _rx) = connect(&matrix);
        assert!(matches!(
            run(&matrix, &client, "NICK alice"),
            Err(HandlerError::NotRegistered)
        ));
    }

    #[tokio::test]
    async fn pass_twice_is_rejected() {
        let matrix = locked();
        let (client, _rx) = connect(&matrix);
        run(&matrix, &client, "PASS sesame").expect("pass");
        assert!(matches!(
            run(&matrix, &client, "PASS sesame"),
            Err(HandlerError::AlreadyRegistered)
        ));
    }
}
