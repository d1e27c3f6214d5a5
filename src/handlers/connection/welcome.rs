//! Registration welcome burst and MOTD.

use super::super::Context;
use lirc_proto::Response;

/// Send 001-004 followed by the MOTD.
pub fn send_welcome_burst(ctx: &Context<'_>) {
    let info = &ctx.matrix.server_info;
    let prefix = ctx.client.prefix();

    ctx.reply(
        Response::RPL_WELCOME,
        vec![format!("Welcome to the {} Network, {}", info.network, prefix)],
    );
    ctx.reply(
        Response::RPL_YOURHOST,
        vec![format!("Your host is {}, running version {}", info.name, info.version)],
    );
    ctx.reply(
        Response::RPL_CREATED,
        vec![format!(
            "This server was created {}",
            info.created.format("%a %b %d %Y at %H:%M:%S UTC")
        )],
    );
    ctx.reply(
        Response::RPL_MYINFO,
        vec![
            info.name.clone(),
            info.version.clone(),
            "o".to_string(),
            "agkmovG".to_string(),
        ],
    );

    send_motd(ctx);
}

/// Send the MOTD, or 422 when none is configured.
pub fn send_motd(ctx: &Context<'_>) {
    let motd = &ctx.matrix.motd;
    if motd.is_empty() {
        ctx.reply(Response::ERR_NOMOTD, vec!["MOTD File is missing".to_string()]);
        return;
    }

    ctx.reply(
        Response::RPL_MOTDSTART,
        vec![format!("- {} Message of the day - ", ctx.server_name())],
    );
    for line in motd {
        ctx.reply(Response::RPL_MOTD, vec![format!("- {}", line)]);
    }
    ctx.reply(Response::RPL_ENDOFMOTD, vec!["End of /MOTD command.".to_string()]);
}
