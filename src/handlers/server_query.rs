//! Server query handlers: VERSION, TIME, INFO, MOTD, STATS.

use super::connection::send_motd;
use super::{Context, Handler};
use crate::error::HandlerResult;
use lirc_proto::{Message, Response};

/// Handler for VERSION command.
pub struct VersionHandler;

impl Handler for VersionHandler {
    fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        let info = &ctx.matrix.server_info;
        ctx.reply(
            Response::RPL_VERSION,
            vec![
                info.version.clone(),
                info.name.clone(),
                info.description.clone(),
            ],
        );
        Ok(())
    }
}

/// Handler for TIME command.
pub struct TimeHandler;

impl Handler for TimeHandler {
    fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        let now = chrono::Utc::now();
        ctx.reply(
            Response::RPL_TIME,
            vec![
                ctx.server_name().to_string(),
                now.format("%A %B %d %Y -- %H:%M:%S UTC").to_string(),
            ],
        );
        Ok(())
    }
}

/// Handler for INFO command.
pub struct InfoHandler;

impl Handler for InfoHandler {
    fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        let info = &ctx.matrix.server_info;
        let lines = [
            format!("{} ({})", info.version, info.description),
            format!("Network: {}", info.network),
            format!("Started: {}", info.created.format("%Y-%m-%d %H:%M:%S UTC")),
            format!(
                "Clients: {}, channels: {}",
                ctx.matrix.clients.len(),
                ctx.matrix.channels.len()
            ),
        ];
        for line in lines {
            ctx.reply(Response::RPL_INFO, vec![line]);
        }
        ctx.reply(Response::RPL_ENDOFINFO, vec!["End of /INFO list".to_string()]);
        Ok(())
    }
}

/// Handler for MOTD command.
pub struct MotdHandler;

impl Handler for MotdHandler {
    fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        send_motd(ctx);
        Ok(())
    }
}

/// Handler for STATS command.
///
/// `STATS m` lists per-command usage; other letters only end the report.
pub struct StatsHandler;

impl Handler for StatsHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let query = msg.arg(0).unwrap_or("*");

        if query == "m" {
            for (command, count) in ctx.registry.get_command_stats() {
                ctx.reply(
                    Response::RPL_STATSCOMMANDS,
                    vec![command.to_string(), count.to_string()],
                );
            }
        }

        ctx.reply(
            Response::RPL_ENDOFSTATS,
            vec![query.to_string(), "End of /STATS report".to_string()],
        );
        Ok(())
    }
}
