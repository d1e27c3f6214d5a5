//! IRC command handlers.
//!
//! This module contains the Handler trait and the command registry that
//! dispatches parsed messages to handlers. Handlers run synchronously on
//! the connection's dispatch task and never block: all output goes through
//! non-blocking queues.

mod channel;
mod connection;
mod helpers;
mod messaging;
mod mode;
mod oper;
mod server_query;
mod user_query;

pub use helpers::{server_notice, server_reply};

pub use channel::{
    InviteHandler, JoinHandler, KickHandler, ListHandler, NamesHandler, PartHandler, TopicHandler,
    paginate_names, send_names,
};
pub use connection::{
    NickHandler, PassHandler, PingHandler, PongHandler, QuitHandler, UserHandler, send_motd,
    send_welcome_burst,
};
pub use messaging::{NoticeHandler, PrivmsgHandler};
pub use mode::ModeHandler;
pub use oper::OperHandler;
pub use server_query::{InfoHandler, MotdHandler, StatsHandler, TimeHandler, VersionHandler};
pub use user_query::WhoisHandler;

use crate::error::{HandlerError, HandlerResult};
use crate::state::{Client, ClientState, Matrix};
use lirc_proto::{Message, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The client that sent the message.
    pub client: &'a Arc<Client>,
    /// Shared server state.
    pub matrix: &'a Arc<Matrix>,
    /// Command registry (for STATS m command usage tracking).
    pub registry: &'a Registry,
}

impl Context<'_> {
    pub fn server_name(&self) -> &str {
        &self.matrix.server_info.name
    }

    /// Send a numeric reply addressed to this client.
    ///
    /// `params` excludes the leading nickname, which is filled in here.
    pub fn reply(&self, response: Response, params: Vec<String>) {
        let mut full = Vec::with_capacity(params.len() + 1);
        full.push(self.client.nick_or_star());
        full.extend(params);
        self.client.send(server_reply(self.server_name(), response, full));
    }
}

/// Trait implemented by all command handlers.
pub trait Handler: Send + Sync {
    /// Handle an incoming message.
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;
}

/// When a command may be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Any state; the handler enforces its own preconditions.
    Any,
    /// Only once the client is `Active`; earlier attempts get 451.
    Registered,
}

struct Entry {
    phase: Phase,
    min_args: usize,
    handler: Box<dyn Handler>,
}

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Entry>,
    /// Command usage counters for STATS m
    command_counts: HashMap<&'static str, AtomicU64>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            command_counts: HashMap::new(),
        };

        // Connection/registration handlers
        registry.insert("PASS", Phase::Any, 1, PassHandler);
        registry.insert("NICK", Phase::Any, 0, NickHandler);
        registry.insert("USER", Phase::Any, 4, UserHandler);
        registry.insert("PING", Phase::Any, 0, PingHandler);
        registry.insert("PONG", Phase::Any, 0, PongHandler);
        registry.insert("QUIT", Phase::Any, 0, QuitHandler);

        // Channel handlers
        registry.insert("JOIN", Phase::Registered, 1, JoinHandler);
        registry.insert("PART", Phase::Registered, 1, PartHandler);
        registry.insert("TOPIC", Phase::Registered, 1, TopicHandler);
        registry.insert("NAMES", Phase::Registered, 0, NamesHandler);
        registry.insert("LIST", Phase::Registered, 0, ListHandler);
        registry.insert("KICK", Phase::Registered, 2, KickHandler);
        registry.insert("INVITE", Phase::Registered, 2, InviteHandler);
        registry.insert("MODE", Phase::Registered, 1, ModeHandler);

        // Messaging handlers
        registry.insert("PRIVMSG", Phase::Registered, 0, PrivmsgHandler);
        registry.insert("NOTICE", Phase::Registered, 0, NoticeHandler);

        // Query handlers
        registry.insert("WHOIS", Phase::Registered, 1, WhoisHandler);
        registry.insert("VERSION", Phase::Registered, 0, VersionHandler);
        registry.insert("TIME", Phase::Registered, 0, TimeHandler);
        registry.insert("INFO", Phase::Registered, 0, InfoHandler);
        registry.insert("MOTD", Phase::Registered, 0, MotdHandler);
        registry.insert("STATS", Phase::Registered, 0, StatsHandler);

        // Operator handlers
        registry.insert("OPER", Phase::Registered, 2, OperHandler);

        registry
    }

    fn insert(&mut self, command: &'static str, phase: Phase, min_args: usize, handler: impl Handler + 'static) {
        self.handlers.insert(
            command,
            Entry {
                phase,
                min_args,
                handler: Box::new(handler),
            },
        );
        self.command_counts.insert(command, AtomicU64::new(0));
    }

    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Get command usage statistics for STATS m.
    pub fn get_command_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|(cmd, count)| (*cmd, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }

    /// Dispatch a message to the appropriate handler.
    ///
    /// Command tags are matched case-sensitively.
    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(entry) = self.handlers.get(msg.command.as_str()) else {
            debug!(id = ctx.client.id(), command = %msg.command, "Unknown command");
            return Err(HandlerError::UnknownCommand(msg.command.clone()));
        };

        if let Some(counter) = self.command_counts.get(msg.command.as_str()) {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        if entry.phase == Phase::Registered && ctx.client.state() != ClientState::Active {
            return Err(HandlerError::NotRegistered);
        }
        if msg.arg_count() < entry.min_args {
            return Err(HandlerError::NeedMoreParams);
        }

        entry.handler.handle(ctx, msg)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
