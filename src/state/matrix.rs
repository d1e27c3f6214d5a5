//! The Matrix - central shared state for the server.
//!
//! Holds every client, channel and nickname in concurrent maps reachable
//! from any task. Lookups clone the `Arc` out of the map before acting so
//! no shard guard is held across another map operation.

use super::channel::{Channel, JoinOutcome};
use super::client::{Client, ClientState};
use super::dashmap_ext::DashMapExt;
use super::ids::{ClientId, IdAllocator};
use super::sanitizer::{NickSanitizer, Sanitizer};
use super::task::ScheduledTask;
use crate::config::{Config, OperBlock};
use crate::error::{ChannelError, HandlerError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lirc_proto::{irc_to_lower, ChannelPrefix, Message};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Attempts at joining before giving up on a channel that keeps being torn
/// down underneath us.
const JOIN_ATTEMPTS: usize = 3;

/// This server's identity information.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub network: String,
    pub description: String,
    pub version: String,
    pub created: DateTime<Utc>,
}

/// The Matrix - central shared state container.
pub struct Matrix {
    /// All connected clients, indexed by identity.
    pub clients: DashMap<ClientId, Arc<Client>>,

    /// All channels, indexed by case-folded name.
    pub channels: DashMap<String, Arc<Channel>>,

    /// Case-folded nickname to identity.
    pub nicks: DashMap<String, ClientId>,

    pub ids: IdAllocator,

    pub server_info: ServerInfo,

    pub config: Config,

    /// MOTD lines, loaded once at startup.
    pub motd: Vec<String>,

    sanitizer: Box<dyn Sanitizer>,
}

impl Matrix {
    pub fn new(config: Config) -> Self {
        let server_info = ServerInfo {
            name: config.server.name.clone(),
            network: config.server.network.clone(),
            description: config.server.description.clone(),
            version: format!("lircd-{}", env!("CARGO_PKG_VERSION")),
            created: Utc::now(),
        };
        let motd = config.motd.load_lines();
        let sanitizer = Box::new(NickSanitizer::new(config.limits.nick_len));

        Self {
            clients: DashMap::new(),
            channels: DashMap::new(),
            nicks: DashMap::new(),
            ids: IdAllocator::new(),
            server_info,
            config,
            motd,
            sanitizer,
        }
    }

    /// Replace the nickname sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: Box<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn sanitizer(&self) -> &dyn Sanitizer {
        self.sanitizer.as_ref()
    }

    /// The identity the next registered client will receive.
    pub fn next_identity(&self) -> ClientId {
        self.ids.peek()
    }

    // ------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------

    /// Register a freshly accepted connection and arm its login timeout.
    pub fn register_client(
        &self,
        addr: SocketAddr,
        outbox: mpsc::Sender<Arc<str>>,
        mailbox: mpsc::Sender<Message>,
    ) -> Arc<Client> {
        let id = self.ids.allocate();
        let state = if self.config.server.password.is_some() {
            ClientState::AwaitingPassword
        } else {
            ClientState::AwaitingNick
        };

        let client = Arc::new(Client::new(id, addr, state, outbox, mailbox));
        client.arm(ScheduledTask::login_timeout(id));
        self.clients.insert(id, Arc::clone(&client));
        debug!(id, %addr, ?state, "Client registered");
        client
    }

    pub fn get_client(&self, id: ClientId) -> Option<Arc<Client>> {
        self.clients.get_cloned(&id)
    }

    pub fn find_by_nickname(&self, nick: &str) -> Option<Arc<Client>> {
        let id = self.nicks.get_cloned(irc_to_lower(nick).as_str())?;
        self.get_client(id)
    }

    /// Snapshot of all clients.
    pub fn clients_snapshot(&self) -> Vec<Arc<Client>> {
        self.clients.values_cloned()
    }

    /// Atomically claim `nick` for `client`.
    ///
    /// A client may re-claim its own nickname under a different case.
    /// Returns the previous nickname, if any.
    pub fn claim_nickname(&self, client: &Client, nick: &str) -> Result<Option<String>, HandlerError> {
        let folded = irc_to_lower(nick);
        let inserted = match self.nicks.entry(folded.clone()) {
            Entry::Occupied(entry) if *entry.get() != client.id() => {
                return Err(HandlerError::NicknameInUse(nick.to_string()));
            }
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(client.id());
                true
            }
        };

        let old = {
            let mut session = client.session_mut();
            if session.state == ClientState::Dead {
                drop(session);
                // Teardown only releases the nick it saw on the session.
                if inserted {
                    self.nicks.remove_if(&folded, |_, owner| *owner == client.id());
                }
                return Err(HandlerError::Ignored("client is disconnected"));
            }
            session.nick.replace(nick.to_string())
        };
        if let Some(old) = &old {
            let old_folded = irc_to_lower(old);
            if old_folded != folded {
                self.nicks.remove_if(&old_folded, |_, id| *id == client.id());
            }
        }
        Ok(old)
    }

    /// Unregister whichever client holds `id`, freeing the identity and
    /// nickname. Idempotent.
    pub fn remove_client(&self, id: ClientId) -> Option<Arc<Client>> {
        let (_, client) = self.clients.remove(&id)?;
        self.release(&client);
        Some(client)
    }

    /// Unregister `client` itself. A later client that was handed the same
    /// identity is left alone. Returns whether anything was removed.
    fn unregister(&self, client: &Client) -> bool {
        let removed = self
            .clients
            .remove_if(&client.id(), |_, current| std::ptr::eq(Arc::as_ptr(current), client));
        match removed {
            Some((_, client)) => {
                self.release(&client);
                true
            }
            None => false,
        }
    }

    fn release(&self, client: &Client) {
        let id = client.id();
        if let Some(nick) = client.nick() {
            self.nicks.remove_if(&irc_to_lower(&nick), |_, owner| *owner == id);
        }
        self.ids.release(id);
    }

    /// Tear a client down: close the link, leave every channel, tell peers.
    ///
    /// Takes the client itself rather than its identity, which may already
    /// belong to a newer connection. Returns false if `client` was already
    /// disconnected.
    pub fn disconnect(&self, client: &Client, reason: &str) -> bool {
        if !client.mark_dead() {
            return false;
        }
        let id = client.id();

        client.send(Message::error(&format!(
            "Closing Link: {} ({})",
            client.host(),
            reason
        )));

        let quit = Message::quit(reason).with_prefix(client.prefix());
        self.announce_to_peers(client, &quit);

        let joined: Vec<String> = client.session_mut().channels.drain().collect();
        for name in &joined {
            let Some(channel) = self.channels.get_cloned(name.as_str()) else {
                continue;
            };
            if let Ok(outcome) = channel.part(id) {
                if outcome.defunct {
                    self.remove_channel(&channel);
                }
            }
        }

        client.cancellation().cancel();
        self.unregister(client);
        info!(id, nick = ?client.nick(), %reason, channels = joined.len(), "Client disconnected");
        true
    }

    /// Send `msg` once to every client sharing a channel with `client`.
    ///
    /// Each recipient is reached through exactly one of the shared channels'
    /// queues, so the line is ordered with that channel's other traffic.
    pub fn announce_to_peers(&self, client: &Client, msg: &Message) {
        let names: Vec<String> = client.session().channels.iter().cloned().collect();
        let mut seen: HashSet<ClientId> = HashSet::from([client.id()]);
        let mut targets: HashMap<String, (Arc<Channel>, Vec<ClientId>)> = HashMap::new();

        for name in names {
            let Some(channel) = self.channels.get_cloned(name.as_str()) else {
                continue;
            };
            let fresh: Vec<ClientId> = channel
                .member_ids()
                .into_iter()
                .filter(|id| seen.insert(*id))
                .collect();
            if !fresh.is_empty() {
                targets.insert(name, (channel, fresh));
            }
        }

        for (channel, ids) in targets.into_values() {
            channel.broadcast_to(msg, ids);
        }
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(irc_to_lower(name).as_str())
    }

    pub fn find_channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.get_cloned(irc_to_lower(name).as_str())
    }

    /// Snapshot of all channels.
    pub fn channels_snapshot(&self) -> Vec<Arc<Channel>> {
        self.channels.values_cloned()
    }

    /// Create `name` under `prefix` unless it already exists.
    ///
    /// `name` is the bare name without the prefix character.
    pub fn create_channel(&self, prefix: ChannelPrefix, name: &str) -> (Arc<Channel>, bool) {
        let full = format!("{}{}", prefix.as_char(), name);
        let mut created = false;
        let channel = self
            .channels
            .entry(irc_to_lower(&full))
            .or_insert_with(|| {
                created = true;
                Channel::spawn(prefix, &full, self.config.limits.max_channel_members)
            })
            .clone();
        if created {
            info!(channel = %full, "Channel created");
        }
        (channel, created)
    }

    /// Look up a channel by its full name, creating it if needed.
    pub fn get_or_create_channel(&self, name: &str) -> Result<(Arc<Channel>, bool), ChannelError> {
        let (prefix, bare) = ChannelPrefix::split(name).ok_or(ChannelError::NoSuchChannel)?;
        Ok(self.create_channel(prefix, bare))
    }

    /// Unregister a channel and stop its broadcast task.
    pub fn remove_channel(&self, channel: &Arc<Channel>) {
        channel.shutdown();
        let removed = self
            .channels
            .remove_if(&channel.lookup_key(), |_, current| Arc::ptr_eq(current, channel))
            .is_some();
        if removed {
            info!(channel = %channel.name(), "Channel removed");
        }
    }

    /// Join `client` to `name`, creating the channel on first use.
    pub fn join_channel(
        &self,
        client: &Arc<Client>,
        name: &str,
        key: Option<&str>,
    ) -> Result<(Arc<Channel>, JoinOutcome), ChannelError> {
        let folded = irc_to_lower(name);
        if client.session().channels.contains(&folded) {
            if let Some(channel) = self.find_channel(name) {
                return Ok((channel, JoinOutcome::AlreadyMember));
            }
        }
        if client.channel_count() >= self.config.limits.max_channels_per_client {
            return Err(ChannelError::TooManyChannels);
        }

        for _ in 0..JOIN_ATTEMPTS {
            let (channel, created) = self.get_or_create_channel(name)?;
            match channel.join(client, key) {
                Ok(outcome) => return Ok((channel, outcome)),
                Err(ChannelError::Defunct) => {
                    self.remove_channel(&channel);
                }
                Err(err) => {
                    if created && channel.retire_if_empty() {
                        self.remove_channel(&channel);
                    }
                    return Err(err);
                }
            }
        }
        Err(ChannelError::Defunct)
    }

    /// Remove `client` from `name`, tell the remaining members, and drop
    /// the channel if it emptied.
    pub fn part_channel(
        &self,
        client: &Client,
        name: &str,
        reason: Option<&str>,
    ) -> Result<(), ChannelError> {
        let channel = self.find_channel(name).ok_or(ChannelError::NoSuchChannel)?;
        let outcome = channel.part(client.id())?;
        client.session_mut().channels.remove(&channel.lookup_key());

        let msg = Message::part(channel.name(), reason).with_prefix(client.prefix());
        client.send(msg.clone());
        if outcome.defunct {
            self.remove_channel(&channel);
        } else {
            channel.broadcast(&msg, None);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    pub fn find_oper(&self, name: &str) -> Option<&OperBlock> {
        self.config.oper.iter().find(|block| block.name == name)
    }
}

impl std::fmt::Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matrix")
            .field("server", &self.server_info.name)
            .field("clients", &self.clients.len())
            .field("channels", &self.channels.len())
            .finish()
    }
}
