//! Channels: membership, per-member roles, modes and the broadcast queue.
//!
//! Every channel owns a single-consumer queue drained by its own broadcast
//! task, so lines sent to a channel reach each member in the order they
//! were queued. Membership and roles live together: a member's roles exist
//! exactly as long as the membership does.

use super::client::{Client, ClientState};
use super::ids::ClientId;
use crate::error::ChannelError;
use lirc_proto::{irc_to_lower, ChannelPrefix, Message, Prefix};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::debug;

/// Per-member privileges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemberRoles {
    pub operator: bool,
    pub voice: bool,
    /// Present but left out of member listings.
    pub ghost: bool,
}

impl MemberRoles {
    /// Display prefix: `@` operator, `+` voice, `&` global operator.
    pub fn display_prefix(&self, global_oper: bool) -> &'static str {
        if self.operator {
            "@"
        } else if self.voice {
            "+"
        } else if global_oper {
            "&"
        } else {
            ""
        }
    }

    /// May speak while the channel is moderated.
    pub fn has_voice(&self) -> bool {
        self.operator || self.voice
    }
}

/// Member role flags settable through MODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFlag {
    Operator,
    Voice,
    Ghost,
}

impl RoleFlag {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'o' => Some(Self::Operator),
            'v' => Some(Self::Voice),
            'G' => Some(Self::Ghost),
            _ => None,
        }
    }

    fn apply(self, roles: &mut MemberRoles, on: bool) {
        match self {
            Self::Operator => roles.operator = on,
            Self::Voice => roles.voice = on,
            Self::Ghost => roles.ghost = on,
        }
    }
}

/// Channel-wide mode flags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelModes {
    /// `a`: messages are relayed under an anonymous origin.
    pub anonymous: bool,
    /// `g`: the channel survives with no members.
    pub sticky: bool,
    /// `m`: only operators and voiced members may speak.
    pub moderated: bool,
}

/// Channel-wide flags settable through MODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFlag {
    Anonymous,
    Sticky,
    Moderated,
}

impl ChannelFlag {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a' => Some(Self::Anonymous),
            'g' => Some(Self::Sticky),
            'm' => Some(Self::Moderated),
            _ => None,
        }
    }
}

impl ChannelModes {
    fn set(&mut self, flag: ChannelFlag, on: bool) {
        match flag {
            ChannelFlag::Anonymous => self.anonymous = on,
            ChannelFlag::Sticky => self.sticky = on,
            ChannelFlag::Moderated => self.moderated = on,
        }
    }

    /// Mode string like `+gm`, with `k` appended when a key is set.
    pub fn as_mode_string(&self, has_key: bool) -> String {
        let mut s = String::from("+");
        if self.anonymous {
            s.push('a');
        }
        if self.sticky {
            s.push('g');
        }
        if self.moderated {
            s.push('m');
        }
        if has_key {
            s.push('k');
        }
        s
    }
}

/// Channel topic with metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub text: String,
    pub set_by: String,
    pub set_at: i64,
}

/// One membership: who, and with which roles.
#[derive(Debug, Clone)]
pub struct Member {
    id: ClientId,
    client: Weak<Client>,
    roles: MemberRoles,
}

impl Member {
    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn roles(&self) -> MemberRoles {
        self.roles
    }

    pub fn client(&self) -> Option<Arc<Client>> {
        self.client.upgrade()
    }
}

/// Result of a successful [`Channel::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(MemberRoles),
    AlreadyMember,
}

/// Result of a successful [`Channel::part`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartOutcome {
    pub remaining: usize,
    /// The channel emptied without being sticky and must be unregistered.
    pub defunct: bool,
}

#[derive(Debug)]
enum Audience {
    Members { except: Option<ClientId> },
    Only(Vec<ClientId>),
}

#[derive(Debug)]
enum Broadcast {
    Line { line: Arc<str>, audience: Audience },
    /// Wakes the loop so it can observe teardown.
    Wake,
}

#[derive(Debug, Default)]
struct ChannelState {
    members: Vec<Member>,
    /// Empty means no key.
    key: String,
    modes: ChannelModes,
    topic: Option<Topic>,
}

impl ChannelState {
    fn position(&self, id: ClientId) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }
}

/// A named broadcast group.
#[derive(Debug)]
pub struct Channel {
    prefix: ChannelPrefix,
    name: String,
    created: i64,
    max_members: usize,
    alive: AtomicBool,
    state: RwLock<ChannelState>,
    queue: mpsc::UnboundedSender<Broadcast>,
}

impl Channel {
    /// Create a channel and start its broadcast task.
    ///
    /// `name` is the full name including its prefix character.
    pub fn spawn(prefix: ChannelPrefix, name: &str, max_members: usize) -> Arc<Channel> {
        let (queue, rx) = mpsc::unbounded_channel();
        let channel = Arc::new(Channel {
            prefix,
            name: name.to_string(),
            created: chrono::Utc::now().timestamp(),
            max_members,
            alive: AtomicBool::new(true),
            state: RwLock::new(ChannelState::default()),
            queue,
        });
        tokio::spawn(Self::run(Arc::downgrade(&channel), rx));
        channel
    }

    async fn run(channel: Weak<Channel>, mut rx: mpsc::UnboundedReceiver<Broadcast>) {
        while let Some(item) = rx.recv().await {
            let Some(channel) = channel.upgrade() else {
                break;
            };
            if !channel.is_alive() {
                debug!(channel = %channel.name, "Broadcast loop stopping");
                break;
            }
            if let Broadcast::Line { line, audience } = item {
                channel.deliver(&line, &audience);
            }
        }
    }

    fn deliver(&self, line: &Arc<str>, audience: &Audience) {
        let recipients: Vec<Arc<Client>> = {
            let state = self.state.read();
            state
                .members
                .iter()
                .filter(|m| match audience {
                    Audience::Members { except } => Some(m.id) != *except,
                    Audience::Only(ids) => ids.contains(&m.id),
                })
                .filter_map(Member::client)
                .collect()
        };
        for client in recipients {
            client.send_line(Arc::clone(line));
        }
    }

    pub fn prefix(&self) -> ChannelPrefix {
        self.prefix
    }

    /// Full name as first spelled, prefix included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-folded registry key.
    pub fn lookup_key(&self) -> String {
        irc_to_lower(&self.name)
    }

    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn max_members(&self) -> usize {
        self.max_members
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Stop the broadcast task. Anything still queued is discarded.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::Release);
        let _ = self.queue.send(Broadcast::Wake);
    }

    /// Add a member. The first member of an empty channel becomes operator.
    ///
    /// The membership is recorded on the client's session under the same
    /// critical section, so a client that goes `Dead` concurrently is either
    /// refused here or finds this channel when it is torn down.
    pub fn join(&self, client: &Arc<Client>, key: Option<&str>) -> Result<JoinOutcome, ChannelError> {
        let mut state = self.state.write();
        if !self.is_alive() {
            return Err(ChannelError::Defunct);
        }
        let mut session = client.session_mut();
        if session.state == ClientState::Dead {
            return Err(ChannelError::ClientGone);
        }
        if state.position(client.id()).is_some() {
            return Ok(JoinOutcome::AlreadyMember);
        }
        if !state.key.is_empty() && key != Some(state.key.as_str()) {
            return Err(ChannelError::BadChannelKey);
        }
        if state.members.len() >= self.max_members {
            return Err(ChannelError::ChannelIsFull);
        }

        let roles = MemberRoles {
            operator: state.members.is_empty(),
            ..MemberRoles::default()
        };
        state.members.push(Member {
            id: client.id(),
            client: Arc::downgrade(client),
            roles,
        });
        session.channels.insert(self.lookup_key());
        Ok(JoinOutcome::Joined(roles))
    }

    /// Remove a member and its roles.
    pub fn part(&self, id: ClientId) -> Result<PartOutcome, ChannelError> {
        let mut state = self.state.write();
        let index = state.position(id).ok_or(ChannelError::NotOnChannel)?;
        state.members.remove(index);

        let remaining = state.members.len();
        let defunct = remaining == 0 && !state.modes.sticky;
        if defunct {
            self.alive.store(false, Ordering::Release);
        }
        Ok(PartOutcome { remaining, defunct })
    }

    /// Mark an empty, non-sticky channel defunct. Returns true if it was.
    pub fn retire_if_empty(&self) -> bool {
        let state = self.state.write();
        if state.members.is_empty() && !state.modes.sticky {
            self.alive.store(false, Ordering::Release);
            return true;
        }
        false
    }

    /// Roles of a current member; `None` means not a member.
    pub fn member_roles(&self, id: ClientId) -> Option<MemberRoles> {
        let state = self.state.read();
        state.position(id).map(|i| state.members[i].roles)
    }

    pub fn is_member(&self, id: ClientId) -> bool {
        self.state.read().position(id).is_some()
    }

    pub fn member_count(&self) -> usize {
        self.state.read().members.len()
    }

    pub fn member_ids(&self) -> Vec<ClientId> {
        self.state.read().members.iter().map(|m| m.id).collect()
    }

    /// Live member clients, in membership order.
    pub fn clients(&self) -> Vec<Arc<Client>> {
        self.state.read().members.iter().filter_map(Member::client).collect()
    }

    /// Display names of visible members, in membership order.
    pub fn display_names(&self) -> Vec<String> {
        let state = self.state.read();
        state
            .members
            .iter()
            .filter(|m| !m.roles.ghost)
            .filter_map(|m| {
                let client = m.client()?;
                let session = client.session();
                let nick = session.nick.as_deref()?;
                Some(format!("{}{}", m.roles.display_prefix(session.oper), nick))
            })
            .collect()
    }

    /// Change one member's roles. Returns false if `id` is not a member.
    pub fn set_role(&self, id: ClientId, flag: RoleFlag, on: bool) -> bool {
        let mut state = self.state.write();
        match state.position(id) {
            Some(index) => {
                flag.apply(&mut state.members[index].roles, on);
                true
            }
            None => false,
        }
    }

    pub fn modes(&self) -> ChannelModes {
        self.state.read().modes
    }

    pub fn set_flag(&self, flag: ChannelFlag, on: bool) {
        self.state.write().modes.set(flag, on);
    }

    pub fn key(&self) -> Option<String> {
        let state = self.state.read();
        (!state.key.is_empty()).then(|| state.key.clone())
    }

    pub fn set_key(&self, key: Option<&str>) {
        self.state.write().key = key.unwrap_or_default().to_string();
    }

    pub fn topic(&self) -> Option<Topic> {
        self.state.read().topic.clone()
    }

    /// Set the topic; empty text clears it.
    pub fn set_topic(&self, text: &str, set_by: &str) {
        self.state.write().topic = (!text.is_empty()).then(|| Topic {
            text: text.to_string(),
            set_by: set_by.to_string(),
            set_at: chrono::Utc::now().timestamp(),
        });
    }

    /// Relay a PRIVMSG/NOTICE from a member to everyone else.
    ///
    /// Returns `Ok(false)` when moderation silently drops the message.
    pub fn message(&self, from: &Client, command: &str, text: &str) -> Result<bool, ChannelError> {
        let (roles, modes) = {
            let state = self.state.read();
            let index = state
                .position(from.id())
                .ok_or(ChannelError::CannotSendToChan)?;
            (state.members[index].roles, state.modes)
        };

        if modes.moderated && !roles.has_voice() {
            debug!(channel = %self.name, id = from.id(), "Moderated, message dropped");
            return Ok(false);
        }

        let origin = if modes.anonymous {
            Prefix::new_user("anonymous", "anonymous", "anonymous.")
        } else {
            from.prefix()
        };
        let msg = Message::new(command, [self.name.as_str()])
            .with_trailing(text)
            .with_prefix(origin);
        self.broadcast(&msg, Some(from.id()));
        Ok(true)
    }

    /// Queue a line for every member except `except`.
    pub fn broadcast(&self, msg: &Message, except: Option<ClientId>) {
        self.enqueue(msg, Audience::Members { except });
    }

    /// Queue a line for the listed members only.
    pub fn broadcast_to(&self, msg: &Message, ids: Vec<ClientId>) {
        self.enqueue(msg, Audience::Only(ids));
    }

    fn enqueue(&self, msg: &Message, audience: Audience) {
        let line = Arc::from(msg.to_string());
        if self.queue.send(Broadcast::Line { line, audience }).is_err() {
            debug!(channel = %self.name, "Broadcast queue closed");
        }
    }
}
