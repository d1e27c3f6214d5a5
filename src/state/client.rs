//! Per-connection session state.

use super::ids::ClientId;
use super::task::ScheduledTask;
use lirc_proto::{Message, Prefix};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Registration progress of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// A shared password is configured and PASS has not been accepted yet.
    AwaitingPassword,
    AwaitingNick,
    AwaitingUser,
    Active,
    /// Terminal; nothing more is dispatched for this client.
    Dead,
}

impl ClientState {
    /// Still working through PASS/NICK/USER.
    pub fn is_awaiting_identity(self) -> bool {
        matches!(
            self,
            Self::AwaitingPassword | Self::AwaitingNick | Self::AwaitingUser
        )
    }
}

/// Mutable per-client fields, serialized behind the client's own lock.
#[derive(Debug)]
pub struct Session {
    pub state: ClientState,
    pub nick: Option<String>,
    pub user: String,
    pub mode: String,
    pub realname: String,
    /// Global operator status granted by OPER.
    pub oper: bool,
    /// Case-folded names of joined channels.
    pub channels: HashSet<String>,
    pub last_activity: Instant,
    /// Lines read in the current rate window.
    pub messages: u32,
}

impl Session {
    fn new(state: ClientState) -> Self {
        Self {
            state,
            nick: None,
            user: String::new(),
            mode: String::new(),
            realname: String::new(),
            oper: false,
            channels: HashSet::new(),
            last_activity: Instant::now(),
            messages: 0,
        }
    }
}

/// One connected client.
///
/// Immutable identity lives directly on the struct; everything that changes
/// while the connection is up lives in [`Session`]. The outbound queue is
/// drained by the connection's writer task, the mailbox by its dispatch task.
pub struct Client {
    id: ClientId,
    addr: SocketAddr,
    host: String,
    session: RwLock<Session>,
    outbox: mpsc::Sender<Arc<str>>,
    mailbox: mpsc::Sender<Message>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<Arc<ScheduledTask>>>,
    sendq_exceeded: AtomicBool,
}

impl Client {
    pub fn new(
        id: ClientId,
        addr: SocketAddr,
        state: ClientState,
        outbox: mpsc::Sender<Arc<str>>,
        mailbox: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            id,
            addr,
            host: addr.ip().to_string(),
            session: RwLock::new(Session::new(state)),
            outbox,
            mailbox,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            sendq_exceeded: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read()
    }

    pub fn session_mut(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write()
    }

    pub fn state(&self) -> ClientState {
        self.session.read().state
    }

    pub fn is_dead(&self) -> bool {
        self.state() == ClientState::Dead
    }

    pub fn nick(&self) -> Option<String> {
        self.session.read().nick.clone()
    }

    /// Nickname, or `*` before one is set; used as the target of numerics.
    pub fn nick_or_star(&self) -> String {
        self.nick().unwrap_or_else(|| "*".to_string())
    }

    pub fn is_oper(&self) -> bool {
        self.session.read().oper
    }

    /// `nick!user@host` origin for lines this client causes.
    pub fn prefix(&self) -> Prefix {
        let session = self.session.read();
        let nick = session.nick.as_deref().unwrap_or("*");
        let user = if session.user.is_empty() {
            "*"
        } else {
            session.user.as_str()
        };
        Prefix::new_user(nick, user, &self.host)
    }

    pub fn channel_count(&self) -> usize {
        self.session.read().channels.len()
    }

    /// Move to `Dead`. Returns false if the client already was.
    pub fn mark_dead(&self) -> bool {
        let mut session = self.session.write();
        if session.state == ClientState::Dead {
            return false;
        }
        session.state = ClientState::Dead;
        true
    }

    /// Stamp activity and count one inbound line. Returns the new count.
    pub fn record_activity(&self) -> u32 {
        let mut session = self.session.write();
        session.last_activity = Instant::now();
        session.messages = session.messages.saturating_add(1);
        session.messages
    }

    /// Zero the per-window line counter, returning what it held.
    pub fn reset_message_count(&self) -> u32 {
        std::mem::take(&mut self.session.write().messages)
    }

    pub fn last_activity(&self) -> Instant {
        self.session.read().last_activity
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity().elapsed()
    }

    /// Queue a message for the writer task.
    pub fn send(&self, msg: Message) {
        self.send_line(Arc::from(msg.to_string()));
    }

    /// Queue a pre-rendered line; used by broadcasts to render once.
    ///
    /// Never blocks. When the queue is full the line is dropped and the
    /// client is flagged for disconnect on the next supervisor pass.
    pub fn send_line(&self, line: Arc<str>) {
        match self.outbox.try_send(line) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                if !self.sendq_exceeded.swap(true, Ordering::AcqRel) {
                    warn!(id = self.id, "Send queue full, dropping output");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    pub fn sendq_exceeded(&self) -> bool {
        self.sendq_exceeded.load(Ordering::Acquire)
    }

    /// Sender side of the inbound mailbox, used by the reader task.
    pub fn mailbox(&self) -> &mpsc::Sender<Message> {
        &self.mailbox
    }

    /// Cancelled when the client is disconnected; every per-connection
    /// task selects on it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn arm(&self, task: ScheduledTask) {
        self.tasks.lock().push(Arc::new(task));
    }

    pub fn tasks(&self) -> Vec<Arc<ScheduledTask>> {
        self.tasks.lock().clone()
    }

    /// Drop tasks that fired or completed.
    pub fn prune_tasks(&self) {
        self.tasks.lock().retain(|task| task.is_valid());
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("state", &self.state())
            .field("nick", &self.nick())
            .finish()
    }
}
