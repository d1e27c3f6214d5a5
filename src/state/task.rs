//! Scheduled checks bound to a single client.
//!
//! A task is polled by the supervisor. Each evaluation first claims the
//! task by clearing its validity flag, so two evaluations never overlap.
//! A task that fires or completes stays invalid and is pruned; otherwise
//! validity is restored and the evaluation time stamped.

use super::client::{Client, ClientState};
use super::ids::ClientId;
use super::matrix::Matrix;
use lirc_proto::Message;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What a task checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Disconnect a client that has not finished registering in time.
    LoginTimeout,
    /// PING an active client that has gone quiet.
    Keepalive,
}

/// A value in a task's data bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValue {
    Instant(Instant),
    Text(String),
}

/// Result of one call to [`ScheduledTask::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Another evaluation was in flight, or the task is spent.
    Skipped,
    /// Checked; nothing to do yet.
    Pending,
    /// The terminal action ran.
    Fired,
    /// The condition can no longer occur; the task retires without firing.
    Completed,
}

const START: &str = "start";
const PROBE_SENT: &str = "probe_sent";

#[derive(Debug)]
pub struct ScheduledTask {
    kind: TaskKind,
    client: ClientId,
    data: Mutex<HashMap<&'static str, TaskValue>>,
    last: Mutex<Instant>,
    valid: AtomicBool,
}

impl ScheduledTask {
    pub fn new(kind: TaskKind, client: ClientId) -> Self {
        let now = Instant::now();
        let mut data = HashMap::new();
        data.insert(START, TaskValue::Instant(now));
        Self {
            kind,
            client,
            data: Mutex::new(data),
            // Due on the first supervisor pass.
            last: Mutex::new(now.checked_sub(Duration::from_secs(600)).unwrap_or(now)),
            valid: AtomicBool::new(true),
        }
    }

    pub fn login_timeout(client: ClientId) -> Self {
        Self::new(TaskKind::LoginTimeout, client)
    }

    pub fn keepalive(client: ClientId) -> Self {
        Self::new(TaskKind::Keepalive, client)
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub fn get(&self, key: &str) -> Option<TaskValue> {
        self.data.lock().get(key).cloned()
    }

    pub fn set(&self, key: &'static str, value: TaskValue) {
        self.data.lock().insert(key, value);
    }

    fn instant(&self, key: &str) -> Option<Instant> {
        match self.get(key) {
            Some(TaskValue::Instant(at)) => Some(at),
            _ => None,
        }
    }

    /// True once `interval` has passed since the last evaluation.
    pub fn needs_evaluation(&self, interval: Duration) -> bool {
        self.last.lock().elapsed() >= interval
    }

    pub fn evaluate(&self, client: &Client, matrix: &Matrix) -> TaskOutcome {
        if self
            .valid
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return TaskOutcome::Skipped;
        }

        let outcome = match self.kind {
            TaskKind::LoginTimeout => self.check_login(client, matrix),
            TaskKind::Keepalive => self.check_keepalive(client, matrix),
        };

        if outcome == TaskOutcome::Pending {
            *self.last.lock() = Instant::now();
            self.valid.store(true, Ordering::Release);
        }
        outcome
    }

    fn check_login(&self, client: &Client, matrix: &Matrix) -> TaskOutcome {
        let state = client.state();
        if !state.is_awaiting_identity() {
            return TaskOutcome::Completed;
        }

        let started = self.instant(START).unwrap_or_else(Instant::now);
        if started.elapsed() > matrix.config.timeouts.login_timeout() {
            info!(id = client.id(), ?state, "Registration timed out");
            matrix.disconnect(client, "Login timeout");
            return TaskOutcome::Fired;
        }
        TaskOutcome::Pending
    }

    fn check_keepalive(&self, client: &Client, matrix: &Matrix) -> TaskOutcome {
        if client.state() != ClientState::Active {
            return TaskOutcome::Completed;
        }

        if client.idle_for() < matrix.config.timeouts.ping_interval() {
            return TaskOutcome::Pending;
        }

        // One probe per quiet period.
        let last_activity = client.last_activity();
        if self.instant(PROBE_SENT).is_some_and(|sent| sent > last_activity) {
            return TaskOutcome::Pending;
        }

        debug!(id = client.id(), "Sending keepalive PING");
        client.send(Message::ping(&matrix.server_info.name));
        self.set(PROBE_SENT, TaskValue::Instant(Instant::now()));
        TaskOutcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::test_support::{connect, registered};
    use std::sync::Arc;

    fn matrix_with(login: u64, ping: u64) -> Arc<Matrix> {
        let mut config = Config::default();
        config.timeouts.login = login;
        config.timeouts.ping = ping;
        Arc::new(Matrix::new(config))
    }

    #[test]
    fn new_task_is_due_immediately() {
        let task = ScheduledTask::login_timeout(0);
        assert!(task.needs_evaluation(Duration::from_millis(350)));
        assert!(task.is_valid());
        assert!(matches!(task.get("start"), Some(TaskValue::Instant(_))));
    }

    #[tokio::test]
    async fn pending_evaluation_restores_validity_and_stamps_time() {
        let matrix = matrix_with(30, 90);
        let (client, _rx) = connect(&matrix);
        let task = ScheduledTask::login_timeout(client.id());

        assert_eq!(task.evaluate(&client, &matrix), TaskOutcome::Pending);
        assert!(task.is_valid());
        assert!(!task.needs_evaluation(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn invalid_task_is_skipped() {
        let matrix = matrix_with(0, 90);
        let (client, _rx) = connect(&matrix);
        let task = ScheduledTask::login_timeout(client.id());
        task.valid.store(false, Ordering::Release);

        assert_eq!(task.evaluate(&client, &matrix), TaskOutcome::Skipped);
        assert!(!client.is_dead());
    }

    #[tokio::test]
    async fn login_timeout_fires_once_for_unregistered_client() {
        let matrix = matrix_with(0, 90);
        let (client, _rx) = connect(&matrix);
        let task = ScheduledTask::login_timeout(client.id());
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(task.evaluate(&client, &matrix), TaskOutcome::Fired);
        assert!(client.is_dead());
        assert!(matrix.get_client(client.id()).is_none());
        assert!(!task.is_valid());
        assert_eq!(task.evaluate(&client, &matrix), TaskOutcome::Skipped);
    }

    #[tokio::test]
    async fn login_timeout_completes_once_registered() {
        let matrix = matrix_with(0, 90);
        let (client, _rx) = registered(&matrix, "alice");
        let task = ScheduledTask::login_timeout(client.id());

        assert_eq!(task.evaluate(&client, &matrix), TaskOutcome::Completed);
        assert!(!client.is_dead());
        let before = client.tasks().len();
        client.arm(task);
        client.prune_tasks();
        assert_eq!(client.tasks().len(), before);
    }

    #[tokio::test]
    async fn keepalive_probes_once_per_quiet_period() {
        let matrix = matrix_with(30, 0);
        let (client, mut rx) = registered(&matrix, "alice");
        while rx.try_recv().is_ok() {}
        let task = ScheduledTask::keepalive(client.id());

        assert_eq!(task.evaluate(&client, &matrix), TaskOutcome::Pending);
        assert_eq!(rx.try_recv().expect("probe").as_ref(), "PING :irc.lircd.local");
        assert_eq!(task.evaluate(&client, &matrix), TaskOutcome::Pending);
        assert!(rx.try_recv().is_err());

        client.record_activity();
        assert_eq!(task.evaluate(&client, &matrix), TaskOutcome::Pending);
        assert!(rx.try_recv().is_ok());
    }
}
