//! Periodic housekeeping over every connected client.
//!
//! Two timers drive it: the rate window, which also checks for dead peers
//! and overflowing send queues, and the task tick, which evaluates each
//! client's scheduled tasks.

use crate::state::{Client, Matrix};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument};

pub struct Supervisor {
    matrix: Arc<Matrix>,
}

impl Supervisor {
    pub fn new(matrix: Arc<Matrix>) -> Self {
        Self { matrix }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    #[instrument(skip(self), name = "supervisor")]
    pub async fn run(self) {
        let mut window = interval(self.matrix.config.rate.window());
        window.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick = interval(self.matrix.config.timeouts.task_tick());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Both intervals complete their first tick immediately.
        window.tick().await;

        loop {
            tokio::select! {
                _ = window.tick() => self.check_clients(),
                _ = tick.tick() => self.run_tasks(),
            }
        }
    }

    /// Enforce ping timeout, send queue overflow and the message rate, then
    /// open a fresh rate window.
    pub fn check_clients(&self) {
        let config = &self.matrix.config;
        for client in self.matrix.clients_snapshot() {
            if client.is_dead() {
                continue;
            }
            if let Some(reason) = self.verdict(&client) {
                info!(id = client.id(), reason, "Supervisor dropping client");
                self.matrix.disconnect(&client, reason);
                continue;
            }
            let count = client.reset_message_count();
            if count > config.rate.message_cap {
                info!(id = client.id(), count, "Message rate exceeded");
                self.matrix.disconnect(&client, "Rate limiting");
            }
        }
    }

    fn verdict(&self, client: &Client) -> Option<&'static str> {
        if client.idle_for() > self.matrix.config.timeouts.ping_timeout() {
            Some("Ping timeout")
        } else if client.sendq_exceeded() {
            Some("SendQ exceeded")
        } else {
            None
        }
    }

    /// Evaluate every due task, then drop the spent ones.
    pub fn run_tasks(&self) {
        let interval = self.matrix.config.timeouts.task_interval();
        for client in self.matrix.clients_snapshot() {
            for task in client.tasks() {
                if task.needs_evaluation(interval) {
                    let outcome = task.evaluate(&client, &self.matrix);
                    debug!(id = client.id(), kind = ?task.kind(), ?outcome, "Task evaluated");
                }
            }
            client.prune_tasks();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::test_support::{connect, registered};
    use std::time::Duration;

    fn supervisor(config: Config) -> (Supervisor, Arc<Matrix>) {
        let matrix = Arc::new(Matrix::new(config));
        (Supervisor::new(Arc::clone(&matrix)), matrix)
    }

    #[tokio::test]
    async fn silent_clients_time_out() {
        let mut config = Config::default();
        config.timeouts.timeout = 0;
        let (supervisor, matrix) = supervisor(config);
        let (client, _rx) = registered(&matrix, "alice");
        std::thread::sleep(Duration::from_millis(5));

        supervisor.check_clients();
        assert!(client.is_dead());
        assert!(matrix.find_by_nickname("alice").is_none());
    }

    #[tokio::test]
    async fn rate_window_resets_counter() {
        let (supervisor, matrix) = supervisor(Config::default());
        let (client, _rx) = registered(&matrix, "alice");
        for _ in 0..matrix.config.rate.message_cap {
            client.record_activity();
        }

        supervisor.check_clients();
        assert!(!client.is_dead());
        assert_eq!(client.reset_message_count(), 0);
    }

    #[tokio::test]
    async fn flooding_clients_are_dropped() {
        let (supervisor, matrix) = supervisor(Config::default());
        let (client, _rx) = registered(&matrix, "alice");
        for _ in 0..=matrix.config.rate.message_cap {
            client.record_activity();
        }

        supervisor.check_clients();
        assert!(client.is_dead());
    }

    #[tokio::test]
    async fn overflowing_send_queue_drops_client() {
        let mut config = Config::default();
        config.limits.sendq_capacity = 1;
        let (supervisor, matrix) = supervisor(config);
        let (client, _rx) = registered(&matrix, "alice");
        client.send_line(Arc::from("one"));
        client.send_line(Arc::from("two"));
        assert!(client.sendq_exceeded());

        supervisor.check_clients();
        assert!(client.is_dead());
    }

    #[tokio::test]
    async fn task_tick_fires_login_timeout_and_prunes() {
        let mut config = Config::default();
        config.timeouts.login = 0;
        let (supervisor, matrix) = supervisor(config);
        let (client, _rx) = connect(&matrix);
        std::thread::sleep(Duration::from_millis(5));

        supervisor.run_tasks();
        assert!(client.is_dead());
        assert!(client.tasks().is_empty());
    }
}
