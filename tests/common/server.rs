//! Test server management.
//!
//! Runs a lircd instance inside the test process, bound to an ephemeral
//! port on loopback.

use lircd::config::Config;
use lircd::network::{Gateway, Supervisor};
use lircd::state::Matrix;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A test server instance. Dropping it stops the listener and supervisor.
pub struct TestServer {
    addr: SocketAddr,
    matrix: Arc<Matrix>,
    gateway: JoinHandle<()>,
    supervisor: JoinHandle<()>,
}

impl TestServer {
    /// Configuration tuned for tests: quick task ticks and a generous rate.
    pub fn test_config() -> Config {
        let mut config = Config::default();
        config.server.name = "test.server".to_string();
        config.server.network = "TestNet".to_string();
        config.server.description = "Test Server".to_string();
        config.listen.address = SocketAddr::from(([127, 0, 0, 1], 0));
        config.timeouts.task_tick_ms = 50;
        config.timeouts.task_interval_ms = 100;
        config.rate.message_cap = 1000;
        config.motd.lines = vec!["Test Server".to_string()];
        config
    }

    /// Spawn a server with [`TestServer::test_config`].
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(Self::test_config()).await
    }

    /// Spawn a server with a custom configuration.
    pub async fn spawn_with(config: Config) -> anyhow::Result<Self> {
        let listen = config.listen.address;
        let matrix = Arc::new(Matrix::new(config));
        let supervisor = Supervisor::new(Arc::clone(&matrix)).spawn();

        let gateway = Gateway::bind(listen, Arc::clone(&matrix)).await?;
        let addr = gateway.local_addr()?;
        let gateway = tokio::spawn(async move {
            if let Err(e) = gateway.run().await {
                eprintln!("gateway stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            matrix,
            gateway,
            supervisor,
        })
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Shared state, for assertions the wire cannot express.
    #[allow(dead_code)]
    pub fn matrix(&self) -> &Arc<Matrix> {
        &self.matrix
    }

    /// Create a new test client connected to this server.
    pub async fn connect(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address(), nick).await
    }

    /// Connect and complete registration.
    #[allow(dead_code)]
    pub async fn connect_registered(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = self.connect(nick).await?;
        client.register().await?;
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.gateway.abort();
        self.supervisor.abort();
    }
}
