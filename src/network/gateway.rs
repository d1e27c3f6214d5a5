//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listening socket and spawns a Connection for each
//! incoming client. Every accepted socket is registered with the Matrix
//! before any of its input is read.

use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::Matrix;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, instrument};

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, matrix: Arc<Matrix>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(address = %listener.local_addr()?, "Listener bound");

        Ok(Self {
            listener,
            matrix,
            registry: Arc::new(Registry::new()),
        })
    }

    /// Address actually bound; differs from the configured one for port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        error!(%addr, error = %e, "Failed to set TCP_NODELAY");
                    }
                    self.admit(stream, addr);
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    // Usually fd exhaustion; back off instead of spinning.
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    fn admit(&self, stream: tokio::net::TcpStream, addr: SocketAddr) {
        let limits = &self.matrix.config.limits;
        let (outbox_tx, outbox_rx) = mpsc::channel(limits.sendq_capacity.max(1));
        let (mailbox_tx, mailbox_rx) = mpsc::channel(limits.mailbox_capacity.max(1));

        let client = self.matrix.register_client(addr, outbox_tx, mailbox_tx);
        info!(id = client.id(), %addr, "Connection accepted");

        let connection = Connection::new(
            client,
            stream,
            outbox_rx,
            mailbox_rx,
            Arc::clone(&self.matrix),
            Arc::clone(&self.registry),
        );
        tokio::spawn(connection.run());
    }
}
