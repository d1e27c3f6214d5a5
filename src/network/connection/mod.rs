//! Connection handling.
//!
//! Each accepted socket runs three tasks: a reader that frames and parses
//! input into the client's mailbox, a dispatcher that runs commands in
//! arrival order, and a writer that drains the outbox to the socket. All
//! three stop when the client's cancellation token fires.

mod error_handling;

use crate::handlers::{Context, Registry};
use crate::state::{Client, Matrix};
use error_handling::{ReadErrorAction, classify_read_error, handle_handler_error};
use futures_util::{SinkExt, StreamExt};
use lirc_proto::{LineCodec, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, instrument, warn};

/// Upper bound on one socket write, and on the final flush at shutdown.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// A client connection handler.
pub struct Connection {
    client: Arc<Client>,
    stream: TcpStream,
    outbox: mpsc::Receiver<Arc<str>>,
    mailbox: mpsc::Receiver<Message>,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
}

impl Connection {
    pub fn new(
        client: Arc<Client>,
        stream: TcpStream,
        outbox: mpsc::Receiver<Arc<str>>,
        mailbox: mpsc::Receiver<Message>,
        matrix: Arc<Matrix>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            client,
            stream,
            outbox,
            mailbox,
            matrix,
            registry,
        }
    }

    /// Run the connection until the client is disconnected.
    #[instrument(skip(self), fields(id = self.client.id(), addr = %self.client.addr()), name = "connection")]
    pub async fn run(self) {
        let Self {
            client,
            stream,
            outbox,
            mailbox,
            matrix,
            registry,
        } = self;
        let (reader, writer) = stream.into_split();

        let read = tokio::spawn(read_loop(reader, Arc::clone(&client), Arc::clone(&matrix)));
        let dispatch = tokio::spawn(dispatch_loop(
            mailbox,
            Arc::clone(&client),
            Arc::clone(&matrix),
            registry,
        ));
        let write = tokio::spawn(write_loop(writer, outbox, Arc::clone(&client), Arc::clone(&matrix)));

        let (read, dispatch, write) = tokio::join!(read, dispatch, write);
        for (task, result) in [("reader", read), ("dispatch", dispatch), ("writer", write)] {
            if let Err(e) = result {
                warn!(task, error = %e, "Connection task failed");
            }
        }

        // No-op if one of the tasks already tore the client down.
        matrix.disconnect(&client, "Connection closed");
        info!("Connection closed");
    }
}

/// Frame, rate-check and parse inbound lines into the mailbox.
async fn read_loop<R>(reader: R, client: Arc<Client>, matrix: Arc<Matrix>)
where
    R: AsyncRead + Unpin,
{
    let cancel = client.cancellation().clone();
    let cap = matrix.config.rate.message_cap;
    let mut lines = FramedRead::new(reader, LineCodec::new());

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.next() => next,
        };

        let line = match next {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                match classify_read_error(&e) {
                    ReadErrorAction::LineTooLong => {
                        info!(id = client.id(), error = %e, "Dropping client for overlong line");
                        matrix.disconnect(&client, "Line too long");
                    }
                    ReadErrorAction::IoError => {
                        warn!(id = client.id(), error = %e, "Read error");
                        matrix.disconnect(&client, "Read error");
                    }
                }
                break;
            }
            None => {
                matrix.disconnect(&client, "Connection closed");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        if client.record_activity() > cap {
            info!(id = client.id(), cap, "Message rate exceeded");
            matrix.disconnect(&client, "Rate limiting");
            break;
        }

        let msg = match line.parse::<Message>() {
            Ok(msg) => msg,
            Err(e) => {
                debug!(id = client.id(), error = %e, %line, "Dropping malformed line");
                continue;
            }
        };

        // Waits while the dispatcher is behind; the mailbox is bounded.
        let sent = tokio::select! {
            _ = cancel.cancelled() => break,
            sent = client.mailbox().send(msg) => sent,
        };
        if sent.is_err() {
            break;
        }
    }
}

/// Run queued commands one at a time, in arrival order.
async fn dispatch_loop(
    mut mailbox: mpsc::Receiver<Message>,
    client: Arc<Client>,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
) {
    let cancel = client.cancellation().clone();

    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = mailbox.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        if client.is_dead() {
            break;
        }

        let mut ctx = Context {
            client: &client,
            matrix: &matrix,
            registry: &registry,
        };
        if let Err(e) = registry.dispatch(&mut ctx, &msg) {
            handle_handler_error(&matrix, &client, &msg, e);
        }
    }
}

/// Drain the outbox to the socket. On cancellation, whatever is already
/// queued (including the closing ERROR line) is flushed before shutdown.
///
/// A line taken off the outbox is always written; only the wait for the
/// next line races cancellation.
async fn write_loop<W>(
    writer: W,
    mut outbox: mpsc::Receiver<Arc<str>>,
    client: Arc<Client>,
    matrix: Arc<Matrix>,
) where
    W: AsyncWrite + Unpin,
{
    let cancel = client.cancellation().clone();
    let mut sink = FramedWrite::new(writer, LineCodec::new());

    loop {
        let line = tokio::select! {
            biased;
            line = outbox.recv() => match line {
                Some(line) => line,
                None => break,
            },
            _ = cancel.cancelled() => break,
        };

        match timeout(WRITE_TIMEOUT, sink.send(line)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(id = client.id(), error = %e, "Write error");
                matrix.disconnect(&client, "Write error");
                return;
            }
            Err(_) => {
                warn!(id = client.id(), "Write timed out");
                matrix.disconnect(&client, "Write error");
                return;
            }
        }
    }

    let flushed = timeout(WRITE_TIMEOUT, async {
        while let Ok(line) = outbox.try_recv() {
            sink.feed(line).await?;
        }
        SinkExt::<Arc<str>>::close(&mut sink).await
    })
    .await;
    match flushed {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(id = client.id(), error = %e, "Error closing socket"),
        Err(_) => debug!(id = client.id(), "Timed out flushing final lines"),
    }
}
