//! Per-connection handler: greeting, command dispatch, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn the writer task that drains the connection's outbox
//!   2. Queue `WELCOME`
//!   3. Loop: receive a line → decode → dispatch to the coordinator
//!   4. On close, `QUIT`, or a broken frame: unregister, flush, close

use std::sync::Arc;

use broadside_protocol::{ClientCommand, LineCodec, ServerMessage};
use broadside_session::Outbox;
use broadside_transport::{Connection, ConnectionId, TcpLineConnection, TransportError};
use tokio::sync::mpsc;

use crate::{BroadsideError, Coordinator};

/// Drop guard that unregisters the connection's identity if the handler
/// exits without doing so itself (an early `?` or a panic).
///
/// `Drop` is synchronous, so the async unregister runs in a
/// fire-and-forget task.
struct SessionGuard {
    conn_id: ConnectionId,
    name: Option<String>,
    coordinator: Arc<Coordinator>,
}

impl SessionGuard {
    /// Unregisters now and disarms the guard.
    async fn release(&mut self) {
        if let Some(name) = self.name.take() {
            self.coordinator.disconnect(self.conn_id, &name).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            let conn_id = self.conn_id;
            let coordinator = Arc::clone(&self.coordinator);
            tokio::spawn(async move {
                coordinator.disconnect(conn_id, &name).await;
            });
        }
    }
}

/// What the read loop does after a command.
enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<K: LineCodec>(
    conn: TcpLineConnection,
    coordinator: Arc<Coordinator>,
    codec: Arc<K>,
) -> Result<(), BroadsideError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, peer = %conn.peer_addr(), "connection opened");

    let (outbox, inbox) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), inbox, codec.clone()));
    let _ = outbox.send(ServerMessage::Welcome);

    let mut guard = SessionGuard {
        conn_id,
        name: None,
        coordinator: Arc::clone(&coordinator),
    };

    loop {
        let line = match conn.recv().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(TransportError::InvalidEncoding) => {
                // The bad line was consumed whole, so framing still holds.
                let _ = outbox.send(ServerMessage::error(TransportError::InvalidEncoding));
                continue;
            }
            Err(e @ TransportError::LineTooLong(_)) => {
                tracing::warn!(%conn_id, error = %e, "dropping connection");
                let _ = outbox.send(ServerMessage::error(&e));
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let command = match codec.decode(&line) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "undecodable line");
                let _ = outbox.send(ServerMessage::error(e));
                continue;
            }
        };

        match dispatch(&coordinator, &mut guard, &outbox, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Close) => break,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "command rejected");
                let _ = outbox.send(ServerMessage::error(e));
            }
        }
    }

    guard.release().await;
    // Once our sender is gone and the registry has let go of its clone,
    // the writer drains what is queued and exits.
    drop(outbox);
    match writer.await {
        Ok(Err(e)) => tracing::debug!(%conn_id, error = %e, "writer stopped early"),
        Err(e) => tracing::warn!(%conn_id, error = %e, "writer task failed"),
        Ok(Ok(())) => {}
    }
    conn.close().await?;
    tracing::info!(%conn_id, "connection closed");
    Ok(())
}

/// Runs one command on behalf of the connection.
async fn dispatch(
    coordinator: &Coordinator,
    guard: &mut SessionGuard,
    outbox: &Outbox,
    command: ClientCommand,
) -> Result<Flow, BroadsideError> {
    let conn_id = guard.conn_id;
    match command {
        ClientCommand::Join { name, role } => {
            if let Some(current) = &guard.name {
                return Err(BroadsideError::AlreadyJoined(current.clone()));
            }
            coordinator.join(conn_id, outbox, &name, role).await?;
            guard.name = Some(name);
        }
        ClientCommand::Reconnect { name } => {
            if let Some(current) = &guard.name {
                return Err(BroadsideError::AlreadyJoined(current.clone()));
            }
            coordinator.reconnect(conn_id, outbox, &name).await?;
            guard.name = Some(name);
        }
        ClientCommand::Ready { fleet } => {
            let name = guard.name.as_deref().ok_or(BroadsideError::NotJoined)?;
            coordinator.ready(conn_id, name, fleet).await?;
        }
        ClientCommand::Play { x, y } => {
            let name = guard.name.as_deref().ok_or(BroadsideError::NotJoined)?;
            coordinator.play(conn_id, name, x, y).await?;
        }
        ClientCommand::Quit => {
            let _ = outbox.send(ServerMessage::info("bye"));
            return Ok(Flow::Close);
        }
    }
    Ok(Flow::Continue)
}

/// Drains the outbox to the socket until every sender is gone.
async fn write_loop<K: LineCodec>(
    conn: Arc<TcpLineConnection>,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
    codec: Arc<K>,
) -> Result<(), BroadsideError> {
    while let Some(message) = inbox.recv().await {
        let line = match codec.encode(&message) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "message not encodable");
                continue;
            }
        };
        conn.send(&line).await?;
    }
    Ok(())
}
