//! Newline-framed TCP transport built on `tokio::net`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Default upper bound on a single line, terminator excluded.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// A TCP [`Transport`] whose connections speak one message per line.
pub struct TcpLineTransport {
    listener: TcpListener,
    max_line_len: usize,
}

impl TcpLineTransport {
    /// Binds a new transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self {
            listener,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        })
    }

    /// Sets the maximum accepted line length for new connections.
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpLineTransport {
    type Connection = TcpLineConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let conn = TcpLineConnection::from_stream(stream, self.max_line_len)
            .map_err(TransportError::AcceptFailed)?;
        tracing::debug!(id = %conn.id, %addr, "accepted TCP connection");
        Ok(conn)
    }
}

/// A single newline-framed TCP connection.
///
/// The read and write halves sit behind separate locks so a task parked in
/// [`recv`](Connection::recv) does not block senders.
pub struct TcpLineConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
    max_line_len: usize,
}

impl TcpLineConnection {
    /// Wraps an established stream.
    pub fn from_stream(
        stream: TcpStream,
        max_line_len: usize,
    ) -> std::io::Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let (read, write) = stream.into_split();
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        Ok(Self {
            id,
            peer,
            reader: Mutex::new(BufReader::new(read)),
            writer: Mutex::new(write),
            max_line_len,
        })
    }

    /// Opens a client connection to `addr`.
    pub async fn connect(
        addr: impl ToSocketAddrs,
    ) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await.map_err(|e| {
            TransportError::ConnectionClosed(format!("connect failed: {e}"))
        })?;
        Self::from_stream(stream, DEFAULT_MAX_LINE_LEN)
            .map_err(TransportError::AcceptFailed)
    }

    /// Returns the remote address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpLineConnection {
    type Error = TransportError;

    async fn send(&self, line: &str) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');
        writer
            .write_all(&frame)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<String>, Self::Error> {
        let mut reader = self.reader.lock().await;
        let mut buf = Vec::new();

        // One byte of slack past the limit tells an over-long line apart
        // from one that is exactly at the limit.
        let limit = self.max_line_len as u64 + 2;
        let mut limited = (&mut *reader).take(limit);
        let read = limited
            .read_until(b'\n', &mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;

        if read == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > self.max_line_len {
            return Err(TransportError::LineTooLong(self.max_line_len));
        }

        String::from_utf8(buf)
            .map(Some)
            .map_err(|_| TransportError::InvalidEncoding)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
