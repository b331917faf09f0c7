//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Broadside match server. It ties
//! the layers together: transport → protocol → coordinator (session,
//! game, ledger).

use std::path::PathBuf;
use std::sync::Arc;

use broadside_game::FleetRules;
use broadside_ledger::ScoreLedger;
use broadside_protocol::{LineCodec, TextCodec};
use broadside_transport::{DEFAULT_MAX_LINE_LEN, TcpLineTransport, Transport};

use crate::BroadsideError;
use crate::coordinator::Coordinator;
use crate::handler::handle_connection;

/// Listen address used when none is configured.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Builder for configuring and starting a Broadside server.
///
/// # Example
///
/// ```rust,no_run
/// use broadside::prelude::*;
///
/// # async fn start() -> Result<(), BroadsideError> {
/// let server = Server::builder()
///     .bind("0.0.0.0:5000")
///     .scores_path("scores.json")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServerBuilder {
    bind_addr: String,
    rules: FleetRules,
    scores_path: Option<PathBuf>,
    max_line_len: usize,
}

impl ServerBuilder {
    /// Default settings: classic fleet, `scores.json` in the working
    /// directory, 64 KiB line limit.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            rules: FleetRules::default(),
            scores_path: Some(PathBuf::from("scores.json")),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Board size and fleet composition for every match.
    pub fn rules(mut self, rules: FleetRules) -> Self {
        self.rules = rules;
        self
    }

    /// File the score ledger is loaded from and saved to.
    pub fn scores_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scores_path = Some(path.into());
        self
    }

    /// Keeps scores in memory only. Mostly useful for tests.
    pub fn in_memory_scores(mut self) -> Self {
        self.scores_path = None;
        self
    }

    /// Longest accepted request line, in bytes.
    pub fn max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Binds the listener and loads the ledger, speaking the text protocol.
    pub async fn build(self) -> Result<Server<TextCodec>, BroadsideError> {
        self.build_with_codec(TextCodec).await
    }

    /// Like [`build`](Self::build) with a custom line codec.
    ///
    /// # Errors
    /// Invalid fleet rules, or a port that cannot be bound.
    pub async fn build_with_codec<K: LineCodec>(
        self,
        codec: K,
    ) -> Result<Server<K>, BroadsideError> {
        let rules = FleetRules::new(self.rules.board_size, self.rules.ship_lengths)?;

        let transport = TcpLineTransport::bind(&self.bind_addr)
            .await?
            .with_max_line_len(self.max_line_len);

        let ledger = match self.scores_path {
            Some(path) => ScoreLedger::load(path).await,
            None => ScoreLedger::in_memory(),
        };

        tracing::info!(
            board_size = rules.board_size,
            ships = ?rules.ship_lengths,
            "match rules"
        );

        Ok(Server {
            transport,
            coordinator: Arc::new(Coordinator::new(rules, ledger)),
            codec: Arc::new(codec),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Broadside server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<K: LineCodec = TextCodec> {
    transport: TcpLineTransport,
    coordinator: Arc<Coordinator>,
    codec: Arc<K>,
}

impl Server<TextCodec> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<K: LineCodec> Server<K> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning one handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), BroadsideError> {
        tracing::info!(addr = ?self.local_addr().ok(), "broadside server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let coordinator = Arc::clone(&self.coordinator);
                    let codec = Arc::clone(&self.codec);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, coordinator, codec).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
