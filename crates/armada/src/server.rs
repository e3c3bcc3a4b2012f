//! `ArmadaServer` builder and server loop.
//!
//! This is the entry point for running an Armada server. It ties
//! together all the layers: transport → protocol → directory → match.

use std::sync::Arc;
use std::time::Instant;

use armada_directory::PlayerDirectory;
use armada_match::{MatchConfig, MatchRegistry};
use armada_protocol::{Codec, JsonCodec};
use armada_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::ArmadaError;
use crate::discovery::DiscoveryResponder;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The two
/// registries sit behind their own mutexes; handlers that need both
/// always lock the directory first.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) directory: Mutex<PlayerDirectory>,
    pub(crate) matches: Mutex<MatchRegistry>,
    pub(crate) codec: C,
    /// Outbound envelope timestamps are milliseconds since this instant.
    pub(crate) started_at: Instant,
}

/// Builder for configuring and starting an Armada server.
///
/// # Example
///
/// ```rust,ignore
/// let server = ArmadaServer::builder()
///     .bind("0.0.0.0:8080")
///     .discovery_port(8081)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ArmadaServerBuilder {
    bind_addr: String,
    match_config: MatchConfig,
    discovery_port: Option<u16>,
}

impl ArmadaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            match_config: MatchConfig::default(),
            discovery_port: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the match configuration (turn timeout, fleet composition).
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Enables the UDP discovery responder on the given port, so LAN
    /// clients can find the server without knowing its address.
    pub fn discovery_port(mut self, port: u16) -> Self {
        self.discovery_port = Some(port);
        self
    }

    /// Builds the server, binding its listeners.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<ArmadaServer<JsonCodec>, ArmadaError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let game_port = transport.local_addr()?.port();

        let discovery = match self.discovery_port {
            Some(port) => Some(DiscoveryResponder::bind(port, game_port).await?),
            None => None,
        };

        let state = Arc::new(ServerState {
            directory: Mutex::new(PlayerDirectory::new()),
            matches: Mutex::new(MatchRegistry::new(self.match_config)),
            codec: JsonCodec,
            started_at: Instant::now(),
        });

        Ok(ArmadaServer {
            transport,
            discovery,
            state,
        })
    }
}

impl Default for ArmadaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Armada server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ArmadaServer<C: Codec> {
    transport: WebSocketTransport,
    discovery: Option<DiscoveryResponder>,
    state: Arc<ServerState<C>>,
}

impl<C> ArmadaServer<C>
where
    C: Codec + Clone + 'static,
{
    /// Creates a new builder.
    pub fn builder() -> ArmadaServerBuilder {
        ArmadaServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ArmadaError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ArmadaError> {
        tracing::info!("Armada server running");

        if let Some(discovery) = self.discovery.take() {
            tokio::spawn(discovery.run());
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
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
