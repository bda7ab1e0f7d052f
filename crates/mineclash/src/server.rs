//! Server bootstrap: bind, accept, and hand connections to the gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mineclash_protocol::{JsonCodec, PlayerId};
use mineclash_room::RoomRegistry;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::ServerError;
use crate::gateway::handle_connection;

/// Counter for assigning player ids. A player IS their connection; a
/// reconnect is a new player.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Shared state handed to every connection task.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// A Mineclash server bound to a local address.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), mineclash::ServerError> {
/// let server = mineclash::MineclashServer::bind("0.0.0.0:8080").await?;
/// server.run().await
/// # }
/// ```
pub struct MineclashServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl MineclashServer {
    /// Binds the listener without accepting yet.
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr, "mineclash listening");
        Ok(Self {
            listener,
            state: Arc::new(ServerState {
                registry: Mutex::new(RoomRegistry::new()),
                codec: JsonCodec,
            }),
        })
    }

    /// The bound local address (useful with port 0 in tests).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop, spawning one task per connection. Runs
    /// until the process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(error) = serve_connection(stream, state).await
                        {
                            tracing::debug!(
                                %addr,
                                %error,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(error) => {
                    tracing::error!(%error, "accept failed");
                }
            }
        }
    }
}

/// Upgrades one TCP stream to a WebSocket and runs the gateway loop on
/// it until the peer goes away.
async fn serve_connection(
    stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let player_id = PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%player_id, "accepted connection");
    handle_connection(ws, player_id, state).await;
    Ok(())
}
