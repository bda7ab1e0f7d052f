//! Top-level error type for the server binary.

/// Errors that can take down a connection or the accept loop. Room and
/// protocol failures never surface here; they are answered in-band as
/// `error` events, or dropped.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Socket-level I/O failure (bind, accept).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or stream failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
