//! Node connection.

use crate::error::ConnectionError;
use web3::transports::{Either, Http, WebSocket};

/// Transport returned by [`connect`].
pub type NodeTransport = Either<WebSocket, Http>;

/// Opens a transport for `endpoint`.
///
/// `http://` and `https://` endpoints get an HTTP transport, `ws://` and
/// `wss://` endpoints open a WebSocket. Nothing else is supported.
///
/// Both transports must be used inside a Tokio 1.x runtime.
pub async fn connect(endpoint: &str) -> Result<NodeTransport, ConnectionError> {
    let url = url::Url::parse(endpoint).map_err(|err| ConnectionError::InvalidEndpoint(endpoint.into(), err))?;

    match url.scheme() {
        "http" | "https" => Http::new(endpoint)
            .map(Either::Right)
            .map_err(ConnectionError::Transport),
        "ws" | "wss" => WebSocket::new(endpoint)
            .await
            .map(Either::Left)
            .map_err(ConnectionError::Transport),
        other => Err(ConnectionError::UnsupportedScheme(other.into())),
    }
}
