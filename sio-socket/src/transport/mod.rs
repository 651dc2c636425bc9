//! Transport abstraction.
//!
//! The client only ever talks to a [`Transport`] that dials and the
//! [`Connection`] it returns. Read and write on one connection may be in
//! flight at the same time from different tasks.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use sio_core::error::SioResult;

use crate::protocol::Packet;

#[cfg(test)]
pub(crate) mod memory;
pub mod websocket;

pub use websocket::WebSocketTransport;

/// Request headers passed to `dial` unmodified. Repeated names are allowed.
pub type Headers = Vec<(String, String)>;

/// Dials the server and yields a live connection.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dial(&self, url: &Url, headers: &Headers) -> SioResult<Arc<dyn Connection>>;
}

/// One live, ordered, bidirectional frame stream.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Wait for the next frame.
    async fn read(&self) -> SioResult<Packet>;

    /// Write one frame.
    async fn write(&self, packet: &Packet) -> SioResult<()>;

    /// Close the connection. Calling it more than once is a no-op.
    async fn close(&self) -> SioResult<()>;
}
