//! sio Socket - client for the Engine.IO / Socket.IO real-time protocol.
//!
//! This crate provides:
//! - The two-layer wire codec (outer frames and inner event envelopes)
//! - A transport abstraction with a WebSocket implementation
//! - A listener registry for server events and client notifications
//! - A connection state machine with compare-and-transition semantics
//! - The client supervisor driving read, write and heartbeat loops, with
//!   automatic reconnection after transport failures
//!
//! ```no_run
//! use serde_json::json;
//! use sio_socket::SocketClient;
//!
//! # async fn example() -> sio_core::SioResult<()> {
//! let client = SocketClient::new("ws://127.0.0.1:3000")?;
//! client.on("message", |args| println!("server says {args:?}"));
//! client.connect(vec![]).await;
//! client.emit("greeting", vec![json!("hello server!")]).await;
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod client;
pub mod emitter;
pub mod protocol;
mod session;
pub mod state;
pub mod transport;

// Re-export key types
pub use address::socket_url;
pub use client::{ClientOptions, SocketClient};
pub use emitter::{Emitter, Listener};
pub use protocol::{Handshake, Message, MessageType, Packet, PacketType};
pub use state::ConnectionState;
pub use transport::{Connection, Headers, Transport, WebSocketTransport};
