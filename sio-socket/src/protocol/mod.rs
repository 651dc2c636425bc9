//! Wire codec for the two protocol layers.
//!
//! Pure functions only: no state and no I/O.

pub mod handshake;
pub mod message;
pub mod packet;

pub use handshake::{decode_handshake, Handshake};
pub use message::{decode_message, encode_message, Message, MessageType};
pub use packet::{decode_packet, encode_packet, Packet, PacketType};
