//! Session parameters carried by the `Open` frame.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use sio_core::error::{SioError, SioResult};

use super::packet::{Packet, PacketType};

/// Server-provided session parameters, received once per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    #[serde(rename = "sid")]
    pub session_id: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(rename = "pingInterval")]
    pub ping_interval_ms: u64,
    #[serde(rename = "pingTimeout")]
    pub ping_timeout_ms: u64,
}

impl Handshake {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

/// Decode the handshake object from an `Open` frame.
pub fn decode_handshake(packet: &Packet) -> SioResult<Handshake> {
    if packet.kind != PacketType::Open {
        return Err(SioError::WrongFrameKind {
            expected: PacketType::Open.name(),
            actual: packet.kind.name(),
        });
    }
    serde_json::from_str(&packet.payload).map_err(|e| SioError::MalformedHandshake(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_packet;

    #[test]
    fn test_decode_handshake() {
        let packet = decode_packet(
            r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":5000}"#,
        )
        .unwrap();
        let handshake = decode_handshake(&packet).unwrap();
        assert_eq!(handshake.session_id, "lv_VI97HAXpY6yYWAAAC");
        assert_eq!(handshake.upgrades, vec!["websocket".to_string()]);
        assert_eq!(handshake.ping_interval(), Duration::from_secs(25));
        assert_eq!(handshake.ping_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_upgrades_defaults_to_empty() {
        let packet = Packet::new(
            PacketType::Open,
            r#"{"sid":"a","pingInterval":25,"pingTimeout":60}"#,
        );
        let handshake = decode_handshake(&packet).unwrap();
        assert!(handshake.upgrades.is_empty());
        assert_eq!(handshake.ping_interval_ms, 25);
    }

    #[test]
    fn test_rejects_non_open_frames_and_bad_json() {
        assert!(matches!(
            decode_handshake(&Packet::ping()),
            Err(SioError::WrongFrameKind { .. })
        ));
        assert!(matches!(
            decode_handshake(&Packet::new(PacketType::Open, "{}")),
            Err(SioError::MalformedHandshake(_))
        ));
    }
}
