//! Outer frames: one type digit followed by the raw payload text.

use sio_core::error::{SioError, SioResult};

/// Frame type, written on the wire as a single ASCII digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Open = 0,
    Close = 1,
    Ping = 2,
    Pong = 3,
    Message = 4,
    Upgrade = 5,
    Noop = 6,
}

impl PacketType {
    /// Wire digit for this type.
    pub fn as_char(self) -> char {
        char::from(b'0' + self as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Message => "message",
            Self::Upgrade => "upgrade",
            Self::Noop => "noop",
        }
    }
}

impl TryFrom<u8> for PacketType {
    type Error = SioError;

    fn try_from(value: u8) -> SioResult<Self> {
        match value {
            0 => Ok(Self::Open),
            1 => Ok(Self::Close),
            2 => Ok(Self::Ping),
            3 => Ok(Self::Pong),
            4 => Ok(Self::Message),
            5 => Ok(Self::Upgrade),
            6 => Ok(Self::Noop),
            other => Err(SioError::InvalidPacketType(other)),
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One outer frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketType,
    pub payload: String,
}

impl Packet {
    pub fn new(kind: PacketType, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    pub fn ping() -> Self {
        Self::new(PacketType::Ping, String::new())
    }

    pub fn pong() -> Self {
        Self::new(PacketType::Pong, String::new())
    }

    /// Encode to wire text. See [`encode_packet`].
    pub fn encode(&self) -> String {
        encode_packet(self)
    }
}

/// Parse wire text into a packet.
///
/// The first character must be a digit naming a known frame type; the
/// remainder is kept verbatim as the payload.
pub fn decode_packet(text: &str) -> SioResult<Packet> {
    let mut chars = text.chars();
    let first = chars
        .next()
        .ok_or_else(|| SioError::MalformedPacket("empty frame".into()))?;
    let digit = first
        .to_digit(10)
        .ok_or_else(|| SioError::MalformedPacket(format!("frame type {first:?} is not a digit")))?;
    let kind = PacketType::try_from(digit as u8)
        .map_err(|_| SioError::MalformedPacket(format!("frame type {digit} out of range")))?;
    Ok(Packet::new(kind, chars.as_str()))
}

/// Encode a packet as its type digit followed by the payload.
///
/// [`PacketType`] only holds valid frame types, so this cannot fail; numeric
/// types are range-checked by `PacketType::try_from`.
pub fn encode_packet(packet: &Packet) -> String {
    let mut out = String::with_capacity(packet.payload.len() + 1);
    out.push(packet.kind.as_char());
    out.push_str(&packet.payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_open_packet() {
        let packet = decode_packet(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(packet.kind, PacketType::Open);
        assert_eq!(packet.payload, r#"{"sid":"abc"}"#);
    }

    #[test]
    fn test_decode_bare_ping() {
        let packet = decode_packet("2").unwrap();
        assert_eq!(packet.kind, PacketType::Ping);
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(matches!(decode_packet(""), Err(SioError::MalformedPacket(_))));
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        assert!(matches!(decode_packet("9x"), Err(SioError::MalformedPacket(_))));
        assert!(matches!(decode_packet("7"), Err(SioError::MalformedPacket(_))));
    }

    #[test]
    fn test_decode_rejects_non_digit() {
        assert!(matches!(decode_packet("x42"), Err(SioError::MalformedPacket(_))));
        // Non-ASCII digits are not frame types either.
        assert!(matches!(decode_packet("٤2"), Err(SioError::MalformedPacket(_))));
    }

    #[test]
    fn test_payload_is_kept_verbatim() {
        let packet = decode_packet("42[\"é\", 1]").unwrap();
        assert_eq!(packet.kind, PacketType::Message);
        assert_eq!(packet.payload, "2[\"é\", 1]");
        assert_eq!(packet.encode(), "42[\"é\", 1]");
    }

    #[test]
    fn test_encode_control_frames() {
        assert_eq!(Packet::ping().encode(), "2");
        assert_eq!(Packet::pong().encode(), "3");
        assert_eq!(Packet::new(PacketType::Noop, "").encode(), "6");
    }

    #[test]
    fn test_packet_type_range() {
        assert_eq!(PacketType::try_from(4).unwrap(), PacketType::Message);
        assert!(matches!(
            PacketType::try_from(7),
            Err(SioError::InvalidPacketType(7))
        ));
    }
}
