//! Inner envelopes carried by `Message` frames.
//!
//! Wire layout: `<type digit>[<namespace>,][<ack id>][<json array>]`. The
//! namespace is only present when it starts with `/`, and runs up to the
//! first comma or the end of the text.

use serde_json::Value;

use sio_core::constants::DEFAULT_NAMESPACE;
use sio_core::error::{SioError, SioResult};

use super::packet::{Packet, PacketType};

/// Envelope type, written as the first digit of a message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Connect = 0,
    Disconnect = 1,
    Event = 2,
    Ack = 3,
    Error = 4,
    BinaryEvent = 5,
    BinaryAck = 6,
}

impl MessageType {
    pub fn as_char(self) -> char {
        char::from(b'0' + self as u8)
    }

    /// Binary envelopes reference attachments this client never receives.
    pub fn is_binary(self) -> bool {
        matches!(self, Self::BinaryEvent | Self::BinaryAck)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = SioError;

    fn try_from(value: u8) -> SioResult<Self> {
        match value {
            0 => Ok(Self::Connect),
            1 => Ok(Self::Disconnect),
            2 => Ok(Self::Event),
            3 => Ok(Self::Ack),
            4 => Ok(Self::Error),
            5 => Ok(Self::BinaryEvent),
            6 => Ok(Self::BinaryAck),
            other => Err(SioError::MalformedMessage(format!(
                "message type {other} out of range"
            ))),
        }
    }
}

/// A decoded envelope.
///
/// `id == None` means no acknowledgment is requested. `event` is only set
/// for `Event` messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageType,
    pub namespace: String,
    pub id: Option<u64>,
    pub event: Option<String>,
    pub payloads: Vec<Value>,
}

impl Message {
    /// An empty envelope of the given type on the default namespace.
    pub fn new(kind: MessageType) -> Self {
        Self {
            kind,
            namespace: DEFAULT_NAMESPACE.to_string(),
            id: None,
            event: None,
            payloads: Vec::new(),
        }
    }

    /// An `Event` envelope on the default namespace without an ack id.
    pub fn event(name: impl Into<String>, payloads: Vec<Value>) -> Self {
        Self {
            event: Some(name.into()),
            payloads,
            ..Self::new(MessageType::Event)
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn encode(&self) -> SioResult<Packet> {
        encode_message(self)
    }
}

/// Decode the envelope carried by a `Message` frame.
pub fn decode_message(packet: &Packet) -> SioResult<Message> {
    if packet.kind != PacketType::Message {
        return Err(SioError::WrongFrameKind {
            expected: PacketType::Message.name(),
            actual: packet.kind.name(),
        });
    }

    let mut chars = packet.payload.chars();
    let first = chars
        .next()
        .ok_or_else(|| SioError::MalformedMessage("empty payload".into()))?;
    let digit = first.to_digit(10).ok_or_else(|| {
        SioError::MalformedMessage(format!("message type {first:?} is not a digit"))
    })?;
    let kind = MessageType::try_from(digit as u8)?;
    if kind.is_binary() {
        return Err(SioError::MalformedMessage(
            "binary messages are not supported".into(),
        ));
    }

    let mut message = Message::new(kind);
    let mut rest = chars.as_str();

    if rest.starts_with('/') {
        match rest.find(',') {
            Some(comma) => {
                message.namespace = rest[..comma].to_string();
                rest = &rest[comma + 1..];
            }
            None => {
                message.namespace = rest.to_string();
                rest = "";
            }
        }
    }

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let id = rest[..digits]
            .parse::<u64>()
            .map_err(|e| SioError::MalformedMessage(format!("ack id: {e}")))?;
        message.id = Some(id);
        rest = &rest[digits..];
    }

    match kind {
        MessageType::Ack => {
            message.payloads = parse_array(rest)?;
        }
        MessageType::Event => {
            let mut values = parse_array(rest)?.into_iter();
            match values.next() {
                None => return Err(SioError::EmptyEventPayload),
                Some(Value::String(name)) => message.event = Some(name),
                Some(other) => return Err(SioError::InvalidEventName(other.to_string())),
            }
            message.payloads = values.collect();
        }
        MessageType::Error => {
            message.payloads = vec![Value::String(rest.to_string())];
        }
        _ => {}
    }

    Ok(message)
}

/// Encode an envelope into a `Message` frame.
///
/// A non-default namespace is followed by a comma only when an ack id or a
/// JSON array comes after it; the array is omitted when it would be empty.
pub fn encode_message(message: &Message) -> SioResult<Packet> {
    let event = message
        .event
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|name| Value::String(name.to_string()));

    let mut array: Vec<&Value> = Vec::with_capacity(message.payloads.len() + 1);
    array.extend(event.as_ref());
    array.extend(message.payloads.iter());

    let body = if array.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&array)?)
    };

    let mut out = String::new();
    out.push(message.kind.as_char());
    if !message.namespace.is_empty() && message.namespace != DEFAULT_NAMESPACE {
        out.push_str(&message.namespace);
        if message.id.is_some() || body.is_some() {
            out.push(',');
        }
    }
    if let Some(id) = message.id {
        out.push_str(&id.to_string());
    }
    if let Some(body) = body {
        out.push_str(&body);
    }

    Ok(Packet::new(PacketType::Message, out))
}

fn parse_array(text: &str) -> SioResult<Vec<Value>> {
    serde_json::from_str(text).map_err(|e| SioError::MalformedMessage(e.to_string()))
}
