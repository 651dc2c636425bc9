//! Error types for the sio client.
//!
//! Every failure the client can observe, from a malformed frame to a refused
//! dial, is a variant of the single `SioError` enum.

use thiserror::Error;

/// Convenience type alias for Results using SioError.
pub type SioResult<T> = Result<T, SioError>;

/// Unified error type covering all error categories in sio.
#[derive(Error, Debug)]
pub enum SioError {
    // -- Configuration errors --
    /// Failed to load or parse configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// The server URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    // -- Transport errors --
    /// Dialing the server failed.
    #[error("dial error: {0}")]
    Dial(String),

    /// Reading from or writing to a live connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The peer closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// A binary frame arrived; only text frames are supported.
    #[error("binary frames are not supported")]
    BinaryFrame,

    // -- Codec errors --
    /// Frame text is empty or does not start with a valid type digit.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// A numeric frame type outside 0-6.
    #[error("invalid packet type: {0}")]
    InvalidPacketType(u8),

    /// A decoder was handed a frame of the wrong kind.
    #[error("wrong frame kind: expected {expected}, got {actual}")]
    WrongFrameKind {
        /// Frame kind the decoder accepts.
        expected: &'static str,
        /// Frame kind that was supplied.
        actual: &'static str,
    },

    /// Message envelope could not be parsed.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// An event message carried an empty JSON array.
    #[error("empty event payload")]
    EmptyEventPayload,

    /// The first element of an event array was not a string.
    #[error("invalid event name: {0}")]
    InvalidEventName(String),

    /// The open frame did not carry a valid handshake object.
    #[error("malformed handshake: {0}")]
    MalformedHandshake(String),

    // -- Client errors --
    /// The outbound queue has been shut down.
    #[error("outbound queue closed")]
    QueueClosed,

    /// The operation requires a ready connection.
    #[error("client not ready (state: {0})")]
    NotReady(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SioError {
    /// Whether this error came from the codec rather than the transport.
    ///
    /// Decode errors are reported but never tear down a connection.
    pub fn is_codec(&self) -> bool {
        matches!(
            self,
            Self::MalformedPacket(_)
                | Self::InvalidPacketType(_)
                | Self::WrongFrameKind { .. }
                | Self::MalformedMessage(_)
                | Self::EmptyEventPayload
                | Self::InvalidEventName(_)
                | Self::MalformedHandshake(_)
        )
    }
}

impl From<serde_json::Error> for SioError {
    fn from(e: serde_json::Error) -> Self {
        SioError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for SioError {
    fn from(e: toml::de::Error) -> Self {
        SioError::Config(e.to_string())
    }
}
