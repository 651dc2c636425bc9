//! Protocol and client constants.

/// Application name, used for platform directories and log file names.
pub const APP_NAME: &str = "sio";

/// Path every socket endpoint is served from.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// Engine protocol revision requested in the `EIO` query parameter.
pub const ENGINE_IO_VERSION: &str = "3";

/// Transport requested in the `transport` query parameter.
pub const TRANSPORT_NAME: &str = "websocket";

/// Default namespace for message envelopes.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Capacity of the outbound packet queue.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Fixed delay between reconnection attempts in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000;

/// Notification names delivered to local listeners, never sent over the wire.
pub mod notifications {
    /// Handshake received on a fresh connection.
    pub const OPEN: &str = "open";
    /// First successful connection.
    pub const CONNECT: &str = "connect";
    /// Successful connection after a loss.
    pub const RECONNECT: &str = "reconnect";
    /// Any dial, transport, codec or encode failure.
    pub const ERROR: &str = "error";
    /// The client reached its terminal state.
    pub const CLOSE: &str = "close";
    /// A bounded reconnect cycle ran out of attempts.
    pub const RECONNECT_FAILED: &str = "reconnect_failed";

    /// All notification names.
    pub const ALL: &[&str] = &[OPEN, CONNECT, RECONNECT, ERROR, CLOSE, RECONNECT_FAILED];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_names() {
        assert_eq!(notifications::ALL.len(), 6);
        assert!(notifications::ALL.contains(&"reconnect"));
    }
}
