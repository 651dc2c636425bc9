//! One live connection: the read, write and heartbeat loops and the
//! supervisor that owns them.
//!
//! Whichever loop fails first trips the session's stop signal. The
//! supervisor then stops the remaining loops, waits for them, and closes the
//! connection before reporting how the session ended.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use sio_core::constants::notifications;
use sio_core::error::SioError;

use crate::client::ClientInner;
use crate::protocol::{
    decode_handshake, decode_message, Handshake, MessageType, Packet, PacketType,
};
use crate::state::ConnectionState;
use crate::transport::Connection;

/// How a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// A loop hit a transport failure; the caller may reconnect.
    Failed,
    /// The client was shut down.
    Shutdown,
}

/// Per-session stop signal shared by all loops.
#[derive(Clone)]
pub(crate) struct Stopper {
    tx: Arc<watch::Sender<bool>>,
}

impl Stopper {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trip the signal. Returns `true` for the first caller only.
    pub(crate) fn trigger(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub(crate) fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has been tripped.
    pub(crate) async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

/// Drive `conn` until it fails or the client shuts down.
pub(crate) async fn run(inner: Arc<ClientInner>, conn: Arc<dyn Connection>) -> SessionEnd {
    let stop = Stopper::new();
    let (handshake_tx, mut handshake_rx) = mpsc::channel::<Handshake>(1);

    let mut tasks = JoinSet::new();
    tasks.spawn(read_loop(inner.clone(), conn.clone(), stop.clone(), handshake_tx));
    tasks.spawn(write_loop(inner.clone(), conn.clone(), stop.clone()));

    let mut heartbeat_started = false;
    let end = loop {
        tokio::select! {
            _ = stop.stopped() => break SessionEnd::Failed,
            _ = inner.shutdown_requested() => break SessionEnd::Shutdown,
            Some(handshake) = handshake_rx.recv() => {
                if !inner.options.client_ping {
                    continue;
                }
                if heartbeat_started {
                    debug!("handshake repeated on live connection, heartbeat already running");
                    continue;
                }
                heartbeat_started = true;
                tasks.spawn(heartbeat_loop(
                    inner.clone(),
                    handshake.ping_interval(),
                    stop.clone(),
                ));
            }
        }
    };

    stop.trigger();
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("session task ended abnormally: {e}");
        }
    }
    if let Err(e) = conn.close().await {
        debug!("closing connection failed: {e}");
    }
    debug!("session ended: {end:?}");
    end
}

async fn read_loop(
    inner: Arc<ClientInner>,
    conn: Arc<dyn Connection>,
    stop: Stopper,
    handshakes: mpsc::Sender<Handshake>,
) {
    loop {
        let result = tokio::select! {
            result = conn.read() => result,
            _ = stop.stopped() => return,
        };

        match result {
            Ok(packet) => handle_packet(&inner, packet, &handshakes),
            // A bad frame is reported but the connection stays up.
            Err(e) if e.is_codec() => {
                warn!("dropping undecodable frame: {e}");
                inner.report(&e);
            }
            Err(e) => {
                error!("read failed: {e}");
                inner.report(&e);
                stop.trigger();
                return;
            }
        }
    }
}

fn handle_packet(inner: &ClientInner, packet: Packet, handshakes: &mpsc::Sender<Handshake>) {
    match packet.kind {
        PacketType::Open => match decode_handshake(&packet) {
            Ok(handshake) => {
                debug!(
                    "handshake sid={} ping_interval={}ms ping_timeout={}ms",
                    handshake.session_id, handshake.ping_interval_ms, handshake.ping_timeout_ms
                );
                let value = serde_json::to_value(&handshake).unwrap_or_default();
                inner.set_handshake(handshake.clone());
                if let Err(e) = handshakes.try_send(handshake) {
                    debug!("handshake not forwarded to the session: {e}");
                }
                inner.notify(notifications::OPEN, &[value]);
            }
            Err(e) => inner.report(&e),
        },
        PacketType::Ping => {
            if let Err(e) = inner.try_enqueue(Packet::pong()) {
                warn!("could not queue pong: {e}");
            }
        }
        PacketType::Pong => debug!("pong received"),
        PacketType::Message => match decode_message(&packet) {
            Ok(message) => match message.kind {
                MessageType::Event => {
                    let event = message.event.unwrap_or_default();
                    if !inner.emitter.dispatch(&event, &message.payloads) {
                        debug!("no listener for {event}");
                    }
                }
                MessageType::Error => {
                    warn!("server error on {}: {:?}", message.namespace, message.payloads);
                    inner.notify(notifications::ERROR, &message.payloads);
                }
                other => debug!("ignoring {other:?} message on {}", message.namespace),
            },
            Err(e) => inner.report(&e),
        },
        PacketType::Close | PacketType::Upgrade | PacketType::Noop => {
            debug!("ignoring {} frame", packet.kind);
        }
    }
}

async fn write_loop(inner: Arc<ClientInner>, conn: Arc<dyn Connection>, stop: Stopper) {
    let mut queue = tokio::select! {
        queue = inner.queue.lock() => queue,
        _ = stop.stopped() => return,
    };

    if let Some(packet) = inner.take_unsent() {
        debug!("writing message held over from the previous connection");
        if !write_packet(&inner, conn.as_ref(), &stop, packet).await {
            return;
        }
    }

    loop {
        let packet = tokio::select! {
            biased;
            _ = stop.stopped() => return,
            packet = queue.recv() => match packet {
                Some(packet) => packet,
                None => {
                    debug!("outbound queue closed");
                    return;
                }
            },
        };

        if !write_packet(&inner, conn.as_ref(), &stop, packet).await {
            return;
        }
    }
}

/// Write one packet unless the session stops first.
///
/// Returns `false` when the write loop must exit. A message that never made
/// it out is kept for the next connection.
async fn write_packet(
    inner: &ClientInner,
    conn: &dyn Connection,
    stop: &Stopper,
    packet: Packet,
) -> bool {
    let result = tokio::select! {
        biased;
        _ = stop.stopped() => None,
        result = conn.write(&packet) => Some(result),
    };

    let Some(result) = result else {
        debug!("session stopped during {} write", packet.kind);
        if packet.kind == PacketType::Message {
            inner.keep_unsent(packet);
        }
        return false;
    };

    match result {
        Ok(()) => {
            debug!("wrote {} frame", packet.kind);
            true
        }
        Err(e) => {
            fail_write(inner, stop, packet, e);
            false
        }
    }
}

fn fail_write(inner: &ClientInner, stop: &Stopper, packet: Packet, e: SioError) {
    error!("write failed: {e}");
    if packet.kind == PacketType::Message {
        inner.keep_unsent(packet);
    }
    inner.report(&e);
    stop.trigger();
}

async fn heartbeat_loop(inner: Arc<ClientInner>, interval: Duration, stop: Stopper) {
    if interval.is_zero() {
        warn!("handshake ping interval is zero, client heartbeat disabled");
        return;
    }

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.stopped() => return,
        }
        if stop.is_stopped() || inner.state.current() != ConnectionState::Ready {
            return;
        }
        match inner.try_enqueue(Packet::ping()) {
            Ok(()) => debug!("ping queued"),
            Err(SioError::QueueClosed) => return,
            Err(e) => warn!("could not queue ping: {e}"),
        }
    }
}
