//! In-process transport for exercising the client without a server.
//!
//! Every successful dial hands the test a [`ServerEnd`] that can push frames
//! or failures to the client and observe what the client writes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, Notify};
use url::Url;

use sio_core::error::{SioError, SioResult};

use super::{Connection, Headers, Transport};
use crate::protocol::{decode_packet, Packet, PacketType};

pub(crate) struct MemoryTransport {
    dials: AtomicUsize,
    failures: StdMutex<VecDeque<String>>,
    last_request: StdMutex<Option<(Url, Headers)>>,
    servers: mpsc::UnboundedSender<ServerEnd>,
    hold_dials: AtomicBool,
    dial_gate: Notify,
}

impl MemoryTransport {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, accepted) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            dials: AtomicUsize::new(0),
            failures: StdMutex::new(VecDeque::new()),
            last_request: StdMutex::new(None),
            servers,
            hold_dials: AtomicBool::new(false),
            dial_gate: Notify::new(),
        });
        (transport, accepted)
    }

    /// Make the next `count` dials fail.
    pub(crate) fn fail_next(&self, count: usize) {
        let mut failures = self.failures.lock().unwrap();
        for n in 0..count {
            failures.push_back(format!("connection refused (scripted #{n})"));
        }
    }

    /// Keep successful dials pending after the server end is handed out,
    /// until [`MemoryTransport::release_dial`] is called.
    pub(crate) fn hold_dials(&self) {
        self.hold_dials.store(true, Ordering::SeqCst);
    }

    /// Let one held dial return its connection.
    pub(crate) fn release_dial(&self) {
        self.dial_gate.notify_one();
    }

    pub(crate) fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<(Url, Headers)> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn dial(&self, url: &Url, headers: &Headers) -> SioResult<Arc<dyn Connection>> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((url.clone(), headers.clone()));

        if let Some(reason) = self.failures.lock().unwrap().pop_front() {
            return Err(SioError::Dial(reason));
        }

        let (to_client, incoming) = mpsc::unbounded_channel();
        let (outgoing, from_client) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let stalled = Arc::new(AtomicBool::new(false));

        let _ = self.servers.send(ServerEnd {
            to_client,
            from_client,
            closed: closed.clone(),
            stalled: stalled.clone(),
        });

        if self.hold_dials.load(Ordering::SeqCst) {
            self.dial_gate.notified().await;
        }

        Ok(Arc::new(MemoryConnection {
            incoming: Mutex::new(incoming),
            outgoing,
            closed,
            stalled,
        }))
    }
}

struct MemoryConnection {
    incoming: Mutex<mpsc::UnboundedReceiver<SioResult<Packet>>>,
    outgoing: mpsc::UnboundedSender<Packet>,
    closed: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn read(&self) -> SioResult<Packet> {
        let mut incoming = self.incoming.lock().await;
        match incoming.recv().await {
            Some(result) => result,
            None => Err(SioError::ConnectionClosed),
        }
    }

    async fn write(&self, packet: &Packet) -> SioResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SioError::ConnectionClosed);
        }
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.outgoing
            .send(packet.clone())
            .map_err(|_| SioError::ConnectionClosed)
    }

    async fn close(&self) -> SioResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Server side of one accepted memory connection.
pub(crate) struct ServerEnd {
    to_client: mpsc::UnboundedSender<SioResult<Packet>>,
    from_client: mpsc::UnboundedReceiver<Packet>,
    closed: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
}

impl ServerEnd {
    /// Deliver raw wire text, decoded the way a real transport would.
    pub(crate) fn send_text(&self, text: &str) {
        let _ = self.to_client.send(decode_packet(text));
    }

    pub(crate) fn send_handshake(&self, ping_interval_ms: u64) {
        self.send_text(&format!(
            r#"0{{"sid":"test-sid","upgrades":[],"pingInterval":{ping_interval_ms},"pingTimeout":5000}}"#
        ));
    }

    /// Make the client's pending read fail.
    pub(crate) fn fail(&self) {
        let _ = self
            .to_client
            .send(Err(SioError::Transport("connection reset".into())));
    }

    /// Make every further client write fail while reads stay up.
    pub(crate) fn refuse_writes(&mut self) {
        self.from_client.close();
    }

    /// Make every further client write hang without completing.
    pub(crate) fn stall_writes(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Next packet written by the client, if one arrives in time.
    pub(crate) async fn recv(&mut self, wait: Duration) -> Option<Packet> {
        tokio::time::timeout(wait, self.from_client.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next written packet that is not a heartbeat frame.
    pub(crate) async fn recv_message(&mut self, wait: Duration) -> Option<Packet> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let left = deadline.saturating_duration_since(tokio::time::Instant::now());
            let packet = self.recv(left).await?;
            if packet.kind == PacketType::Message {
                return Some(packet);
            }
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
