//! Client handle and connection supervisor.
//!
//! Manages the full lifecycle of one logical connection:
//! - Initial dial from `connect`, retried on failure
//! - Steady-state sessions (see [`crate::session`])
//! - Reconnection with a fixed delay after a session fails
//! - Shutdown through `disconnect`, which always wins over reconnection
//!
//! Failures never surface from `connect`/`emit`/`disconnect`; they are
//! delivered to listeners of the `error` notification.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};
use url::Url;

use sio_core::config::AppConfig;
use sio_core::constants::{notifications, OUTBOUND_QUEUE_CAPACITY};
use sio_core::error::{SioError, SioResult};

use crate::address::socket_url;
use crate::emitter::Emitter;
use crate::protocol::{Handshake, Message, Packet};
use crate::session::{self, SessionEnd};
use crate::state::{ConnectionState, StateMachine};
use crate::transport::{Connection, Headers, Transport, WebSocketTransport};

/// Client behaviour, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Reconnect after a live connection fails.
    pub reconnect: bool,
    /// Fixed delay before every dial retry.
    pub reconnect_delay: Duration,
    /// Maximum dial attempts per reconnect cycle (0 = unlimited).
    pub max_reconnect_attempts: u32,
    /// Send our own Ping every handshake ping interval.
    pub client_ping: bool,
    /// Outbound queue capacity.
    pub queue_capacity: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            reconnect: true,
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_attempts: 0,
            client_ping: true,
            queue_capacity: OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

impl From<&AppConfig> for ClientOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            reconnect: config.reconnect.enabled,
            reconnect_delay: Duration::from_millis(config.reconnect.delay_ms),
            max_reconnect_attempts: config.reconnect.max_attempts,
            client_ping: config.heartbeat.client_ping,
            ..Self::default()
        }
    }
}

/// Handle to one logical connection. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SocketClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    url: Url,
    pub(crate) options: ClientOptions,
    transport: Arc<dyn Transport>,
    pub(crate) emitter: Emitter,
    pub(crate) state: StateMachine,
    outbound: StdMutex<Option<mpsc::Sender<Packet>>>,
    /// Single consumer side of the outbound queue, held by the live write loop.
    pub(crate) queue: Mutex<mpsc::Receiver<Packet>>,
    /// Message whose write failed, retried first on the next connection.
    unsent: StdMutex<Option<Packet>>,
    handshake: StdMutex<Option<Handshake>>,
    shutdown: watch::Sender<bool>,
}

impl SocketClient {
    /// Create a client for `url` using the WebSocket transport.
    pub fn new(url: &str) -> SioResult<Self> {
        Self::with_transport(url, ClientOptions::default(), Arc::new(WebSocketTransport::new()))
    }

    pub fn with_options(url: &str, options: ClientOptions) -> SioResult<Self> {
        Self::with_transport(url, options, Arc::new(WebSocketTransport::new()))
    }

    pub fn with_transport(
        url: &str,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
    ) -> SioResult<Self> {
        let url = socket_url(url)?;
        let (sender, receiver) = mpsc::channel(options.queue_capacity.max(1));
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(ClientInner {
                url,
                options,
                transport,
                emitter: Emitter::new(),
                state: StateMachine::new(),
                outbound: StdMutex::new(Some(sender)),
                queue: Mutex::new(receiver),
                unsent: StdMutex::new(None),
                handshake: StdMutex::new(None),
                shutdown,
            }),
        })
    }

    /// The socket endpoint this client dials.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.current()
    }

    /// Subscribe to connection state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Handshake of the most recent connection, if one arrived.
    pub fn handshake(&self) -> Option<Handshake> {
        lock(&self.inner.handshake).clone()
    }

    /// Register a listener for a server event or a client notification.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.inner.emitter.on(event, listener);
    }

    /// Dial the server and start driving the connection.
    ///
    /// Only the first call on an idle client does anything. A failed dial
    /// is reported through `error` and retried in the background.
    pub async fn connect(&self, headers: Headers) {
        let inner = &self.inner;
        if !inner.state.transition(ConnectionState::Idle, ConnectionState::Connecting) {
            debug!("connect ignored in state {}", inner.state.current());
            return;
        }

        match inner.dial(&headers).await {
            Ok(conn) => {
                if inner.state.transition(ConnectionState::Connecting, ConnectionState::Ready) {
                    tokio::spawn(inner.clone().supervise(Some(conn), headers));
                    inner.notify(notifications::CONNECT, &[]);
                } else {
                    debug!("connection established after shutdown, closing it");
                    let _ = conn.close().await;
                }
            }
            Err(e) => {
                warn!("initial dial failed: {e}");
                inner.report(&e);
                tokio::spawn(inner.clone().supervise(None, headers));
            }
        }
    }

    /// Shut the client down for good.
    ///
    /// Closes the outbound queue and the live connection and stops any
    /// reconnection. Later calls are no-ops.
    pub async fn disconnect(&self) {
        if self.inner.shut_down() {
            info!("socket disconnected");
            self.inner.notify(notifications::CLOSE, &[]);
        } else {
            debug!("disconnect ignored, client already closed");
        }
    }

    /// Deliver an event locally or send it to the server.
    ///
    /// Only acts while `Ready`. If a local listener is registered for
    /// `event` it is invoked and nothing is sent; otherwise the event is
    /// queued for the server. Use [`SocketClient::send`] to always send.
    pub async fn emit(&self, event: &str, args: Vec<Value>) {
        let state = self.inner.state.current();
        if state != ConnectionState::Ready {
            debug!("emit {event} dropped in state {state}");
            return;
        }
        if self.inner.emitter.dispatch(event, &args) {
            return;
        }
        if let Err(e) = self.inner.send_event(event, args).await {
            warn!("emit {event} failed: {e}");
            self.inner.report(&e);
        }
    }

    /// Queue an event for the server regardless of local listeners.
    pub async fn send(&self, event: &str, args: Vec<Value>) -> SioResult<()> {
        let state = self.inner.state.current();
        if state != ConnectionState::Ready {
            return Err(SioError::NotReady(state.to_string()));
        }
        self.inner.send_event(event, args).await
    }
}

impl std::fmt::Debug for SocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketClient")
            .field("url", &self.inner.url.as_str())
            .field("state", &self.inner.state.current())
            .finish()
    }
}

impl ClientInner {
    async fn dial(&self, headers: &Headers) -> SioResult<Arc<dyn Connection>> {
        info!("socket dialing {}", self.url);
        self.transport.dial(&self.url, headers).await
    }

    /// Owns every session of this client, one after another.
    async fn supervise(self: Arc<Self>, mut conn: Option<Arc<dyn Connection>>, headers: Headers) {
        let mut from = ConnectionState::Connecting;
        loop {
            if let Some(live) = conn.take() {
                match session::run(self.clone(), live).await {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Failed if !self.options.reconnect => {
                        warn!("connection lost and reconnection is disabled");
                        if self.shut_down() {
                            self.notify(notifications::CLOSE, &[]);
                        }
                        return;
                    }
                    SessionEnd::Failed => {
                        if !self
                            .state
                            .transition(ConnectionState::Ready, ConnectionState::Reconnecting)
                        {
                            return;
                        }
                        from = ConnectionState::Reconnecting;
                    }
                }
            }

            match self.redial(from, &headers).await {
                Some(live) => conn = Some(live),
                None => return,
            }
        }
    }

    /// Retry the dial every `reconnect_delay` until it succeeds, the
    /// attempt budget runs out, or the client shuts down.
    ///
    /// `from` is `Connecting` while the first connection has never been
    /// made and `Reconnecting` afterwards; it picks the notification sent on
    /// success.
    async fn redial(&self, from: ConnectionState, headers: &Headers) -> Option<Arc<dyn Connection>> {
        let max = self.options.max_reconnect_attempts;
        let mut attempts: u32 = 0;

        loop {
            if max > 0 && attempts >= max {
                error!("max reconnection attempts ({max}) reached");
                if self.shut_down() {
                    self.notify(notifications::RECONNECT_FAILED, &[Value::from(attempts)]);
                    self.notify(notifications::CLOSE, &[]);
                }
                return None;
            }
            attempts += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.options.reconnect_delay) => {}
                _ = self.shutdown_requested() => {
                    info!("reconnection cancelled by disconnect");
                    return None;
                }
            }

            if self.state.current() != from {
                debug!("reconnection aborted: state is {}", self.state.current());
                return None;
            }

            match self.dial(headers).await {
                Ok(conn) => {
                    if self.state.transition(from, ConnectionState::Ready) {
                        info!("connected after {attempts} attempt(s)");
                        let notification = if from == ConnectionState::Connecting {
                            notifications::CONNECT
                        } else {
                            notifications::RECONNECT
                        };
                        self.notify(notification, &[]);
                        return Some(conn);
                    }
                    debug!("dial won after the client left {from}, closing it");
                    let _ = conn.close().await;
                    return None;
                }
                Err(e) => {
                    warn!("connection attempt {attempts} failed: {e}");
                    self.report(&e);
                }
            }
        }
    }

    /// Move to `Closed`, close the outbound queue and wake every waiter.
    ///
    /// Returns `false` when the client was already closed.
    pub(crate) fn shut_down(&self) -> bool {
        if !self.state.close() {
            return false;
        }
        lock(&self.outbound).take();
        self.shutdown.send_replace(true);
        true
    }

    /// Resolves once the client has been shut down.
    pub(crate) async fn shutdown_requested(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    async fn send_event(&self, event: &str, args: Vec<Value>) -> SioResult<()> {
        let packet = Message::event(event, args).encode()?;
        self.enqueue(packet).await
    }

    /// Queue a packet, waiting for room until the client shuts down.
    pub(crate) async fn enqueue(&self, packet: Packet) -> SioResult<()> {
        let sender = lock(&self.outbound).clone().ok_or(SioError::QueueClosed)?;
        tokio::select! {
            sent = sender.send(packet) => sent.map_err(|_| SioError::QueueClosed),
            _ = self.shutdown_requested() => Err(SioError::QueueClosed),
        }
    }

    /// Queue a control packet without waiting.
    pub(crate) fn try_enqueue(&self, packet: Packet) -> SioResult<()> {
        let outbound = lock(&self.outbound);
        let sender = outbound.as_ref().ok_or(SioError::QueueClosed)?;
        sender.try_send(packet).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                SioError::Internal("outbound queue full".into())
            }
            mpsc::error::TrySendError::Closed(_) => SioError::QueueClosed,
        })
    }

    pub(crate) fn keep_unsent(&self, packet: Packet) {
        *lock(&self.unsent) = Some(packet);
    }

    pub(crate) fn take_unsent(&self) -> Option<Packet> {
        lock(&self.unsent).take()
    }

    pub(crate) fn set_handshake(&self, handshake: Handshake) {
        *lock(&self.handshake) = Some(handshake);
    }

    pub(crate) fn notify(&self, name: &str, args: &[Value]) -> bool {
        self.emitter.dispatch(name, args)
    }

    /// Deliver a failure to `error` listeners.
    pub(crate) fn report(&self, err: &SioError) {
        self.notify(notifications::ERROR, &[Value::String(err.to_string())]);
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
