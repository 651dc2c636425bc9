//! WebSocket transport over `tokio-tungstenite`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use sio_core::error::{SioError, SioResult};

use super::{Connection, Headers, Transport};
use crate::protocol::{decode_packet, Packet};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type WsSource = SplitStream<WsStream>;

/// Dials `ws://` and `wss://` URLs, one text frame per packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn dial(&self, url: &Url, headers: &Headers) -> SioResult<Arc<dyn Connection>> {
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| SioError::Dial(e.to_string()))?;

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SioError::Dial(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SioError::Dial(format!("header value for {name}: {e}")))?;
            request.headers_mut().append(name, value);
        }

        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| SioError::Dial(e.to_string()))?;
        debug!("websocket upgraded to {url} (status {})", response.status());

        let (sink, source) = stream.split();
        Ok(Arc::new(WebSocketConnection {
            sink: Mutex::new(sink),
            source: Mutex::new(source),
            closed: AtomicBool::new(false),
        }))
    }
}

struct WebSocketConnection {
    sink: Mutex<WsSink>,
    source: Mutex<WsSource>,
    closed: AtomicBool,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn read(&self) -> SioResult<Packet> {
        let mut source = self.source.lock().await;
        loop {
            match source.next().await {
                Some(Ok(WsMessage::Text(text))) => return decode_packet(&text),
                Some(Ok(WsMessage::Binary(_))) => return Err(SioError::BinaryFrame),
                // Control frames are answered by tungstenite itself.
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    continue
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    if let Some(frame) = frame {
                        debug!("websocket closed by peer: {} {}", frame.code, frame.reason);
                    }
                    return Err(SioError::ConnectionClosed);
                }
                Some(Err(e)) => return Err(SioError::Transport(e.to_string())),
                None => return Err(SioError::ConnectionClosed),
            }
        }
    }

    async fn write(&self, packet: &Packet) -> SioResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SioError::ConnectionClosed);
        }
        let mut sink = self.sink.lock().await;
        sink.send(WsMessage::Text(packet.encode()))
            .await
            .map_err(|e| SioError::Transport(e.to_string()))
    }

    async fn close(&self) -> SioResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut sink = self.sink.lock().await;
        sink.close()
            .await
            .map_err(|e| SioError::Transport(e.to_string()))
    }
}
