//! Socket.IO event channel with bounded auto-reconnect.
//!
//! Connects to the backend's Socket.IO endpoint over a WebSocket, joins the
//! user-interface namespace, and publishes every server event through a
//! [`tokio::sync::broadcast`] channel as a raw `(name, args)` pair.
//!
//! # Example
//!
//! ```rust,ignore
//! use galileo_api::socketio::{EventStream, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let stream = EventStream::connect(
//!     &backend,
//!     &TlsMode::System,
//!     auth,
//!     ReconnectConfig::default(),
//!     CancellationToken::new(),
//! )
//! .await?;
//! let mut rx = stream.subscribe();
//! while let Ok(event) = rx.recv().await {
//!     println!("{} {:?}", event.name, event.args);
//! }
//! stream.disconnect().await;
//! ```

pub mod packet;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

pub use packet::{OpenInfo, Packet, SocketPacket};

use crate::auth::AuthProvider;
use crate::error::Error;
use crate::rest::NAMESPACE;
use crate::transport::TlsMode;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type RustlsConfig = Option<Arc<rustls::ClientConfig>>;

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

// ── SocketEvent ──────────────────────────────────────────────────────

/// One server event as received: its name and positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketEvent {
    pub name: String,
    pub args: Vec<Value>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff for re-establishing a dropped connection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Attempts per outage before giving up. `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: Some(5),
        }
    }
}

/// `ws(s)://host/socket.io/?EIO=4&transport=websocket` for an http(s) backend.
pub fn socket_url(backend: &Url) -> Result<Url, Error> {
    let scheme = match backend.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported backend scheme: {other}"
            )));
        }
    };
    let host = backend
        .host_str()
        .ok_or_else(|| Error::WebSocketConnect(format!("backend has no host: {backend}")))?;
    let authority = match backend.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    Ok(Url::parse(&format!(
        "{scheme}://{authority}/socket.io/?EIO=4&transport=websocket"
    ))?)
}

// ── EventStream ──────────────────────────────────────────────────────

/// Handle to a connected event channel.
///
/// The read loop runs in a background task; [`disconnect`](Self::disconnect)
/// stops it and waits for it to finish. The stream counts as closed once
/// that task has ended for any reason, including running out of reconnect
/// attempts.
pub struct EventStream {
    event_rx: broadcast::Receiver<Arc<SocketEvent>>,
    cancel: CancellationToken,
    finished: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("finished", &self.finished.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl EventStream {
    /// Complete the Engine.IO and namespace handshakes, then spawn the read
    /// loop. Handshake failures (including a namespace connect error) are
    /// returned here rather than retried.
    pub async fn connect(
        backend: &Url,
        tls: &TlsMode,
        auth: Arc<AuthProvider>,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let url = socket_url(backend)?;
        let tls = tls.rustls_config()?;
        let socket = handshake(&url, &auth, tls.as_ref()).await?;

        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let finished = CancellationToken::new();
        let done = finished.clone().drop_guard();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let _done = done;
            let link = Link { url, tls, auth };
            event_loop(socket, &link, &event_tx, &reconnect, &task_cancel).await;
        });

        Ok(Self {
            event_rx,
            cancel,
            finished,
            task: Mutex::new(Some(task)),
        })
    }

    /// New receiver for the event stream. Slow consumers see
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SocketEvent>> {
        self.event_rx.resubscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.finished.is_cancelled()
    }

    /// Token cancelled when the read loop ends.
    pub fn closed_signal(&self) -> CancellationToken {
        self.finished.child_token()
    }

    /// Wait until the read loop has ended.
    pub async fn closed(&self) {
        self.finished.cancelled().await;
    }

    /// Leave the namespace, close the socket, and wait for the read loop.
    /// Calling it again is a no-op.
    pub async fn disconnect(&self) {
        self.cancel.cancel();
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "event loop task failed");
            }
        }
    }
}

// ── Handshake ────────────────────────────────────────────────────────

/// Where and how to (re)connect.
struct Link {
    url: Url,
    tls: RustlsConfig,
    auth: Arc<AuthProvider>,
}

async fn handshake(
    url: &Url,
    auth: &AuthProvider,
    tls: Option<&Arc<rustls::ClientConfig>>,
) -> Result<Socket, Error> {
    tokio::time::timeout(HANDSHAKE_TIMEOUT, open_namespace(url, auth, tls))
        .await
        .map_err(|_| Error::WebSocketConnect("Socket.IO handshake timed out".into()))?
}

async fn open_namespace(
    url: &Url,
    auth: &AuthProvider,
    tls: Option<&Arc<rustls::ClientConfig>>,
) -> Result<Socket, Error> {
    info!(url = %url, "connecting event channel");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;
    let token = auth.access_token();
    let request = ClientRequestBuilder::new(uri)
        .with_header("Authorization", format!("Bearer {}", token.expose_secret()));

    let connector = tls.map(|config| Connector::Rustls(Arc::clone(config)));
    let (mut socket, _response) =
        tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let mut joined = false;
    while let Some(frame) = socket.next().await {
        let text = match frame.map_err(|e| Error::WebSocketConnect(e.to_string()))? {
            tungstenite::Message::Text(text) => text,
            tungstenite::Message::Close(_) => break,
            _ => continue,
        };

        match Packet::parse(text.as_str())? {
            Packet::Open(info) => {
                debug!(sid = %info.sid, ping_interval = info.ping_interval, "engine open");
                let connect = Packet::Message(SocketPacket::Connect {
                    namespace: NAMESPACE.into(),
                    data: None,
                });
                send(&mut socket, &connect).await?;
            }
            Packet::Ping => send(&mut socket, &Packet::Pong).await?,
            Packet::Message(SocketPacket::Connect { namespace, .. }) if namespace == NAMESPACE => {
                joined = true;
                break;
            }
            Packet::Message(SocketPacket::ConnectError { data, .. }) => {
                return Err(Error::SocketIo {
                    message: SocketPacket::error_message(&data),
                });
            }
            Packet::Close => break,
            other => trace!(?other, "ignored frame during handshake"),
        }
    }

    if !joined {
        return Err(Error::WebSocketConnect(
            "connection closed during Socket.IO handshake".into(),
        ));
    }
    info!(namespace = NAMESPACE, "event channel connected");
    Ok(socket)
}

async fn send(socket: &mut Socket, packet: &Packet) -> Result<(), Error> {
    socket
        .send(tungstenite::Message::Text(packet.encode().into()))
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))
}

// ── Background loop ──────────────────────────────────────────────────

/// How a single connection ended.
enum Ended {
    Cancelled,
    Dropped(Option<Error>),
}

/// Read until the connection drops, then reconnect with backoff until the
/// retry budget runs out or the caller disconnects.
async fn event_loop(
    socket: Socket,
    link: &Link,
    event_tx: &broadcast::Sender<Arc<SocketEvent>>,
    reconnect: &ReconnectConfig,
    cancel: &CancellationToken,
) {
    let mut socket = Some(socket);

    'outer: while let Some(mut current) = socket.take() {
        match read_events(&mut current, event_tx, cancel).await {
            Ended::Cancelled => {
                close(current).await;
                break;
            }
            Ended::Dropped(Some(e)) => warn!(error = %e, "event channel dropped"),
            Ended::Dropped(None) => info!("event channel closed by server"),
        }

        let mut attempt: u32 = 0;
        while socket.is_none() {
            if reconnect.max_retries.is_some_and(|max| attempt >= max) {
                warn!(attempts = attempt, "event channel reconnection limit reached, giving up");
                break 'outer;
            }

            let delay = calculate_backoff(attempt, reconnect);
            debug!(delay_ms = delay.as_millis(), attempt, "waiting before reconnect");
            tokio::select! {
                biased;
                () = cancel.cancelled() => break 'outer,
                () = tokio::time::sleep(delay) => {}
            }

            match handshake(&link.url, &link.auth, link.tls.as_ref()).await {
                Ok(fresh) => socket = Some(fresh),
                Err(e) => {
                    warn!(error = %e, attempt, "event channel reconnect failed");
                    attempt += 1;
                }
            }
        }
    }

    debug!("event loop exiting");
}

async fn read_events(
    socket: &mut Socket,
    event_tx: &broadcast::Sender<Arc<SocketEvent>>,
    cancel: &CancellationToken,
) -> Ended {
    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ended::Cancelled,
            frame = socket.next() => frame,
        };

        let text = match frame {
            Some(Ok(tungstenite::Message::Text(text))) => text,
            Some(Ok(tungstenite::Message::Close(_))) | None => return Ended::Dropped(None),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Ended::Dropped(Some(Error::WebSocketConnect(e.to_string()))),
        };

        let packet = match Packet::parse(text.as_str()) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(error = %e, "skipping frame");
                continue;
            }
        };

        match packet {
            Packet::Ping => {
                if let Err(e) = send(socket, &Packet::Pong).await {
                    return Ended::Dropped(Some(e));
                }
            }
            Packet::Message(SocketPacket::Event {
                namespace,
                name,
                args,
                ..
            }) if namespace == NAMESPACE => {
                trace!(event = %name, "event received");
                // No subscribers is fine.
                let _ = event_tx.send(Arc::new(SocketEvent { name, args }));
            }
            Packet::Message(SocketPacket::Disconnect { namespace }) if namespace == NAMESPACE => {
                return Ended::Dropped(None);
            }
            Packet::Message(SocketPacket::ConnectError { data, .. }) => {
                return Ended::Dropped(Some(Error::SocketIo {
                    message: SocketPacket::error_message(&data),
                }));
            }
            Packet::Close => return Ended::Dropped(None),
            _ => {}
        }
    }
}

/// Leave the namespace and send a close frame. Errors are irrelevant here.
async fn close(mut socket: Socket) {
    let leave = Packet::Message(SocketPacket::Disconnect {
        namespace: NAMESPACE.into(),
    });
    let _ = send(&mut socket, &leave).await;
    let _ = socket.close(None).await;
}

// ── Backoff calculation ──────────────────────────────────────────────

/// `min(initial * 2^attempt, max)` scaled by a deterministic ±25% jitter.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_is_bounded() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.max_retries, Some(5));
    }

    #[test]
    fn backoff_grows_then_caps() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };
        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);
        assert!(d1 > d0, "{d1:?} <= {d0:?}");
        assert!(d2 > d1, "{d2:?} <= {d1:?}");
        assert!(calculate_backoff(40, &config) <= Duration::from_millis(12_500));
    }

    #[test]
    fn socket_url_follows_backend_scheme() {
        let https = Url::parse("https://booming-client-217619.appspot.com").expect("url");
        assert_eq!(
            socket_url(&https).expect("wss").as_str(),
            "wss://booming-client-217619.appspot.com/socket.io/?EIO=4&transport=websocket"
        );

        let local = Url::parse("http://127.0.0.1:5000/").expect("url");
        assert_eq!(
            socket_url(&local).expect("ws").as_str(),
            "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket"
        );

        let ftp = Url::parse("ftp://example.com").expect("url");
        assert!(socket_url(&ftp).is_err());
    }
}
