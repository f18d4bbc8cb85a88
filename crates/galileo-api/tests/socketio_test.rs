// Integration tests for the Socket.IO event channel against a local
// WebSocket server speaking Engine.IO v4 text frames.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::{WebSocketStream, accept_async, accept_hdr_async};
use tokio_util::sync::CancellationToken;
use url::Url;

use galileo_api::socketio::EventStream;
use galileo_api::{
    AuthProvider, Credentials, Error, ReconnectConfig, TlsMode, TokenEndpoint, TransportConfig,
};

const NS: &str = "/galileo/user_interface/v1";
const OPEN: &str = r#"0{"sid":"s-1","pingInterval":25000,"pingTimeout":20000}"#;

type ServerSocket = WebSocketStream<TcpStream>;

// ── Helpers ─────────────────────────────────────────────────────────

async fn auth() -> Arc<AuthProvider> {
    let http = TransportConfig::default().build_client().unwrap();
    let endpoint = TokenEndpoint::backend(&Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
    let credentials = Credentials::Tokens {
        access: SecretString::from("at-1"),
        refresh: SecretString::from("rt-1"),
    };
    Arc::new(AuthProvider::login(http, endpoint, credentials).await.unwrap())
}

async fn listen() -> (TcpListener, Url) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let backend = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
    (listener, backend)
}

fn fast_reconnect(max_retries: u32) -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        max_retries: Some(max_retries),
    }
}

async fn connect(backend: &Url, reconnect: ReconnectConfig) -> Result<EventStream, Error> {
    EventStream::connect(
        backend,
        &TlsMode::System,
        auth().await,
        reconnect,
        CancellationToken::new(),
    )
    .await
}

async fn next_text(ws: &mut ServerSocket) -> String {
    loop {
        if let Message::Text(text) = ws.next().await.unwrap().unwrap() {
            return text.as_str().to_owned();
        }
    }
}

async fn send_text(ws: &mut ServerSocket, text: &str) {
    ws.send(Message::Text(text.to_owned().into())).await.unwrap();
}

/// Answer the engine open and the namespace connect.
async fn join(ws: &mut ServerSocket) {
    send_text(ws, OPEN).await;
    assert_eq!(next_text(ws).await, format!("40{NS},"));
    send_text(ws, &format!(r#"40{NS},{{"sid":"ns-1"}}"#)).await;
}

async fn accept_and_join(listener: &TcpListener) -> ServerSocket {
    let (tcp, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(tcp).await.unwrap();
    join(&mut ws).await;
    ws
}

// ── Handshake ───────────────────────────────────────────────────────

#[tokio::test]
async fn connect_sends_bearer_token_and_forwards_events() {
    let (listener, backend) = listen().await;
    let (go_tx, go_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let check = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            assert_eq!(req.headers()["authorization"], "Bearer at-1");
            Ok(resp)
        };
        let mut ws = accept_hdr_async(tcp, check).await.unwrap();
        join(&mut ws).await;
        go_rx.await.unwrap();
        send_text(
            &mut ws,
            &format!(r#"42{NS},["station_admin_destroyed",{{"stationid":"st-1"}}]"#),
        )
        .await;
        ws
    });

    let stream = connect(&backend, ReconnectConfig::default()).await.unwrap();
    let mut rx = stream.subscribe();
    go_tx.send(()).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.name, "station_admin_destroyed");
    assert_eq!(event.args, vec![json!({ "stationid": "st-1" })]);
    assert!(!stream.is_closed());

    stream.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn namespace_connect_error_fails_connect() {
    let (listener, backend) = listen().await;
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        send_text(&mut ws, OPEN).await;
        next_text(&mut ws).await;
        send_text(&mut ws, &format!(r#"44{NS},{{"message":"not authorized"}}"#)).await;
        // Keep the socket open until the client gives up on it.
        let _ = ws.next().await;
    });

    let err = connect(&backend, ReconnectConfig::default()).await.unwrap_err();
    assert!(
        matches!(err, Error::SocketIo { ref message } if message == "not authorized"),
        "{err:?}"
    );
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let (listener, backend) = listen().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_and_join(&listener).await;
        send_text(&mut ws, "2").await;
        next_text(&mut ws).await
    });

    let stream = connect(&backend, ReconnectConfig::default()).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply, "3");
    stream.disconnect().await;
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn disconnect_leaves_namespace_and_is_idempotent() {
    let (listener, backend) = listen().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_and_join(&listener).await;
        next_text(&mut ws).await
    });

    let stream = connect(&backend, ReconnectConfig::default()).await.unwrap();
    stream.disconnect().await;
    stream.disconnect().await;

    assert!(stream.is_closed());
    assert_eq!(server.await.unwrap(), format!("41{NS},"));
}

#[tokio::test]
async fn dropped_connection_reconnects_with_a_fresh_handshake() {
    let (listener, backend) = listen().await;
    let (go_tx, go_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let mut first = accept_and_join(&listener).await;
        first.close(None).await.unwrap();
        drop(first);

        // `join` asserts the namespace connect frame is sent again.
        let mut second = accept_and_join(&listener).await;
        go_rx.await.unwrap();
        send_text(
            &mut second,
            &format!(r#"42{NS},["station_user_expelled",{{"stationid":"st-9"}}]"#),
        )
        .await;
        second
    });

    let stream = connect(&backend, fast_reconnect(5)).await.unwrap();
    let mut rx = stream.subscribe();
    go_tx.send(()).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.name, "station_user_expelled");
    assert!(!stream.is_closed());

    stream.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn exhausted_reconnects_close_the_stream() {
    let (listener, backend) = listen().await;
    tokio::spawn(async move {
        let mut ws = accept_and_join(&listener).await;
        // Stop listening so every reconnect attempt is refused.
        drop(listener);
        ws.close(None).await.unwrap();
    });

    let stream = connect(&backend, fast_reconnect(2)).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), stream.closed())
        .await
        .expect("read loop should end once retries run out");

    assert!(stream.is_closed());
    assert!(stream.closed_signal().is_cancelled());
    stream.disconnect().await;
}
