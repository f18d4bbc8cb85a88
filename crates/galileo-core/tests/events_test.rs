// Integration tests for the event channel as seen through the `Galileo`
// facade, against a local Engine.IO v4 WebSocket server.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use galileo_core::events::StationAdminDestroyed;
use galileo_core::{Galileo, ReconnectConfig, SdkConfig};

const NS: &str = "/galileo/user_interface/v1";

type ServerSocket = WebSocketStream<TcpStream>;

// ── Helpers ─────────────────────────────────────────────────────────

async fn next_text(ws: &mut ServerSocket) -> String {
    loop {
        if let Message::Text(text) = ws.next().await.unwrap().unwrap() {
            return text.as_str().to_owned();
        }
    }
}

async fn send_text(ws: &mut ServerSocket, text: String) {
    ws.send(Message::Text(text.into())).await.unwrap();
}

async fn accept_and_join(listener: &TcpListener) -> ServerSocket {
    let (tcp, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(tcp).await.unwrap();
    send_text(&mut ws, r#"0{"sid":"s-1","pingInterval":25000}"#.to_owned()).await;
    assert_eq!(next_text(&mut ws).await, format!("40{NS},"));
    send_text(&mut ws, format!(r#"40{NS},{{"sid":"ns-1"}}"#)).await;
    ws
}

async fn send_destroyed(ws: &mut ServerSocket, station: &str) {
    send_text(
        ws,
        format!(r#"42{NS},["station_admin_destroyed",{{"stationid":"{station}"}}]"#),
    )
    .await;
}

async fn session(listener: &TcpListener, max_retries: u32) -> Galileo {
    let port = listener.local_addr().unwrap().port();
    let config = SdkConfig {
        backend: Some(format!("http://127.0.0.1:{port}")),
        auth_token: Some(SecretString::from("at-1")),
        refresh_token: Some(SecretString::from("rt-1")),
        reconnect: ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            max_retries: Some(max_retries),
        },
        ..SdkConfig::default()
    };
    Galileo::connect_with_env(config, |_| None).await.unwrap()
}

/// Typed handler that forwards the station id of every destroyed station.
fn watch_destroyed(galileo: &Galileo) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    galileo.events().on::<StationAdminDestroyed, _>(move |payload| {
        let _ = tx.send(payload.station_id.clone());
    });
    rx
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn server_event_reaches_registered_handler() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let galileo = session(&listener, 5).await;
    let mut seen = watch_destroyed(&galileo);
    let (go_tx, go_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let mut ws = accept_and_join(&listener).await;
        go_rx.await.unwrap();
        send_text(&mut ws, format!(r#"42{NS},["not_a_known_event",{{}}]"#)).await;
        send_destroyed(&mut ws, "st-1").await;
        ws
    });

    galileo.open_events().await.unwrap();
    assert!(galileo.events_connected().await);
    go_tx.send(()).unwrap();

    assert_eq!(recv(&mut seen).await, "st-1");

    galileo.disconnect().await;
    assert!(!galileo.events_connected().await);
    server.await.unwrap();
}

#[tokio::test]
async fn channel_that_gave_up_reports_closed_and_can_be_reopened() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let galileo = session(&listener, 2).await;
    let mut seen = watch_destroyed(&galileo);
    let (go_tx, go_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let mut first = accept_and_join(&listener).await;
        first.close(None).await.unwrap();
        drop(first);

        // Both reconnect attempts fail before the WebSocket upgrade.
        for _ in 0..2 {
            let (tcp, _) = listener.accept().await.unwrap();
            drop(tcp);
        }

        let mut reopened = accept_and_join(&listener).await;
        go_rx.await.unwrap();
        send_destroyed(&mut reopened, "st-2").await;
        reopened
    });

    galileo.open_events().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), galileo.events_closed())
        .await
        .expect("channel should stop after its reconnect budget");
    assert!(!galileo.events_connected().await);

    galileo.open_events().await.unwrap();
    assert!(galileo.events_connected().await);
    go_tx.send(()).unwrap();
    assert_eq!(recv(&mut seen).await, "st-2");

    galileo.disconnect().await;
    server.await.unwrap();
}
