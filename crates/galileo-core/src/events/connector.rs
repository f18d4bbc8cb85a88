// ── Event connector ──
//
// Bridges the Socket.IO channel to the registry: one background task
// receives raw `(name, args)` frames and dispatches them in arrival order.

use std::sync::Arc;

use galileo_api::{AuthProvider, EventStream, ReconnectConfig, SocketEvent, TlsMode};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::registry::EventRegistry;
use crate::error::CoreError;

/// A live event channel feeding an [`EventRegistry`].
pub struct EventConnector {
    stream: EventStream,
    cancel: CancellationToken,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for EventConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventConnector")
            .field("closed", &self.stream.is_closed())
            .finish_non_exhaustive()
    }
}

impl EventConnector {
    /// Open the channel and start dispatching into `registry`.
    ///
    /// Authentication or handshake failures are returned, not retried.
    pub async fn connect(
        backend: &Url,
        tls: &TlsMode,
        auth: Arc<AuthProvider>,
        registry: EventRegistry,
        reconnect: ReconnectConfig,
    ) -> Result<Self, CoreError> {
        let cancel = CancellationToken::new();
        let stream =
            EventStream::connect(backend, tls, auth, reconnect, cancel.child_token()).await?;
        let pump = spawn_dispatch(registry, stream.subscribe(), cancel.clone());
        info!(backend = %backend, "event connector started");

        Ok(Self {
            stream,
            cancel,
            pump: Mutex::new(Some(pump)),
        })
    }

    /// Raw frames, for callers that want names and arguments untouched.
    pub fn raw(&self) -> broadcast::Receiver<Arc<SocketEvent>> {
        self.stream.subscribe()
    }

    /// False once disconnected or out of reconnect attempts.
    pub fn is_connected(&self) -> bool {
        !self.stream.is_closed()
    }

    /// Token cancelled when the channel stops for good.
    pub fn closed_signal(&self) -> CancellationToken {
        self.stream.closed_signal()
    }

    /// Stop dispatching and close the channel. Safe to call twice.
    pub async fn disconnect(&self) {
        self.cancel.cancel();
        self.stream.disconnect().await;
        if let Some(pump) = self.pump.lock().await.take() {
            let _ = pump.await;
            info!("event connector stopped");
        }
    }
}

/// Feed frames from `rx` into `registry` until the channel closes or
/// `cancel` fires.
pub fn spawn_dispatch(
    registry: EventRegistry,
    mut rx: broadcast::Receiver<Arc<SocketEvent>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                frame = rx.recv() => frame,
            };

            match frame {
                Ok(event) => {
                    if let Err(e) = registry.dispatch(&event.name, &event.args) {
                        warn!(error = %e, "dropping malformed event");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event dispatch lagged, frames lost");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("event dispatch exiting");
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn frame(name: &str, args: Vec<serde_json::Value>) -> Arc<SocketEvent> {
        Arc::new(SocketEvent {
            name: name.into(),
            args,
        })
    }

    #[tokio::test]
    async fn frames_dispatch_in_arrival_order() {
        let registry = EventRegistry::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.on_category(crate::events::EventCategory::Stations, move |event| {
            sink.lock().unwrap().push(event.kind());
        });

        let (tx, rx) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let pump = spawn_dispatch(registry, rx, cancel.clone());

        tx.send(frame("station_user_expelled", vec![json!({ "stationid": "a" })]))
            .unwrap();
        tx.send(frame("not_an_event", vec![])).unwrap();
        tx.send(frame("station_admin_machine_added", vec![json!({})]))
            .unwrap();
        tx.send(frame("station_member_destroyed", vec![json!({ "stationid": "b" })]))
            .unwrap();
        drop(tx);
        pump.await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![EventKind::StationUserExpelled, EventKind::StationMemberDestroyed]
        );
    }

    #[tokio::test]
    async fn handler_panic_keeps_the_pump_alive() {
        let registry = EventRegistry::new();
        registry.on_kind(EventKind::StationUserExpelled, |_| panic!("handler bug"));
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.on_kind(EventKind::StationMemberDestroyed, move |event| {
            sink.lock().unwrap().push(event.kind());
        });

        let (tx, rx) = broadcast::channel(16);
        let pump = spawn_dispatch(registry, rx, CancellationToken::new());

        tx.send(frame("station_user_expelled", vec![json!({ "stationid": "a" })]))
            .unwrap();
        tx.send(frame("station_member_destroyed", vec![json!({ "stationid": "b" })]))
            .unwrap();
        drop(tx);
        pump.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![EventKind::StationMemberDestroyed]);
    }

    #[tokio::test]
    async fn cancel_stops_the_pump() {
        let (tx, rx) = broadcast::channel::<Arc<SocketEvent>>(4);
        let cancel = CancellationToken::new();
        let pump = spawn_dispatch(EventRegistry::new(), rx, cancel.clone());
        cancel.cancel();
        pump.await.unwrap();
        drop(tx);
    }
}
