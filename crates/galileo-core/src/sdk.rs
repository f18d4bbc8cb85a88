// ── SDK facade ──
//
// `Galileo` is the single entry point: it resolves settings, logs in,
// optionally opens the event channel, and hands out the services.

use std::sync::Arc;

use galileo_api::{
    AuthProvider, GalileoClient, ReconnectConfig, TlsMode, TokenEndpoint, TransportConfig,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{AuthServer, Backend, SdkConfig};
use crate::error::CoreError;
use crate::events::{EventConnector, EventRegistry};
use crate::services::{
    CargoBaysService, JobsService, MachinesService, MissionsService, ProfilesService,
    StationsService, UniversesService,
};

/// An authenticated session with one Galileo backend.
///
/// Cheaply cloneable via `Arc<GalileoInner>`; clones share the token pair,
/// the handler registry, and the event channel.
#[derive(Clone)]
pub struct Galileo {
    inner: Arc<GalileoInner>,
}

struct GalileoInner {
    backend: Backend,
    client: Arc<GalileoClient>,
    registry: EventRegistry,
    reconnect: ReconnectConfig,
    tls: TlsMode,
    connector: Mutex<Option<EventConnector>>,
}

impl std::fmt::Debug for Galileo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Galileo")
            .field("backend", &self.inner.backend)
            .field("universe", &self.inner.client.universe())
            .finish_non_exhaustive()
    }
}

impl Galileo {
    // ── Construction ─────────────────────────────────────────────────

    /// Log in using `config` and the process environment.
    pub async fn connect(config: SdkConfig) -> Result<Self, CoreError> {
        Self::connect_with_env(config, |key| std::env::var(key).ok()).await
    }

    /// Like [`connect`](Self::connect), reading `GALILEO_*` variables
    /// through `env` instead of the process environment.
    pub async fn connect_with_env<F>(config: SdkConfig, env: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String> + Send + Sync,
    {
        let backend = config.resolve_backend(&env)?;
        let credentials = config.resolve_credentials(&env)?;
        let base = backend.url();
        debug!(backend = %backend, "connecting");

        let http = TransportConfig::default()
            .with_tls(config.tls.clone())
            .with_timeout(config.timeout)
            .build_client()?;

        let endpoint = match &config.auth_server {
            AuthServer::Backend => TokenEndpoint::backend(&base)?,
            AuthServer::OAuth { domain, client_id } => TokenEndpoint::oauth(domain, client_id.clone())?,
        };
        let auth = AuthProvider::login(http.clone(), endpoint, credentials).await?;
        let client = GalileoClient::new(http, base, Arc::new(auth)).with_universe(config.universe.clone());

        let galileo = Self::from_parts(
            backend,
            client,
            config.reconnect.clone(),
            config.tls.clone(),
        );
        if config.connect_events {
            galileo.open_events().await?;
        }
        info!(backend = %galileo.inner.backend, "connected");
        Ok(galileo)
    }

    /// Wrap an already authenticated client.
    pub fn from_client(client: GalileoClient) -> Self {
        let backend = Backend::Custom(client.backend().clone());
        Self::from_parts(backend, client, ReconnectConfig::default(), TlsMode::default())
    }

    fn from_parts(
        backend: Backend,
        client: GalileoClient,
        reconnect: ReconnectConfig,
        tls: TlsMode,
    ) -> Self {
        Self {
            inner: Arc::new(GalileoInner {
                backend,
                client: Arc::new(client),
                registry: EventRegistry::new(),
                reconnect,
                tls,
                connector: Mutex::new(None),
            }),
        }
    }

    /// One-shot: connect, run the closure, disconnect.
    pub async fn oneshot<F, Fut, T>(config: SdkConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Galileo) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let galileo = Self::connect(config).await?;
        let result = f(galileo.clone()).await;
        galileo.disconnect().await;
        result
    }

    // ── Services ─────────────────────────────────────────────────────

    pub fn jobs(&self) -> JobsService {
        JobsService::new(Arc::clone(&self.inner.client))
    }

    pub fn machines(&self) -> MachinesService {
        MachinesService::new(Arc::clone(&self.inner.client))
    }

    pub fn stations(&self) -> StationsService {
        StationsService::new(Arc::clone(&self.inner.client))
    }

    pub fn profiles(&self) -> ProfilesService {
        ProfilesService::new(Arc::clone(&self.inner.client))
    }

    pub fn missions(&self) -> MissionsService {
        MissionsService::new(Arc::clone(&self.inner.client))
    }

    pub fn universes(&self) -> UniversesService {
        UniversesService::new(Arc::clone(&self.inner.client))
    }

    pub fn cargo_bays(&self) -> CargoBaysService {
        CargoBaysService::new(Arc::clone(&self.inner.client))
    }

    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// The underlying REST client, e.g. to read the current refresh token.
    pub fn client(&self) -> &Arc<GalileoClient> {
        &self.inner.client
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Handler registry. Handlers may be added before or after the
    /// channel is open.
    pub fn events(&self) -> &EventRegistry {
        &self.inner.registry
    }

    /// Open the event channel if it is not open yet. A channel that gave
    /// up reconnecting is replaced by a fresh one.
    pub async fn open_events(&self) -> Result<(), CoreError> {
        let mut slot = self.inner.connector.lock().await;
        if slot.as_ref().is_some_and(EventConnector::is_connected) {
            return Ok(());
        }
        if let Some(stale) = slot.take() {
            stale.disconnect().await;
        }
        let connector = EventConnector::connect(
            self.inner.client.backend(),
            &self.inner.tls,
            Arc::clone(self.inner.client.auth()),
            self.inner.registry.clone(),
            self.inner.reconnect.clone(),
        )
        .await?;
        *slot = Some(connector);
        Ok(())
    }

    pub async fn events_connected(&self) -> bool {
        self.inner
            .connector
            .lock()
            .await
            .as_ref()
            .is_some_and(EventConnector::is_connected)
    }

    /// Resolves once the event channel has stopped: disconnected, or out
    /// of reconnect attempts. Resolves at once when it was never opened.
    pub async fn events_closed(&self) {
        let signal = self
            .inner
            .connector
            .lock()
            .await
            .as_ref()
            .map(EventConnector::closed_signal);
        if let Some(signal) = signal {
            signal.cancelled().await;
        }
    }

    /// Close the event channel. A no-op when it was never opened.
    pub async fn disconnect(&self) {
        let connector = self.inner.connector.lock().await.take();
        if let Some(connector) = connector {
            connector.disconnect().await;
        }
        debug!("disconnected");
    }
}
