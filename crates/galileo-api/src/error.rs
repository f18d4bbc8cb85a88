use thiserror::Error;

/// Top-level error type for the `galileo-api` crate.
///
/// Covers every failure mode across the REST and push-event surfaces:
/// authentication, transport, HTTP status, deserialization, and Socket.IO.
/// `galileo-core` maps these into its own error type.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login was rejected (bad credentials, unknown user, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The refresh token was rejected or the refresh endpoint failed.
    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    /// Neither a token pair nor a username/password pair was supplied.
    #[error("Authentication token AND refresh token (OR) username AND password, must be provided")]
    MissingCredentials,

    /// Device authorization was denied or expired before approval.
    #[error("Device authorization failed: {message}")]
    DeviceAuthorization { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP status ─────────────────────────────────────────────────
    /// Non-2xx response from the backend.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── Push events ─────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The Socket.IO handshake or namespace connect was refused.
    #[error("Socket.IO error: {message}")]
    SocketIo { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Local file I/O (uploads, downloads).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error indicates the access token is no
    /// longer accepted and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::TokenRefresh { .. }
                | Self::Http {
                    status: 401 | 403,
                    ..
                }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            Self::WebSocketConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
