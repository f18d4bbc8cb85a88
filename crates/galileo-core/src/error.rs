// ── Core error types ──
//
// User-facing errors from galileo-core. The `From<galileo_api::Error>` impl
// translates transport-layer errors into domain variants; callers match on
// these rather than on HTTP details.

use thiserror::Error;

/// Failures while decoding or routing push events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Unknown event: {name}")]
    UnknownEvent { name: String },

    #[error("Unknown event category: {name}")]
    UnknownCategory { name: String },

    /// A required key was missing or had the wrong type.
    #[error("Malformed `{event}` payload: {message}")]
    Payload { event: String, message: String },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Authentication token AND refresh token (OR) username AND password, must be provided")]
    MissingCredentials,

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data ─────────────────────────────────────────────────────────
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code, when the backend answered.
        status: Option<u16>,
    },

    #[error(transparent)]
    Event(#[from] EventError),

    // ── Environment ──────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Build a mapper that turns a 404 into `NotFound { entity, id }`.
    pub(crate) fn not_found(
        entity: &'static str,
        id: &str,
    ) -> impl FnOnce(galileo_api::Error) -> CoreError {
        let id = id.to_owned();
        move |err| {
            if err.is_not_found() {
                CoreError::NotFound {
                    entity: entity.into(),
                    id,
                }
            } else {
                err.into()
            }
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<galileo_api::Error> for CoreError {
    fn from(err: galileo_api::Error) -> Self {
        use galileo_api::Error as Api;

        match err {
            Api::Authentication { message }
            | Api::TokenRefresh { message }
            | Api::DeviceAuthorization { message } => CoreError::Authentication { message },
            Api::MissingCredentials => CoreError::MissingCredentials,
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            Api::Http { status: 401, message } => CoreError::Authentication { message },
            Api::Http { status: 404, message } => CoreError::NotFound {
                entity: "resource".into(),
                id: message,
            },
            Api::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("event channel: {reason}"),
            },
            Api::SocketIo { message } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("event channel refused: {message}"),
            },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            Api::Io(e) => CoreError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_statuses_map_to_domain_errors() {
        let unauthorized: CoreError = galileo_api::Error::Http {
            status: 401,
            message: "expired".into(),
        }
        .into();
        assert!(matches!(unauthorized, CoreError::Authentication { .. }));

        let conflict: CoreError = galileo_api::Error::Http {
            status: 409,
            message: "exists".into(),
        }
        .into();
        assert_eq!(conflict.status(), Some(409));
    }

    #[test]
    fn not_found_mapper_names_the_entity() {
        let map = CoreError::not_found("machine", "m-9");
        let err = map(galileo_api::Error::Http {
            status: 404,
            message: "nope".into(),
        });
        assert_eq!(err.to_string(), "machine not found: m-9");
    }

    #[test]
    fn missing_credentials_message_is_stable() {
        let err: CoreError = galileo_api::Error::MissingCredentials.into();
        assert_eq!(
            err.to_string(),
            "Authentication token AND refresh token (OR) username AND password, must be provided"
        );
    }
}
