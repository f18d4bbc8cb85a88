// ── SDK connection settings ──
//
// Describes *where* the backend lives and *who* is calling. Never touches
// disk: the CLI (or any embedding program) builds an `SdkConfig` and the
// facade resolves it against the process environment.

use std::str::FromStr;
use std::time::Duration;

use galileo_api::device_flow::{DEFAULT_AUTH_DOMAIN, DEFAULT_CLIENT_ID};
use galileo_api::{Credentials, ReconnectConfig, TlsMode};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Backend override; `production`, `development`, or a base URL.
pub const ENV_CONFIG: &str = "GALILEO_CONFIG";
pub const ENV_TOKEN: &str = "GALILEO_TOKEN";
pub const ENV_REFRESH_TOKEN: &str = "GALILEO_REFRESH_TOKEN";
pub const ENV_USER: &str = "GALILEO_USER";
pub const ENV_PASSWORD: &str = "GALILEO_PASSWORD";

const PRODUCTION_URL: &str = "https://booming-client-217619.appspot.com";
const DEVELOPMENT_URL: &str = "https://profound-ripsaw-232522.appspot.com";

// ── Backend ──────────────────────────────────────────────────────────

/// Which Galileo deployment to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Production,
    Development,
    Custom(Url),
}

impl Backend {
    pub fn url(&self) -> Url {
        match self {
            Self::Production => fixed_url(PRODUCTION_URL),
            Self::Development => fixed_url(DEVELOPMENT_URL),
            Self::Custom(url) => url.clone(),
        }
    }

    /// OAuth audience for the device flow. Custom backends use their own URL.
    pub fn audience(&self) -> String {
        self.url().as_str().trim_end_matches('/').to_owned()
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Custom(url) => url.as_str(),
        }
    }
}

impl FromStr for Backend {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Url::parse(other)
                .map(Self::Custom)
                .map_err(|e| CoreError::Config {
                    message: format!(
                        "backend must be `production`, `development`, or a URL (got {other:?}: {e})"
                    ),
                }),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn fixed_url(raw: &str) -> Url {
    #[allow(clippy::expect_used)]
    Url::parse(raw).expect("built-in backend URL is valid")
}

// ── Token issuer ─────────────────────────────────────────────────────

/// Where refresh tokens are redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthServer {
    /// The backend's own `/galileo/landing_zone/v1/oauth/token`.
    #[default]
    Backend,
    /// An OAuth authorization server (tokens from the device flow).
    OAuth { domain: Url, client_id: String },
}

impl AuthServer {
    /// The hosted authorization server used by `galileo login`.
    pub fn hosted() -> Self {
        Self::OAuth {
            domain: fixed_url(DEFAULT_AUTH_DOMAIN),
            client_id: DEFAULT_CLIENT_ID.into(),
        }
    }
}

// ── SdkConfig ────────────────────────────────────────────────────────

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// `production`, `development`, or a base URL. `GALILEO_CONFIG` wins.
    pub backend: Option<String>,
    pub universe: Option<String>,
    pub auth_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub auth_server: AuthServer,
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Open the push-event channel on connect.
    pub connect_events: bool,
    pub reconnect: ReconnectConfig,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            backend: None,
            universe: None,
            auth_token: None,
            refresh_token: None,
            username: None,
            password: None,
            auth_server: AuthServer::Backend,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            connect_events: false,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl SdkConfig {
    /// Backend: `GALILEO_CONFIG`, then the explicit value, then production.
    pub fn resolve_backend<F>(&self, env: F) -> Result<Backend, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match non_empty(env(ENV_CONFIG)).or_else(|| self.backend.clone()) {
            Some(raw) => raw.parse(),
            None => Ok(Backend::Production),
        }
    }

    /// First complete credential set wins:
    ///
    /// 1. `GALILEO_TOKEN` + `GALILEO_REFRESH_TOKEN`
    /// 2. `GALILEO_USER` + `GALILEO_PASSWORD`
    /// 3. explicit token pair
    /// 4. explicit refresh token alone
    /// 5. explicit username + password
    pub fn resolve_credentials<F>(&self, env: F) -> Result<Credentials, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let (Some(access), Some(refresh)) =
            (non_empty(env(ENV_TOKEN)), non_empty(env(ENV_REFRESH_TOKEN)))
        {
            return Ok(Credentials::Tokens {
                access: SecretString::from(access),
                refresh: SecretString::from(refresh),
            });
        }

        if let (Some(username), Some(password)) =
            (non_empty(env(ENV_USER)), non_empty(env(ENV_PASSWORD)))
        {
            return Ok(Credentials::Password {
                username,
                password: SecretString::from(password),
            });
        }

        match (&self.auth_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => {
                return Ok(Credentials::Tokens {
                    access: access.clone(),
                    refresh: refresh.clone(),
                });
            }
            (None, Some(refresh)) => return Ok(Credentials::RefreshToken(refresh.clone())),
            _ => {}
        }

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Ok(Credentials::Password {
                username: username.clone(),
                password: password.clone(),
            });
        }

        Err(CoreError::MissingCredentials)
    }
}

/// An env value, treating set-but-blank as unset.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn backend_defaults_to_production() {
        let config = SdkConfig::default();
        assert_eq!(config.resolve_backend(env_of(&[])).unwrap(), Backend::Production);
    }

    #[test]
    fn env_backend_beats_explicit() {
        let config = SdkConfig {
            backend: Some("production".into()),
            ..SdkConfig::default()
        };
        let backend = config
            .resolve_backend(env_of(&[(ENV_CONFIG, "development")]))
            .unwrap();
        assert_eq!(backend, Backend::Development);
        assert_eq!(
            backend.url().as_str(),
            "https://profound-ripsaw-232522.appspot.com/"
        );
    }

    #[test]
    fn literal_backend_url() {
        let config = SdkConfig {
            backend: Some("http://localhost:5000".into()),
            ..SdkConfig::default()
        };
        let backend = config.resolve_backend(env_of(&[])).unwrap();
        assert_eq!(backend.url().as_str(), "http://localhost:5000/");
        assert_eq!(backend.audience(), "http://localhost:5000");

        let bad = SdkConfig {
            backend: Some("staging".into()),
            ..SdkConfig::default()
        };
        assert!(matches!(
            bad.resolve_backend(env_of(&[])),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn env_tokens_beat_everything() {
        let config = SdkConfig {
            username: Some("ada".into()),
            password: Some(SecretString::from("pw".to_owned())),
            ..SdkConfig::default()
        };
        let creds = config
            .resolve_credentials(env_of(&[
                (ENV_TOKEN, "acc"),
                (ENV_REFRESH_TOKEN, "ref"),
                (ENV_USER, "env-user"),
                (ENV_PASSWORD, "env-pw"),
            ]))
            .unwrap();
        let Credentials::Tokens { access, refresh } = creds else {
            panic!("expected token credentials");
        };
        assert_eq!(access.expose_secret(), "acc");
        assert_eq!(refresh.expose_secret(), "ref");
    }

    #[test]
    fn env_password_beats_explicit_tokens() {
        let config = SdkConfig {
            auth_token: Some(SecretString::from("a".to_owned())),
            refresh_token: Some(SecretString::from("r".to_owned())),
            ..SdkConfig::default()
        };
        let creds = config
            .resolve_credentials(env_of(&[(ENV_USER, "env-user"), (ENV_PASSWORD, "env-pw")]))
            .unwrap();
        assert!(matches!(creds, Credentials::Password { ref username, .. } if username == "env-user"));
    }

    #[test]
    fn half_a_token_pair_in_env_is_ignored() {
        let config = SdkConfig {
            username: Some("ada".into()),
            password: Some(SecretString::from("pw".to_owned())),
            ..SdkConfig::default()
        };
        let creds = config
            .resolve_credentials(env_of(&[(ENV_TOKEN, "acc")]))
            .unwrap();
        assert!(matches!(creds, Credentials::Password { .. }));
    }

    #[test]
    fn stored_refresh_token_alone_is_enough() {
        let config = SdkConfig {
            refresh_token: Some(SecretString::from("saved".to_owned())),
            ..SdkConfig::default()
        };
        let creds = config.resolve_credentials(env_of(&[])).unwrap();
        assert!(matches!(creds, Credentials::RefreshToken(_)));
    }

    #[test]
    fn nothing_supplied_is_an_error() {
        let err = SdkConfig::default()
            .resolve_credentials(env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingCredentials));
    }
}
