// Token-based authentication for the Galileo backend.
//
// The provider owns the access/refresh token pair. Every REST call reads
// the access token; only `refresh()` writes it.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;

/// Path of the password/refresh token endpoint, relative to the backend.
pub const TOKEN_PATH: &str = "/galileo/landing_zone/v1/oauth/token";

/// How the SDK proves who it is.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A previously issued access/refresh token pair.
    Tokens {
        access: SecretString,
        refresh: SecretString,
    },
    /// A stored refresh token only; exchanged for an access token at login.
    RefreshToken(SecretString),
    /// Username and password for the password grant.
    Password {
        username: String,
        password: SecretString,
    },
}

/// Where tokens are issued and refreshed.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    pub url: Url,
    /// OAuth client id, sent on refresh when the tokens came from a
    /// third-party authorization server.
    pub client_id: Option<String>,
}

impl TokenEndpoint {
    /// The backend's own token endpoint.
    pub fn backend(backend: &Url) -> Result<Self, Error> {
        let base = backend.as_str().trim_end_matches('/');
        Ok(Self {
            url: Url::parse(&format!("{base}{TOKEN_PATH}"))?,
            client_id: None,
        })
    }

    /// An OAuth authorization server's `/oauth/token` endpoint.
    pub fn oauth(domain: &Url, client_id: impl Into<String>) -> Result<Self, Error> {
        let base = domain.as_str().trim_end_matches('/');
        Ok(Self {
            url: Url::parse(&format!("{base}/oauth/token"))?,
            client_id: Some(client_id.into()),
        })
    }
}

/// Successful token grant response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token, in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    username: &'a str,
    password: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<&'a str>,
}

#[derive(Debug)]
struct TokenPair {
    access: SecretString,
    refresh: Option<SecretString>,
    expires_in: Option<u64>,
}

/// Holds the current token pair and knows how to refresh it.
pub struct AuthProvider {
    http: reqwest::Client,
    endpoint: TokenEndpoint,
    tokens: RwLock<TokenPair>,
}

impl std::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthProvider")
            .field("endpoint", &self.endpoint.url.as_str())
            .finish_non_exhaustive()
    }
}

impl AuthProvider {
    /// Exchange `credentials` for a usable token pair.
    ///
    /// A token pair is accepted as-is; a bare refresh token or a
    /// username/password triggers one request to the token endpoint.
    pub async fn login(
        http: reqwest::Client,
        endpoint: TokenEndpoint,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let pair = match credentials {
            Credentials::Tokens { access, refresh } => TokenPair {
                access,
                refresh: Some(refresh),
                expires_in: None,
            },
            Credentials::RefreshToken(refresh) => {
                let grant = refresh_grant(&http, &endpoint, &refresh).await?;
                token_pair(grant, Some(refresh))
            }
            Credentials::Password { username, password } => {
                let grant = password_grant(&http, &endpoint, &username, &password).await?;
                token_pair(grant, None)
            }
        };

        Ok(Self {
            http,
            endpoint,
            tokens: RwLock::new(pair),
        })
    }

    /// Current access token.
    pub fn access_token(&self) -> SecretString {
        self.tokens
            .read()
            .expect("token lock poisoned")
            .access
            .clone()
    }

    /// Current refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.tokens
            .read()
            .expect("token lock poisoned")
            .refresh
            .clone()
    }

    /// Access-token lifetime reported by the most recent grant.
    pub fn expires_in(&self) -> Option<u64> {
        self.tokens.read().expect("token lock poisoned").expires_in
    }

    /// Trade the refresh token for a new access token.
    pub async fn refresh(&self) -> Result<(), Error> {
        let Some(refresh) = self.refresh_token() else {
            return Err(Error::TokenRefresh {
                message: "no refresh token available".into(),
            });
        };

        let grant = refresh_grant(&self.http, &self.endpoint, &refresh).await?;
        let pair = token_pair(grant, Some(refresh));
        *self.tokens.write().expect("token lock poisoned") = pair;
        info!("access token refreshed");
        Ok(())
    }
}

fn token_pair(grant: TokenResponse, previous_refresh: Option<SecretString>) -> TokenPair {
    TokenPair {
        access: SecretString::from(grant.access_token),
        refresh: grant
            .refresh_token
            .map(SecretString::from)
            .or(previous_refresh),
        expires_in: grant.expires_in,
    }
}

async fn password_grant(
    http: &reqwest::Client,
    endpoint: &TokenEndpoint,
    username: &str,
    password: &SecretString,
) -> Result<TokenResponse, Error> {
    debug!(url = %endpoint.url, username, "password login");

    let body = PasswordGrant {
        username,
        password: password.expose_secret(),
        grant_type: "password",
    };
    let resp = http.post(endpoint.url.clone()).json(&body).send().await?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: format!("HTTP {status}: {}", error_detail(&text)),
        });
    }

    parse_token_response(resp).await
}

async fn refresh_grant(
    http: &reqwest::Client,
    endpoint: &TokenEndpoint,
    refresh: &SecretString,
) -> Result<TokenResponse, Error> {
    debug!(url = %endpoint.url, "refresh token grant");

    let body = RefreshGrant {
        grant_type: "refresh_token",
        refresh_token: refresh.expose_secret(),
        client_id: endpoint.client_id.as_deref(),
    };
    let resp = http.post(endpoint.url.clone()).json(&body).send().await?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        warn!(%status, "refresh token rejected");
        return Err(Error::TokenRefresh {
            message: format!("HTTP {status}: {}", error_detail(&text)),
        });
    }

    parse_token_response(resp).await
}

pub(crate) async fn parse_token_response(resp: reqwest::Response) -> Result<TokenResponse, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("token response: {e}"),
        body,
    })
}

/// Pull a human-readable message out of an error body.
pub(crate) fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<serde_json::Value>,
        #[serde(default)]
        error_description: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.error_description.or(parsed.message) {
            return msg;
        }
        match parsed.error {
            Some(serde_json::Value::String(s)) => return s,
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".into()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn backend_token_endpoint_joins_path() {
        let backend = Url::parse("https://api.example.com/").expect("url");
        let endpoint = TokenEndpoint::backend(&backend).expect("endpoint");
        assert_eq!(
            endpoint.url.as_str(),
            "https://api.example.com/galileo/landing_zone/v1/oauth/token"
        );
        assert!(endpoint.client_id.is_none());
    }

    #[test]
    fn error_detail_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"bad password"}"#;
        assert_eq!(error_detail(body), "bad password");
        assert_eq!(error_detail(r#"{"error":"invalid_grant"}"#), "invalid_grant");
        assert_eq!(error_detail("  "), "empty response body");
        assert_eq!(error_detail("plain text"), "plain text");
    }

    #[test]
    fn refresh_keeps_previous_token_when_not_rotated() {
        let grant = TokenResponse {
            access_token: "new-access".into(),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: None,
        };
        let pair = token_pair(grant, Some(SecretString::from("old-refresh")));
        assert_eq!(pair.access.expose_secret(), "new-access");
        assert_eq!(
            pair.refresh.as_ref().map(|s| s.expose_secret()),
            Some("old-refresh")
        );
        assert_eq!(pair.expires_in, Some(3600));
    }
}
