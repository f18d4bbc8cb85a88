// OAuth device authorization flow (RFC 8628) against the Galileo
// authorization server.
//
// `request_code` obtains a user code to show; `poll` waits until the user
// approves it in a browser and returns the issued tokens.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::auth::{TokenResponse, error_detail, parse_token_response};
use crate::error::Error;

pub const DEFAULT_AUTH_DOMAIN: &str = "https://galileoapp.auth0.com";
pub const DEFAULT_CLIENT_ID: &str = "oDmH6Nf4DN3oILcNk7cQqBchXUfv7fpD";

const DEVICE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const SCOPE: &str = "email profile openid offline_access";
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Code pair issued by the device authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    /// Seconds to wait between polls.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Seconds until `device_code` expires.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn default_interval() -> u64 {
    5
}

#[derive(Serialize)]
struct CodeRequest<'a> {
    client_id: &'a str,
    audience: &'a str,
    scope: &'static str,
}

#[derive(Serialize)]
struct PollRequest<'a> {
    grant_type: &'static str,
    device_code: &'a str,
    client_id: &'a str,
}

#[derive(Deserialize)]
struct PollError {
    #[serde(default)]
    error: String,
}

#[derive(Debug, Clone)]
pub struct DeviceFlow {
    http: reqwest::Client,
    domain: Url,
    client_id: String,
    audience: String,
}

impl DeviceFlow {
    pub fn new(
        http: reqwest::Client,
        domain: Url,
        client_id: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            http,
            domain,
            client_id: client_id.into(),
            audience: audience.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn domain(&self) -> &Url {
        &self.domain
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.domain.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// Start the flow: `POST /oauth/device/code`.
    pub async fn request_code(&self) -> Result<DeviceCode, Error> {
        let url = self.endpoint("/oauth/device/code")?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .form(&CodeRequest {
                client_id: &self.client_id,
                audience: &self.audience,
                scope: SCOPE,
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::DeviceAuthorization {
                message: format!("HTTP {status}: {}", error_detail(&body)),
            });
        }
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("device code response: {e}"),
            body,
        })
    }

    /// Poll `POST /oauth/token` until the user approves or rejects the code.
    ///
    /// `authorization_pending` keeps polling at the server's interval,
    /// `slow_down` widens it by five seconds, anything else is fatal.
    pub async fn poll(&self, code: &DeviceCode) -> Result<TokenResponse, Error> {
        let url = self.endpoint("/oauth/token")?;
        let mut interval = Duration::from_secs(code.interval);
        let deadline = code
            .expires_in
            .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

        loop {
            debug!("POST {}", url);
            let resp = self
                .http
                .post(url.clone())
                .form(&PollRequest {
                    grant_type: DEVICE_GRANT,
                    device_code: &code.device_code,
                    client_id: &self.client_id,
                })
                .send()
                .await?;

            if resp.status().is_success() {
                info!("device authorization approved");
                return parse_token_response(resp).await;
            }

            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<PollError>(&body)
                .map(|e| e.error)
                .unwrap_or_default();

            match reason.as_str() {
                "authorization_pending" => {}
                "slow_down" => interval += SLOW_DOWN_STEP,
                _ => {
                    return Err(Error::DeviceAuthorization {
                        message: format!("HTTP {status}: {}", error_detail(&body)),
                    });
                }
            }

            if deadline.is_some_and(|d| tokio::time::Instant::now() + interval >= d) {
                return Err(Error::DeviceAuthorization {
                    message: "device code expired before it was approved".into(),
                });
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn device_code_defaults_interval() {
        let code: DeviceCode = serde_json::from_str(
            r#"{"device_code":"d","user_code":"ABCD-EFGH","verification_uri":"https://x/activate"}"#,
        )
        .expect("code");
        assert_eq!(code.interval, 5);
        assert!(code.verification_uri_complete.is_none());
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let flow = DeviceFlow::new(
            reqwest::Client::new(),
            Url::parse("https://auth.example.com/").expect("url"),
            "cid",
            "aud",
        );
        assert_eq!(
            flow.endpoint("/oauth/token").expect("url").as_str(),
            "https://auth.example.com/oauth/token"
        );
    }
}
