// Galileo REST client
//
// One helper for every resource: URL = backend + namespace + endpoint + query,
// bearer token and optional universe header on each request, non-2xx mapped
// to `Error::Http`, and a single refresh-and-retry when the backend answers 401.

use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use super::query::QueryParams;
use crate::auth::{AuthProvider, error_detail};
use crate::error::Error;

/// Path prefix of every user-facing REST endpoint.
pub const NAMESPACE: &str = "/galileo/user_interface/v1";

/// Request body variants the helper knows how to replay.
enum Payload<'a> {
    Empty,
    Json(serde_json::Value),
    Bytes { data: &'a [u8], filename: &'a str },
}

/// Authenticated client for the Galileo REST API.
///
/// Resource endpoints live in sibling modules as `impl GalileoClient` blocks.
#[derive(Debug, Clone)]
pub struct GalileoClient {
    http: reqwest::Client,
    backend: Url,
    universe: Option<String>,
    auth: Arc<AuthProvider>,
}

impl GalileoClient {
    pub fn new(http: reqwest::Client, backend: Url, auth: Arc<AuthProvider>) -> Self {
        Self {
            http,
            backend,
            universe: None,
            auth,
        }
    }

    /// Scope every request to a universe via the `universe-id` header.
    pub fn with_universe(mut self, universe: Option<String>) -> Self {
        self.universe = universe;
        self
    }

    pub fn backend(&self) -> &Url {
        &self.backend
    }

    pub fn universe(&self) -> Option<&str> {
        self.universe.as_deref()
    }

    pub fn auth(&self) -> &Arc<AuthProvider> {
        &self.auth
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{backend}/galileo/user_interface/v1{endpoint}?{query}`
    pub(crate) fn url(&self, endpoint: &str, query: &QueryParams) -> Result<Url, Error> {
        let base = self.backend.as_str().trim_end_matches('/');
        let query = query.to_query_string();
        let full = if query.is_empty() {
            format!("{base}{NAMESPACE}{endpoint}")
        } else {
            format!("{base}{NAMESPACE}{endpoint}?{query}")
        };
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &QueryParams,
    ) -> Result<T, Error> {
        let url = self.url(endpoint, query)?;
        debug!("GET {}", url);
        let resp = self.execute(Method::GET, url, &Payload::Empty).await?;
        parse_body(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.url(endpoint, &QueryParams::new())?;
        debug!("POST {}", url);
        let resp = self
            .execute(Method::POST, url, &Payload::Json(to_json(body)?))
            .await?;
        parse_body(resp).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        let url = self.url(endpoint, &QueryParams::new())?;
        debug!("POST {}", url);
        let resp = self.execute(Method::POST, url, &Payload::Empty).await?;
        parse_body(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.url(endpoint, &QueryParams::new())?;
        debug!("PUT {}", url);
        let resp = self
            .execute(Method::PUT, url, &Payload::Json(to_json(body)?))
            .await?;
        parse_body(resp).await
    }

    pub(crate) async fn put_empty<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        let url = self.url(endpoint, &QueryParams::new())?;
        debug!("PUT {}", url);
        let resp = self.execute(Method::PUT, url, &Payload::Empty).await?;
        parse_body(resp).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        let url = self.url(endpoint, &QueryParams::new())?;
        debug!("DELETE {}", url);
        let resp = self.execute(Method::DELETE, url, &Payload::Empty).await?;
        parse_body(resp).await
    }

    pub(crate) async fn delete_with_body<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.url(endpoint, &QueryParams::new())?;
        debug!("DELETE {}", url);
        let resp = self
            .execute(Method::DELETE, url, &Payload::Json(to_json(body)?))
            .await?;
        parse_body(resp).await
    }

    /// POST raw bytes with a `filename` header.
    pub(crate) async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<T, Error> {
        let url = self.url(endpoint, &QueryParams::new())?;
        debug!(filename, bytes = data.len(), "POST {}", url);
        let resp = self
            .execute(Method::POST, url, &Payload::Bytes { data, filename })
            .await?;
        parse_body(resp).await
    }

    /// Stream a GET response body into `dest`, returning the byte count.
    pub(crate) async fn download(
        &self,
        endpoint: &str,
        query: &QueryParams,
        dest: &Path,
    ) -> Result<u64, Error> {
        let url = self.url(endpoint, query)?;
        debug!(dest = %dest.display(), "GET {}", url);
        let resp = self.execute(Method::GET, url, &Payload::Empty).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        }
        file.flush().await?;
        Ok(written)
    }

    // ── Transport core ───────────────────────────────────────────────

    /// Send once; on 401 refresh the token and send the same request again.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        payload: &Payload<'_>,
    ) -> Result<reqwest::Response, Error> {
        let resp = self.build(method.clone(), url.clone(), payload).send().await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check_status(resp).await;
        }

        warn!(%url, "access token rejected, refreshing");
        self.auth.refresh().await?;

        let retry = self.build(method, url, payload).send().await?;
        check_status(retry).await
    }

    fn build(&self, method: Method, url: Url, payload: &Payload<'_>) -> reqwest::RequestBuilder {
        let token = self.auth.access_token();
        let mut builder = self
            .http
            .request(method, url)
            .bearer_auth(token.expose_secret());

        if let Some(ref universe) = self.universe {
            builder = builder.header("universe-id", universe);
        }

        match payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Bytes { data, filename } => builder
                .header("filename", *filename)
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(data.to_vec()),
        }
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Http {
        status: status.as_u16(),
        message: error_detail(&body),
    })
}

/// Parse a JSON body; an empty body parses as `null`.
async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    let text = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(text).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

fn to_json(body: &impl Serialize) -> Result<serde_json::Value, Error> {
    serde_json::to_value(body).map_err(|e| Error::Deserialization {
        message: format!("failed to encode request body: {e}"),
        body: String::new(),
    })
}

/// Pull `key` out of a response envelope such as `{"jobs": [...]}`.
pub(crate) fn field<T: DeserializeOwned>(mut envelope: serde_json::Value, key: &str) -> Result<T, Error> {
    let Some(value) = envelope.get_mut(key).map(serde_json::Value::take) else {
        return Err(Error::Deserialization {
            message: format!("missing field `{key}` in response"),
            body: envelope.to_string(),
        });
    };
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: format!("field `{key}`: {e}"),
        body: envelope.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_unwraps_envelope() {
        let names: Vec<String> = field(json!({"names": ["a", "b"]}), "names").expect("names");
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn field_reports_missing_key() {
        let err = field::<Vec<String>>(json!({"other": []}), "names").expect_err("missing");
        assert!(err.to_string().contains("missing field `names`"), "{err}");
    }
}
