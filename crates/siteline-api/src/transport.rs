// HTTP transport for the Network API.
//
// Builds the underlying reqwest::Client (TLS mode, timeout, default headers)
// and performs raw exchanges. A non-2xx status is returned as data, never as
// an error -- classification happens at the error-normalization layer. No
// retries happen here either; the retry policy sits above.

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Header carrying the static API key on every request.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for controllers with self-signed certs).
    DangerAcceptInvalid,
}

/// Transport configuration, fixed at client construction.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout, enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the given default headers.
    fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("siteline-api/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Raw result of one HTTP exchange. Present whenever the server answered,
/// regardless of status class.
#[derive(Debug)]
pub struct RawResponse {
    pub status: reqwest::StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Parsed `Retry-After` header in delay-seconds form, if present.
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }
}

/// Transport adapter: one `send` per API call, no shared mutable state.
///
/// Cheap to clone; concurrent calls from multiple tasks are independent.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl Transport {
    /// Build a transport that attaches `X-API-Key` and
    /// `Accept: application/json` to every request.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Validation {
                field: "api_key",
                reason: format!("not a valid header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = config.build_client_with_headers(headers)?;
        let base_url = normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// Join a relative path (e.g. `"v1/sites"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={query:?}");

        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let resp = request.send().await.map_err(|e| self.classify(e))?;
        self.read(resp).await
    }

    pub async fn post<B: serde::Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.read(resp).await
    }

    /// Map a connection-level failure to the transport taxonomy.
    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn read(&self, resp: reqwest::Response) -> Result<RawResponse, Error> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(|e| self.classify(e))?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Parse the base URL and guarantee a trailing slash, so joining `v1/…`
/// preserves any path prefix the deployment sits behind.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
