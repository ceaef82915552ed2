// Typed resource client for the Network API.
//
// One method per documented operation. Every GET runs under the retry
// policy; the device action endpoint is non-idempotent and always gets
// exactly one transport call.

use futures_core::Stream;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiErrorKind, Error};
use crate::paginate::{self, DEFAULT_PAGE_LIMIT};
use crate::retry::RetryPolicy;
use crate::transport::{RawResponse, Transport, TransportConfig};
use crate::types;

/// Immutable client configuration, set once at construction.
///
/// Safe for concurrent reads: the client never mutates it, so one config can
/// back any number of clones across tasks.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller base URL (e.g. `https://192.168.1.1`).
    pub base_url: String,
    /// Static API key, sent as `X-API-Key` on every request.
    pub api_key: SecretString,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
    /// Page size used by the streaming list accessors.
    pub page_limit: i32,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            transport: TransportConfig::default(),
            retry: RetryPolicy::default(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_limit(mut self, page_limit: i32) -> Self {
        self.page_limit = page_limit;
        self
    }
}

/// Async client for the Network API.
///
/// Holds no shared mutable state: concurrent calls from multiple tasks are
/// independent, and pagination within one call is strictly sequential.
#[derive(Debug, Clone)]
pub struct SitelineClient {
    transport: Transport,
    retry: RetryPolicy,
    page_limit: i32,
    cancel: Option<CancellationToken>,
}

impl SitelineClient {
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let transport = Transport::new(&config.base_url, &config.api_key, &config.transport)?;
        Ok(Self {
            transport,
            retry: config.retry.clone(),
            page_limit: config.page_limit,
            cancel: None,
        })
    }

    /// A handle that observes `token` at every suspension point: before each
    /// attempt, during backoff, and between pages. An in-flight device
    /// action is awaited to completion before cancellation surfaces, so no
    /// orphaned action is left behind.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        let mut client = self.clone();
        client.cancel = Some(token);
        client
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    fn decode<T: DeserializeOwned>(resp: &RawResponse) -> Result<T, Error> {
        if resp.status.is_success() {
            serde_json::from_slice(&resp.body).map_err(|e| {
                let body = String::from_utf8_lossy(&resp.body).into_owned();
                let preview: String = body.chars().take(200).collect();
                Error::Decode {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Error::Api(ApiError::from_response(
                resp.status,
                resp.retry_after(),
                &resp.body,
            )))
        }
    }

    /// GET + decode under the retry policy. Idempotent operations only.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        self.retry
            .run(self.cancel.as_ref(), move || async move {
                let resp = self.transport.get(path, query).await?;
                Self::decode(&resp)
            })
            .await
    }

    // ── System Info ──────────────────────────────────────────────────

    pub async fn get_info(&self) -> Result<types::ApplicationInfoResponse, Error> {
        self.get_json("v1/info", &[]).await
    }

    /// Probe the configured API key by listing sites.
    ///
    /// Auth rejections map to `Ok(false)`; any other failure propagates.
    pub async fn validate_api_key(&self) -> Result<bool, Error> {
        match self.list_sites(0, 1).await {
            Ok(_) => Ok(true),
            Err(err)
                if matches!(
                    err.api_kind(),
                    Some(ApiErrorKind::Unauthorized | ApiErrorKind::Forbidden)
                ) =>
            {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    // ── Sites ────────────────────────────────────────────────────────

    pub async fn list_sites(
        &self,
        offset: i64,
        limit: i32,
    ) -> Result<types::Page<types::SiteResponse>, Error> {
        self.get_json("v1/sites", &pagination_query(offset, limit))
            .await
    }

    /// All sites as a lazy stream, one page request at a time.
    pub fn sites(&self) -> impl Stream<Item = Result<types::SiteResponse, Error>> + '_ {
        paginate::paginate(self.page_limit, move |offset, limit| {
            self.list_sites(offset, limit)
        })
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn list_devices(
        &self,
        site_id: &str,
        offset: i64,
        limit: i32,
    ) -> Result<types::Page<types::DeviceResponse>, Error> {
        require_id("site_id", site_id)?;
        self.get_json(
            &format!("v1/sites/{site_id}/devices"),
            &pagination_query(offset, limit),
        )
        .await
    }

    /// All adopted devices of a site as a lazy stream.
    pub fn devices<'a>(
        &'a self,
        site_id: &'a str,
    ) -> impl Stream<Item = Result<types::DeviceResponse, Error>> + 'a {
        paginate::paginate(self.page_limit, move |offset, limit| {
            self.list_devices(site_id, offset, limit)
        })
    }

    pub async fn get_device(
        &self,
        site_id: &str,
        device_id: &str,
    ) -> Result<types::DeviceDetailsResponse, Error> {
        require_id("site_id", site_id)?;
        require_id("device_id", device_id)?;
        self.get_json(&format!("v1/sites/{site_id}/devices/{device_id}"), &[])
            .await
    }

    pub async fn get_device_statistics(
        &self,
        site_id: &str,
        device_id: &str,
    ) -> Result<types::DeviceStatisticsResponse, Error> {
        require_id("site_id", site_id)?;
        require_id("device_id", device_id)?;
        self.get_json(
            &format!("v1/sites/{site_id}/devices/{device_id}/statistics/latest"),
            &[],
        )
        .await
    }

    /// Execute an action on a device. Non-idempotent: never retried, and a
    /// timeout surfaces as [`Error::AmbiguousOutcome`] because the action
    /// may have executed anyway.
    pub async fn execute_device_action(
        &self,
        site_id: &str,
        device_id: &str,
        action: types::DeviceAction,
    ) -> Result<types::DeviceActionResponse, Error> {
        require_id("site_id", site_id)?;
        require_id("device_id", device_id)?;
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }

        let body = types::DeviceActionRequest { action };
        let result = self
            .transport
            .post(
                &format!("v1/sites/{site_id}/devices/{device_id}/actions"),
                &body,
            )
            .await
            .and_then(|resp| Self::decode(&resp));

        match result {
            Err(Error::Timeout { timeout_secs }) => Err(Error::AmbiguousOutcome {
                message: format!(
                    "device action {action} timed out after {timeout_secs}s; \
                     it may still have executed"
                ),
            }),
            other => other,
        }
    }

    /// Restart a device, checking the controller's acknowledgement.
    pub async fn restart_device(&self, site_id: &str, device_id: &str) -> Result<(), Error> {
        let ack = self
            .execute_device_action(site_id, device_id, types::DeviceAction::Restart)
            .await?;
        if ack.status != "OK" {
            return Err(Error::AmbiguousOutcome {
                message: format!("controller acknowledged restart with status {:?}", ack.status),
            });
        }
        Ok(())
    }

    // ── Clients ──────────────────────────────────────────────────────

    pub async fn list_clients(
        &self,
        site_id: &str,
        offset: i64,
        limit: i32,
    ) -> Result<types::Page<types::ClientResponse>, Error> {
        require_id("site_id", site_id)?;
        self.get_json(
            &format!("v1/sites/{site_id}/clients"),
            &pagination_query(offset, limit),
        )
        .await
    }

    /// All network clients of a site as a lazy stream.
    pub fn clients<'a>(
        &'a self,
        site_id: &'a str,
    ) -> impl Stream<Item = Result<types::ClientResponse, Error>> + 'a {
        paginate::paginate(self.page_limit, move |offset, limit| {
            self.list_clients(site_id, offset, limit)
        })
    }
}

fn pagination_query(offset: i64, limit: i32) -> [(&'static str, String); 2] {
    [("offset", offset.to_string()), ("limit", limit.to_string())]
}

/// Fail fast on an empty path parameter rather than issuing a request whose
/// path would collapse onto a different endpoint.
fn require_id(field: &'static str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            field,
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}
