//! Wire types for the Network API.
//!
//! All types match the JSON responses from `/v1/` endpoints. Field names use
//! camelCase via `#[serde(rename_all = "camelCase")]`. Every entity is an
//! immutable, request-scoped snapshot -- nothing here persists across calls.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Pagination ───────────────────────────────────────────────────────

/// Generic pagination wrapper returned by all list endpoints.
///
/// Invariants (server-maintained): `count == data.len()`, `limit` bounds
/// `count` from above, and `offset + count <= total_count` except on the
/// final page. `total_count` may drift between page fetches -- listings are
/// eventually consistent, not snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub offset: i64,
    pub limit: i32,
    pub count: i32,
    pub total_count: i64,
    pub data: Vec<T>,
}

// ── Sites ────────────────────────────────────────────────────────────

/// Site overview — from `GET /v1/sites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResponse {
    /// Opaque identifier. Used in device/client paths.
    pub id: String,
    pub name: String,
}

// ── Devices ──────────────────────────────────────────────────────────

/// Device lifecycle state as reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    Online,
    Offline,
    PendingAdoption,
    Updating,
    GettingReady,
    Adopting,
    Deleting,
    ConnectionInterrupted,
    Isolated,
    /// States added by newer controller releases.
    #[serde(other)]
    Unknown,
}

impl DeviceState {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Adopted device overview — from `GET /v1/sites/{siteId}/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: String,
    pub name: String,
    pub model: String,
    pub state: DeviceState,
    pub mac_address: String,
    pub ip_address: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// Interface kinds present on the device (e.g. `PORTS`, `RADIOS`).
    #[serde(default)]
    pub interfaces: Vec<String>,
}

/// Weak reference to the upstream device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUplink {
    pub device_id: String,
}

/// Physical ethernet port attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthernetPort {
    pub idx: i32,
    pub state: Option<String>,
    pub connector: Option<String>,
    pub max_speed_mbps: Option<i64>,
    pub speed_mbps: Option<i64>,
}

/// Radio attributes for wireless-capable devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioInterface {
    pub wlan_standard: Option<String>,
    pub frequency_g_hz: Option<f64>,
    pub channel_width_m_hz: Option<i64>,
    pub channel: Option<i64>,
}

/// Interface sub-objects on the detailed device form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInterfaces {
    #[serde(default)]
    pub ports: Vec<EthernetPort>,
    #[serde(default)]
    pub radios: Vec<RadioInterface>,
}

/// Adopted device details — from `GET /v1/sites/{siteId}/devices/{deviceId}`.
///
/// Extends the overview with firmware, uplink, and per-interface attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetailsResponse {
    pub id: String,
    pub name: String,
    pub model: String,
    pub state: DeviceState,
    pub mac_address: String,
    pub ip_address: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub firmware_version: Option<String>,
    pub uplink: Option<DeviceUplink>,
    #[serde(default)]
    pub interfaces: DeviceInterfaces,
}

/// Uplink throughput counters in the latest statistics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkStatistics {
    pub tx_rate_bps: Option<i64>,
    pub rx_rate_bps: Option<i64>,
}

/// Latest statistics — from `GET /v1/sites/{siteId}/devices/{deviceId}/statistics/latest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatisticsResponse {
    pub uptime_sec: Option<i64>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub next_heartbeat_at: Option<DateTime<Utc>>,
    pub load_average_1_min: Option<f64>,
    pub load_average_5_min: Option<f64>,
    pub load_average_15_min: Option<f64>,
    pub cpu_utilization_pct: Option<f64>,
    pub memory_utilization_pct: Option<f64>,
    pub uplink: Option<UplinkStatistics>,
}

// ── Clients ──────────────────────────────────────────────────────────

/// How a network client is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    Wired,
    Wireless,
    #[serde(other)]
    Unknown,
}

/// Network client overview — from `GET /v1/sites/{siteId}/clients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    /// Weak reference to the device this client connects through.
    pub uplink_device_id: Option<String>,
}

// ── Device Actions ───────────────────────────────────────────────────

/// Action to execute on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceAction {
    Restart,
}

impl DeviceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restart => "RESTART",
        }
    }
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device action request body. Write-only, used once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceActionRequest {
    pub action: DeviceAction,
}

/// Acknowledgement for an accepted device action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceActionResponse {
    /// `"OK"` when the controller accepted the action.
    pub status: String,
}

// ── Application Info ─────────────────────────────────────────────────

/// Application info — from `GET /v1/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfoResponse {
    pub application_version: String,
}

// ── Error body ───────────────────────────────────────────────────────

/// Error body shape returned by the API on non-2xx responses.
///
/// Every field is optional here: real deployments sit behind proxies that
/// occasionally serve partial bodies, and the normalizer falls back to the
/// observed status line for anything missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub status_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub request_path: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}
