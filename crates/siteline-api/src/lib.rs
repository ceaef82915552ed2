// siteline-api: Async Rust client for the Siteline Network Management API

pub mod client;
pub mod error;
pub mod paginate;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::{ClientConfig, SitelineClient};
pub use error::{ApiError, ApiErrorKind, Error};
pub use retry::RetryPolicy;
pub use transport::{TlsMode, Transport, TransportConfig};
