//! # Container Station Rust SDK
//!
//! Async client for the Container Station v1 REST API served by QNAP NAS
//! appliances: sessions, system and resource telemetry, Docker and LXC
//! container lifecycle, and export of the registry TLS certificate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cstation_sdk::{ClientConfig, ContainerStationClient, ContainerType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://nas.local:8443").with_accept_invalid_certs(true);
//!     let client = ContainerStationClient::from_config(config)?;
//!
//!     client.login("admin", "secret").await?;
//!
//!     for container in client.list_containers().await? {
//!         println!("{} ({}) is {}", container.name, container.kind, container.state);
//!     }
//!
//!     client.restart_container(ContainerType::Docker, "4f2a9c").await?;
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! The appliance answers HTTP 200 for every outcome and reports failures as
//! an `{"error": {"code": .., "message": ..}}` body in place of the expected
//! payload. Every operation returns exactly one of a decoded value or an
//! [`SdkError`]:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`SdkError::Validation`] | bad parameter, nothing was sent |
//! | [`SdkError::Transport`] | connection, TLS, timeout, cancellation, or a status other than 200 |
//! | [`SdkError::Decode`] | the body matched neither the payload nor the error shape |
//! | [`SdkError::Api`] | the appliance reported a failure |
//!
//! Nothing is retried.
//!
//! ## Cancellation
//!
//! ```rust,no_run
//! use cstation_sdk::ContainerStationClient;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(client: ContainerStationClient) {
//! let token = CancellationToken::new();
//! let scoped = client.with_cancellation(token.clone());
//!
//! let task = tokio::spawn(async move { scoped.list_containers().await });
//! token.cancel();
//!
//! if let Err(err) = task.await.unwrap() {
//!     assert!(err.is_cancelled());
//! }
//! # }
//! ```

mod certificate;
mod client;
mod config;
mod dispatch;
mod error;
mod types;

pub use certificate::CERTIFICATE_EXPORT_LIMIT;
pub use client::{ContainerStationClient, API_PREFIX};
pub use config::ClientConfig;
pub use dispatch::{decode_body, has_error_marker, Decoded};
pub use error::{ApiError, Result, SdkError, TransportError};
pub use types::{
    Container, ContainerAction, ContainerType, GpuInformation, LoginResponse, LogoutResponse,
    MemoryUsage, PortUsage, Protocol, ResourceUsage, SystemInformation, VersionInformation,
};
