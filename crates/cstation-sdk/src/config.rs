//! Client configuration.

use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings used to build the default HTTP executor.
///
/// Defaults mirror a conventional long-lived client: 30s connect timeout and
/// TCP keepalive, idle connections kept for 90s, at most 10 idle connections
/// per host, and no overall request timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Scheme and host of the NAS, e.g. `https://nas.local:8443`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
    pub tcp_keepalive: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    /// Accept self-signed certificates. NAS appliances ship with one.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: None,
            tcp_keepalive: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            accept_invalid_certs: false,
            user_agent: concat!("cstation-sdk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// - `CSTATION_URL`: base URL (required)
    /// - `CSTATION_CONNECT_TIMEOUT_SECS`: connect timeout (default: 30)
    /// - `CSTATION_TIMEOUT_SECS`: overall request timeout (default: none)
    /// - `CSTATION_ACCEPT_INVALID_CERTS`: `1`, `true` or `yes` (default: false)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("CSTATION_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SdkError::Config("CSTATION_URL is not set".to_string()))?;

        let mut config = Self::new(base_url);

        if let Some(secs) = lookup("CSTATION_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_secs("CSTATION_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("CSTATION_TIMEOUT_SECS") {
            config.request_timeout = Some(parse_secs("CSTATION_TIMEOUT_SECS", &secs)?);
        }
        config.accept_invalid_certs = lookup("CSTATION_ACCEPT_INVALID_CERTS")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(config)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the HTTP executor. It keeps a cookie store, which is where the
    /// login session lives.
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(self.connect_timeout)
            .tcp_keepalive(self.tcp_keepalive)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .user_agent(self.user_agent.clone());

        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| SdkError::Config(format!("failed to build HTTP client: {e}")))
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| SdkError::Config(format!("invalid {key}: {e}")))
}
