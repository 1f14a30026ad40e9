//! The Container Station client handle and its endpoint operations.

use crate::config::ClientConfig;
use crate::error::{Result, SdkError};
use crate::types::{
    Container, ContainerAction, ContainerType, LoginResponse, LogoutResponse, PortUsage, Protocol,
    ResourceUsage, SystemInformation,
};
use reqwest::{Method, RequestBuilder};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Path prefix of every Container Station v1 endpoint.
pub const API_PREFIX: &str = "/containerstation/api/v1";

/// Client for the Container Station v1 API.
///
/// The handle holds the NAS base URL, the HTTP executor and a cancellation
/// token. Cloning is cheap and every clone shares the executor's connection
/// pool and cookie store, so a session opened with [`login`](Self::login)
/// covers all clones. The client adds no locking of its own.
///
/// The API answers HTTP 200 whatever happens and signals failure with an
/// `{"error": {...}}` body; those surface as [`SdkError::Api`].
///
/// ```rust,no_run
/// use cstation_sdk::{ContainerStationClient, Protocol};
///
/// # async fn example() -> cstation_sdk::Result<()> {
/// let client = ContainerStationClient::new("https://nas.local:8443")?;
/// client.login("admin", "secret").await?;
///
/// let info = client.system_information().await?;
/// println!("{} runs Docker {}", info.hostname, info.version.docker_version);
///
/// let used = client.is_port_in_use(Protocol::Tcp, 443).await?;
/// println!("443 in use: {used}");
///
/// client.logout().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ContainerStationClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    cancel: CancellationToken,
}

impl ContainerStationClient {
    /// Create a client with the default configuration.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(base_url))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let http = config.build_http_client()?;
        Ok(Self::with_http_client(config.base_url, http))
    }

    /// Use a caller-built executor. It must have a cookie store enabled or
    /// the session from [`login`](Self::login) will not be kept.
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            cancel: CancellationToken::new(),
        }
    }

    /// A handle whose operations are abandoned when `token` is cancelled.
    ///
    /// An abandoned operation returns a cancelled transport error and no
    /// partial result.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            http: self.http.clone(),
            base_url: Arc::clone(&self.base_url),
            cancel: token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, endpoint);
        self.http.request(method, url)
    }

    // Session

    /// Authenticate; the session cookie is kept by the executor.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = self
            .request(Method::POST, "/login")
            .form(&[("username", username), ("password", password)]);
        self.dispatch(request).await
    }

    /// Refresh the current session.
    #[instrument(skip(self))]
    pub async fn login_refresh(&self) -> Result<LoginResponse> {
        self.dispatch(self.request(Method::GET, "/login_refresh"))
            .await
    }

    /// End the current session.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<LogoutResponse> {
        self.dispatch(self.request(Method::PUT, "/logout")).await
    }

    // System

    #[instrument(skip(self))]
    pub async fn system_information(&self) -> Result<SystemInformation> {
        self.dispatch(self.request(Method::GET, "/system")).await
    }

    #[instrument(skip(self))]
    pub async fn resource_usage(&self) -> Result<ResourceUsage> {
        self.dispatch(self.request(Method::GET, "/system/resource"))
            .await
    }

    /// Whether `port` is bound on the NAS for `protocol`. Port 0 is rejected
    /// without contacting the NAS.
    #[instrument(skip(self))]
    pub async fn is_port_in_use(&self, protocol: Protocol, port: u16) -> Result<bool> {
        if port == 0 {
            return Err(SdkError::Validation("port must be positive".to_string()));
        }

        let endpoint = format!("/system/port/{protocol}/{port}");
        let usage: PortUsage = self.dispatch(self.request(Method::GET, &endpoint)).await?;
        Ok(usage.used)
    }

    // Containers

    #[instrument(skip(self))]
    pub async fn list_containers(&self) -> Result<Vec<Container>> {
        self.dispatch(self.request(Method::GET, "/container")).await
    }

    #[instrument(skip(self))]
    pub async fn get_container(&self, kind: ContainerType, id: &str) -> Result<Container> {
        let endpoint = container_endpoint(kind, id)?;
        self.dispatch(self.request(Method::GET, &endpoint)).await
    }

    pub async fn start_container(&self, kind: ContainerType, id: &str) -> Result<Container> {
        self.container_action(kind, id, ContainerAction::Start).await
    }

    pub async fn stop_container(&self, kind: ContainerType, id: &str) -> Result<Container> {
        self.container_action(kind, id, ContainerAction::Stop).await
    }

    pub async fn restart_container(&self, kind: ContainerType, id: &str) -> Result<Container> {
        self.container_action(kind, id, ContainerAction::Restart)
            .await
    }

    #[instrument(skip(self))]
    pub async fn container_action(
        &self,
        kind: ContainerType,
        id: &str,
        action: ContainerAction,
    ) -> Result<Container> {
        let endpoint = format!("{}/{action}", container_endpoint(kind, id)?);
        self.dispatch(self.request(Method::PUT, &endpoint)).await
    }

    /// Remove a container. Some firmware answers a successful removal with an
    /// empty body, which is returned as `None`.
    #[instrument(skip(self))]
    pub async fn remove_container(
        &self,
        kind: ContainerType,
        id: &str,
    ) -> Result<Option<Container>> {
        let endpoint = container_endpoint(kind, id)?;
        self.dispatch_optional(self.request(Method::DELETE, &endpoint))
            .await
    }
}

fn container_endpoint(kind: ContainerType, id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(SdkError::Validation("container id is empty".to_string()));
    }
    if id.contains('/') {
        return Err(SdkError::Validation(format!(
            "container id '{id}' contains '/'"
        )));
    }
    Ok(format!("/container/{kind}/{id}"))
}
