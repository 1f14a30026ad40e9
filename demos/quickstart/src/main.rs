//! Walk through the Container Station API against a real NAS.
//!
//! Reads `CSTATION_URL`, `CSTATION_USERNAME` and `CSTATION_PASSWORD` (and the
//! optional settings documented on `ClientConfig::from_env`) from the
//! environment or a `.env` file. Set `CSTATION_CERT_PATH` to also download
//! the registry certificate. Ctrl-C abandons whatever request is in flight.

use color_eyre::eyre::{self, WrapErr};
use cstation_sdk::{ClientConfig, ContainerStationClient, Protocol};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    let username = std::env::var("CSTATION_USERNAME").wrap_err("CSTATION_USERNAME is not set")?;
    let password = std::env::var("CSTATION_PASSWORD").wrap_err("CSTATION_PASSWORD is not set")?;

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                token.cancel();
            }
        });
    }

    let client = ContainerStationClient::from_config(config)?.with_cancellation(token);

    info!(base_url = client.base_url(), "Logging in");
    let login = client.login(&username, &password).await?;
    info!(user = %login.username, admin = login.is_admin, "Logged in");

    let result = tour(&client).await;

    info!("Logging out");
    client.logout().await?;

    result
}

async fn tour(client: &ContainerStationClient) -> eyre::Result<()> {
    let system = client.system_information().await?;
    info!(
        hostname = %system.hostname,
        cores = system.cpu_core,
        threads = system.cpu_thread,
        docker = %system.version.docker_version,
        lxc = %system.version.lxc_version,
        "System information"
    );
    if system.need_restart {
        warn!("NAS reports that Container Station needs a restart");
    }

    let usage = client.resource_usage().await?;
    info!(
        cpu_percent = usage.cpu,
        memory_percent = usage.memory.percent,
        "Resource usage"
    );

    let used = client.is_port_in_use(Protocol::Tcp, 443).await?;
    info!(used, "Port tcp/443");

    for container in client.list_containers().await? {
        info!(
            id = %container.id,
            name = %container.name,
            kind = %container.kind,
            state = %container.state,
            "Container"
        );
    }

    if let Ok(path) = std::env::var("CSTATION_CERT_PATH") {
        let bytes = client.download_tls_certificate(&path, 0o644).await?;
        info!(%path, bytes, "Registry certificate saved");
    }

    Ok(())
}
