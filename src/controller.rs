use std::time::Duration;

use anyhow::Context;
use kube::{Client, Config};
use tracing::info;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds a client from the in-cluster service account, falling back to the
/// local kubeconfig.
///
/// The read timeout follows the per-kind timeout so a stalled response can't
/// outlive the aggregator's own deadline.
pub async fn connect(kind_timeout: Duration) -> anyhow::Result<Client> {
    let mut config = Config::infer()
        .await
        .context("Can't load Kubernetes client configuration")?;
    config.connect_timeout = Some(CONNECT_TIMEOUT);
    config.read_timeout = Some(kind_timeout);

    info!("Connecting to Kubernetes API at {}", config.cluster_url);
    let client = Client::try_from(config).context("Can't connect to Kubernetes API")?;
    Ok(client)
}
