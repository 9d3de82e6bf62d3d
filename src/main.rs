use std::sync::Arc;

use cluster_insight::{
    aggregator::Aggregator,
    api::{Capabilities, KubeClusterApi},
    config::Config,
    controller, server,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    debug!("Configuration: {config:?}");

    let client = controller::connect(config.kind_timeout).await?;

    let api = if config.skip_discovery {
        KubeClusterApi::new(client, Capabilities::all())
    } else {
        KubeClusterApi::discover(client).await
    };
    info!("Connected to Kubernetes API...");

    let aggregator = Aggregator::from_config(Arc::new(api), &config);
    server::serve(&config, aggregator).await
}
