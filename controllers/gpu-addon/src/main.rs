//! GPU Add-on Controller
//!
//! Converges the dependents of a `GPUAddon`:
//! - NGC pull secret from the add-on parameters
//! - GPU operator ClusterPolicy and its DCGM metrics ConfigMap
//! - NVIDIA network operator subscription
//! - NicClusterPolicy and MacvlanNetwork when RDMA is configured
//!
//! and tears them down again when the add-on is deleted.

mod backoff;
mod condition;
mod config;
mod controller;
mod error;
mod lifecycle;
mod metrics;
mod orchestrator;
mod owner;
mod phase;
mod reconciler;
mod server;
mod status;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::AddonConfig;
use crate::controller::Controller;
use crate::error::ControllerError;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    let provider_installed = rustls::crypto::ring::default_provider().install_default().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "gpu_addon_controller=info".into()),
        )
        .init();

    if !provider_installed {
        debug!("rustls crypto provider was already installed");
    }

    info!("Starting GPU add-on controller");

    let config = Arc::new(AddonConfig::from_env()?);
    info!("Configuration:");
    info!("  Addon namespace: {}", config.addon_namespace);
    info!("  Watch namespace: {}", config.watch_namespace);
    info!("  ClusterPolicy: {}", config.cluster_policy_name);
    info!("  Network operator channel: {}", config.network_operator_channel);
    info!("  Metrics port: {}", config.metrics_port);

    metrics::register_metrics()
        .map_err(|e| ControllerError::InvalidConfig(format!("failed to register metrics: {e}")))?;

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
