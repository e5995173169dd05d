//! Main controller implementation.
//!
//! Builds the shared reconcile context, then runs the GPUAddon watcher and the
//! probes/metrics server side by side. Either one exiting stops the process.

use crate::backoff::BackoffTracker;
use crate::config::AddonConfig;
use crate::error::ControllerError;
use crate::orchestrator::Orchestrator;
use crate::server::{ServerState, start_server};
use crate::watcher::Watcher;
use cluster_client::{ClusterClient, KubeClusterClient};
use kube::Client;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::task::JoinHandle;
use tracing::info;

/// State shared by every reconcile pass
pub struct Context {
    pub client: Client,
    pub cluster: Arc<dyn ClusterClient>,
    pub orchestrator: Orchestrator,
    pub config: Arc<AddonConfig>,
    pub backoff: BackoffTracker,
}

pub struct Controller {
    gpu_addon_watcher: JoinHandle<Result<(), ControllerError>>,
    server: JoinHandle<Result<(), anyhow::Error>>,
}

impl Controller {
    pub async fn new(config: Arc<AddonConfig>) -> Result<Self, ControllerError> {
        info!("Initializing GPU add-on controller");

        let client = Client::try_default().await?;
        let context = Arc::new(Context {
            cluster: Arc::new(KubeClusterClient::new(client.clone())),
            client,
            orchestrator: Orchestrator::new(config.clone()),
            config: config.clone(),
            backoff: BackoffTracker::new(),
        });
        info!(steps = ?context.orchestrator.step_names(), "Reconcile steps");

        let ready = Arc::new(AtomicBool::new(false));
        let server = {
            let state = Arc::new(ServerState {
                is_ready: ready.clone(),
            });
            let port = config.metrics_port;
            tokio::spawn(async move { start_server(port, state).await })
        };

        let gpu_addon_watcher = {
            let watcher = Watcher::new(context, ready);
            tokio::spawn(async move { watcher.watch_gpu_addons().await })
        };

        Ok(Self {
            gpu_addon_watcher,
            server,
        })
    }

    /// Runs until the watcher or the server exits
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("GPU add-on controller running");

        tokio::select! {
            result = &mut self.gpu_addon_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("GPUAddon watcher panicked: {}", e)))??;
            }
            result = &mut self.server => {
                result.map_err(|e| ControllerError::Watch(format!("HTTP server panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("HTTP server error: {}", e)))?;
            }
        }

        Ok(())
    }
}
