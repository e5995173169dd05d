//! GPUAddon watcher.
//!
//! Drives reconciliation with `kube_runtime::Controller`: watches GPUAddon
//! objects in the watch namespace plus the namespaced dependents they own, and
//! routes every pass through the kube finalizer helper so deletion runs the
//! teardown before the object goes away.

use crate::controller::Context;
use crate::error::ControllerError;
use crate::lifecycle;
use crds::{GPUAddon, Subscription};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::finalizer::{Event as FinalizerEvent, finalizer};
use kube_runtime::{Controller, watcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const FINALIZER: &str = "nvidia.addons.rh-ecosystem-edge.io/finalizer";

/// Watches GPUAddon resources and triggers reconciliation.
pub struct Watcher {
    context: Arc<Context>,
    ready: Arc<AtomicBool>,
}

impl Watcher {
    pub fn new(context: Arc<Context>, ready: Arc<AtomicBool>) -> Self {
        Self { context, ready }
    }

    pub async fn watch_gpu_addons(&self) -> Result<(), ControllerError> {
        let client = self.context.client.clone();
        let config = &self.context.config;
        info!(
            watch_namespace = %config.watch_namespace,
            addon_namespace = %config.addon_namespace,
            "Starting GPUAddon watcher"
        );

        let addons: Api<GPUAddon> = Api::namespaced(client.clone(), &config.watch_namespace);
        let secrets: Api<Secret> = Api::namespaced(client.clone(), &config.addon_namespace);
        let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &config.addon_namespace);
        let subscriptions: Api<Subscription> = Api::namespaced(client, &config.addon_namespace);

        // Debounce batches the events our own writes cause
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(5))
            .concurrency(1);

        let controller = Controller::new(addons, watcher::Config::default())
            .owns(secrets, watcher::Config::default())
            .owns(config_maps, watcher::Config::default())
            .owns(subscriptions, watcher::Config::default())
            .with_config(controller_config);

        self.ready.store(true, Ordering::Relaxed);

        controller
            .run(reconcile, error_policy, self.context.clone())
            .for_each(|res| async move {
                match res {
                    Ok((obj, _action)) => debug!(addon = %obj.name, "Reconciled GPUAddon"),
                    Err(e) => {
                        let msg = format!("{e:?}");
                        if msg.contains("ObjectNotFound") {
                            debug!("GPUAddon already deleted");
                        } else {
                            warn!(error = %e, "GPUAddon reconcile failed");
                        }
                    }
                }
            })
            .await;

        self.ready.store(false, Ordering::Relaxed);
        Err(ControllerError::Watch("GPUAddon controller stream ended".to_string()))
    }
}

fn backoff_key(addon: &GPUAddon) -> String {
    format!("{}/{}", addon.namespace().unwrap_or_default(), addon.name_any())
}

async fn reconcile(addon: Arc<GPUAddon>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let key = backoff_key(&addon);
    let namespace = addon.namespace().unwrap_or_default();
    let api: Api<GPUAddon> = Api::namespaced(ctx.client.clone(), &namespace);

    debug!(addon = %key, "Reconciling GPUAddon");

    let action = finalizer(&api, FINALIZER, addon, |event| async {
        match event {
            FinalizerEvent::Apply(addon) => {
                lifecycle::apply(ctx.cluster.as_ref(), &ctx.orchestrator, &addon).await
            }
            FinalizerEvent::Cleanup(addon) => {
                lifecycle::cleanup(ctx.cluster.as_ref(), &ctx.orchestrator, &addon).await
            }
        }
    })
    .await
    .map_err(|e| ControllerError::Finalizer(Box::new(e)))?;

    ctx.backoff.reset(&key);
    Ok(action)
}

fn error_policy(addon: Arc<GPUAddon>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    let key = backoff_key(&addon);

    // The object was deleted between the watch event and the reconcile
    if matches!(error, ControllerError::Finalizer(e) if e.to_string().contains("ObjectNotFound")) {
        debug!(addon = %key, "GPUAddon already deleted, skipping requeue");
        ctx.backoff.reset(&key);
        return Action::await_change();
    }

    let delay = ctx.backoff.next_backoff(&key);
    error!(addon = %key, error = %error, requeue_secs = delay.as_secs(), "Reconciliation error, requeuing");
    Action::requeue(delay)
}
