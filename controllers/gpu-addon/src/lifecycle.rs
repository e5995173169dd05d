//! Finalizer event handlers.
//!
//! `apply` runs a converge pass and records its outcome on the add-on status;
//! `cleanup` tears the dependents down before the finalizer is released.

use crate::error::ControllerError;
use crate::metrics;
use crate::orchestrator::Orchestrator;
use crate::phase::{next_phase, requeue_after};
use crate::status::{next_status, write_status};
use cluster_client::ClusterClient;
use crds::{GPUAddon, GPUAddonPhase};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::time::Instant;
use tracing::{info, warn};

/// Converge the add-on and publish phase and conditions.
///
/// A failed pass is still written to status before its error is returned, so
/// the partial progress is visible.
pub async fn apply(
    client: &dyn ClusterClient,
    orchestrator: &Orchestrator,
    addon: &GPUAddon,
) -> Result<Action, ControllerError> {
    let start = Instant::now();
    metrics::increment_reconciliations();

    let report = orchestrator.converge(client, addon).await;
    let phase = next_phase(addon, !report.is_success());
    let status = next_status(addon, report.conditions, phase);
    let written = write_status(client, addon, &status).await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    if let Some(error) = report.error {
        metrics::increment_reconciliation_errors();
        if let Err(status_error) = written {
            warn!(addon = %addon.name_any(), error = %status_error, "Failed to record failed pass on status");
        }
        return Err(error);
    }
    written?;

    info!(addon = %addon.name_any(), phase = %phase, "GPUAddon reconciled");
    Ok(requeue_after(phase).map_or_else(Action::await_change, Action::requeue))
}

/// Mark the add-on as uninstalling and delete its dependents.
pub async fn cleanup(
    client: &dyn ClusterClient,
    orchestrator: &Orchestrator,
    addon: &GPUAddon,
) -> Result<Action, ControllerError> {
    info!(addon = %addon.name_any(), "GPUAddon is being deleted, tearing down dependents");

    let status = next_status(addon, Vec::new(), GPUAddonPhase::Uninstalling);
    if let Err(e) = write_status(client, addon, &status).await {
        warn!(addon = %addon.name_any(), error = %e, "Failed to set Uninstalling phase");
    }

    orchestrator.teardown(client).await?;
    metrics::increment_teardowns();

    info!(addon = %addon.name_any(), "GPUAddon dependents deleted");
    Ok(Action::await_change())
}
