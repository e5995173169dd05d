//! Lifecycle phase of the add-on.
//!
//! Computed by the caller from the outcome of a converge pass; the
//! orchestrator itself knows nothing about phases.

use crds::{GPUAddon, GPUAddonPhase};
use std::time::Duration;

/// Requeue while the installation or an update settles
pub const SETTLE_REQUEUE: Duration = Duration::from_secs(10);
/// Periodic resync once the add-on is ready
pub const READY_REQUEUE: Duration = Duration::from_secs(300);

/// Phase after a pass over `addon`.
///
/// - deletion requested -> `Uninstalling`
/// - failed pass -> `Failed`
/// - first success (no phase yet, or `Idle`) -> `Installing`
/// - `Ready` but the spec generation moved on -> `Updating`
/// - otherwise -> `Ready`
pub fn next_phase(addon: &GPUAddon, converge_failed: bool) -> GPUAddonPhase {
    if addon.metadata.deletion_timestamp.is_some() {
        return GPUAddonPhase::Uninstalling;
    }
    if converge_failed {
        return GPUAddonPhase::Failed;
    }

    let status = addon.status.as_ref();
    match status.map(|s| s.phase) {
        None | Some(GPUAddonPhase::Idle) => GPUAddonPhase::Installing,
        Some(GPUAddonPhase::Ready) if addon.metadata.generation != status.and_then(|s| s.observed_generation) => {
            GPUAddonPhase::Updating
        }
        Some(_) => GPUAddonPhase::Ready,
    }
}

/// How long to wait before the next pass in `phase`, `None` to wait for a change
pub fn requeue_after(phase: GPUAddonPhase) -> Option<Duration> {
    match phase {
        GPUAddonPhase::Installing | GPUAddonPhase::Updating => Some(SETTLE_REQUEUE),
        GPUAddonPhase::Ready => Some(READY_REQUEUE),
        GPUAddonPhase::Idle | GPUAddonPhase::Failed | GPUAddonPhase::Uninstalling => None,
    }
}
