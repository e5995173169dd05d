//! GPUAddon status updates.

use crate::condition::merge_conditions;
use crate::error::ControllerError;
use cluster_client::{ClusterClient, ObjectKey};
use crds::{Condition, GPUAddon, GPUAddonPhase, GPUAddonStatus};
use kube::ResourceExt;
use serde_json::json;
use tracing::debug;

/// Status after folding a pass's conditions into the stored ones
pub fn next_status(addon: &GPUAddon, pass: Vec<Condition>, phase: GPUAddonPhase) -> GPUAddonStatus {
    let generation = addon.metadata.generation;
    let mut status = addon.status.clone().unwrap_or_default();

    merge_conditions(
        &mut status.conditions,
        pass.into_iter()
            .map(|c| c.with_observed_generation(generation))
            .collect(),
    );
    status.phase = phase;
    status.observed_generation = generation;
    status
}

/// Patch the status subresource; skipped when nothing changed.
///
/// Returns whether a write was sent.
pub async fn write_status(
    client: &dyn ClusterClient,
    addon: &GPUAddon,
    status: &GPUAddonStatus,
) -> Result<bool, ControllerError> {
    if addon.status.as_ref() == Some(status) {
        debug!(addon = %addon.name_any(), phase = %status.phase, "Status unchanged, skipping update");
        return Ok(false);
    }

    client
        .patch_status(&ObjectKey::for_object(addon), json!({ "status": status }))
        .await?;
    debug!(addon = %addon.name_any(), phase = %status.phase, "Status updated");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{self, reasons};
    use crate::test_utils::{TEST_NAMESPACE, test_addon};
    use cluster_client::MockClusterClient;
    use crds::ConditionStatus;

    #[test]
    fn test_next_status_merges_by_type() {
        let mut addon = test_addon("gpu-addon", TEST_NAMESPACE, None);
        addon.status = Some(GPUAddonStatus {
            phase: GPUAddonPhase::Failed,
            conditions: vec![
                condition::failed("ClusterPolicyDeployed", reasons::FETCH_FAILED, &"timeout"),
                condition::success("NGCSecretDeployed", "ok"),
            ],
            observed_generation: Some(1),
        });
        addon.metadata.generation = Some(2);

        let status = next_status(
            &addon,
            vec![condition::success("ClusterPolicyDeployed", "ClusterPolicy deployed successfully")],
            GPUAddonPhase::Ready,
        );

        assert_eq!(status.phase, GPUAddonPhase::Ready);
        assert_eq!(status.observed_generation, Some(2));
        assert_eq!(status.conditions.len(), 2);
        let policy = condition::find(&status.conditions, "ClusterPolicyDeployed").unwrap();
        assert_eq!(policy.status, ConditionStatus::True);
        assert_eq!(policy.observed_generation, Some(2));
    }

    #[tokio::test]
    async fn test_write_status_skips_unchanged() {
        let client = MockClusterClient::new();
        let mut addon = test_addon("gpu-addon", TEST_NAMESPACE, None);
        client.insert(&addon);

        let status = next_status(&addon, vec![condition::success("A", "ok")], GPUAddonPhase::Installing);
        assert!(write_status(&client, &addon, &status).await.unwrap());

        let stored: GPUAddon = client.typed(&ObjectKey::for_object(&addon)).unwrap();
        assert_eq!(stored.status.as_ref(), Some(&status));

        addon.status = Some(status.clone());
        let again = next_status(&addon, vec![condition::success("A", "ok")], GPUAddonPhase::Installing);
        assert!(!write_status(&client, &addon, &again).await.unwrap());
        assert_eq!(client.status_write_count(), 1);
    }
}
