//! Dependent-resource reconcilers.
//!
//! One reconciler per managed kind, all behind the same contract:
//! - `ngc_secret`: NGC registry pull secret built from the add-on parameters
//! - `cluster_policy`: GPU operator ClusterPolicy and its DCGM metrics ConfigMap
//! - `network_operator`: network operator Subscription and resources Namespace
//! - `nic_cluster_policy`: NicClusterPolicy (RDMA only)
//! - `macvlan_network`: MacvlanNetwork (RDMA only)

pub mod cluster_policy;
pub mod macvlan_network;
pub mod network_operator;
pub mod ngc_secret;
#[cfg(test)]
mod ngc_secret_test;
pub mod nic_cluster_policy;

use crate::condition::{self, reasons};
use crate::error::ControllerError;
use cluster_client::{ClusterClient, DeleteOutcome, ObjectKey, OperationResult, Target, apply};
use crds::{Condition, GPUAddon};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

pub use cluster_policy::ClusterPolicyReconciler;
pub use macvlan_network::MacvlanNetworkReconciler;
pub use network_operator::NetworkOperatorReconciler;
pub use ngc_secret::NgcSecretReconciler;
pub use nic_cluster_policy::NicClusterPolicyReconciler;

/// A failed step: the conditions it produced plus the error that stops the pass
#[derive(Debug)]
pub struct StepFailure {
    pub conditions: Vec<Condition>,
    pub error: ControllerError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

pub type StepResult = Result<Vec<Condition>, StepFailure>;

/// Contract every dependent-resource reconciler satisfies.
#[async_trait::async_trait]
pub trait ResourceReconciler: Send + Sync {
    /// Step name used in logs
    fn step(&self) -> &'static str;

    /// Converge the dependent object(s) toward the state `addon` asks for.
    ///
    /// Informational skips come back as `Ok` with a True condition; any
    /// fetch/apply failure comes back as `StepFailure`.
    async fn reconcile(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> StepResult;

    /// Remove every object this reconciler is responsible for.
    ///
    /// Absent objects are not an error; `AlreadyAbsent` means nothing was left.
    async fn delete(&self, client: &dyn ClusterClient) -> Result<DeleteOutcome, ControllerError>;
}

/// Failure condition for `condition_type`; invalid input overrides `reason`.
pub(crate) fn step_failure(condition_type: &str, reason: &str, error: ControllerError) -> StepFailure {
    let reason = match error {
        ControllerError::InvalidInput(_) => reasons::INVALID_INPUT,
        _ => reason,
    };
    StepFailure {
        conditions: vec![condition::failed(condition_type, reason, &error)],
        error,
    }
}

/// Fetch a dependent object; any error other than not-found fails the step.
pub(crate) async fn fetch<K>(
    client: &dyn ClusterClient,
    key: &ObjectKey,
    condition_type: &str,
) -> Result<Option<K>, StepFailure>
where
    K: DeserializeOwned,
{
    apply::get::<K>(client, key)
        .await
        .map_err(|e| step_failure(condition_type, reasons::FETCH_FAILED, e.into()))
}

/// Create-or-patch a dependent object; mutation and apply errors fail the step.
pub(crate) async fn upsert<K, F>(
    client: &dyn ClusterClient,
    key: &ObjectKey,
    target: Target<K>,
    condition_type: &str,
    mutate: F,
) -> Result<OperationResult, StepFailure>
where
    K: Serialize,
    F: FnOnce(&mut K) -> Result<(), ControllerError>,
{
    apply::create_or_patch(client, key, target, mutate)
        .await
        .map_err(|e| step_failure(condition_type, reasons::CREATE_OR_PATCH_FAILED, e))
}

/// Idempotent delete, errors wrapped with the object's kind and name.
pub(crate) async fn delete_object(client: &dyn ClusterClient, key: &ObjectKey) -> Result<DeleteOutcome, ControllerError> {
    apply::delete(client, key)
        .await
        .map_err(|source| ControllerError::DeleteFailed {
            kind: key.resource.kind.clone(),
            name: key.name.clone(),
            source,
        })
}

/// `Deleted` if any of the outcomes removed something
pub(crate) fn combine(outcomes: &[DeleteOutcome]) -> DeleteOutcome {
    if outcomes.contains(&DeleteOutcome::Deleted) {
        DeleteOutcome::Deleted
    } else {
        DeleteOutcome::AlreadyAbsent
    }
}
