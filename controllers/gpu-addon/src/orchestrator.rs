//! Reconcile pass orchestration.
//!
//! Runs the dependent-resource reconcilers over one static list: forward to
//! converge the add-on, reversed to tear it down.

use crate::config::AddonConfig;
use crate::error::ControllerError;
use crate::reconciler::{
    ClusterPolicyReconciler, MacvlanNetworkReconciler, NetworkOperatorReconciler, NgcSecretReconciler,
    NicClusterPolicyReconciler, ResourceReconciler,
};
use cluster_client::{ClusterClient, DeleteOutcome};
use crds::{Condition, GPUAddon};
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of one converge pass
#[derive(Debug, Default)]
pub struct ConvergeReport {
    /// Conditions of every step that ran, in step order
    pub conditions: Vec<Condition>,
    /// Error of the step that stopped the pass
    pub error: Option<ControllerError>,
}

impl ConvergeReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Orchestrator {
    steps: Vec<Box<dyn ResourceReconciler>>,
}

impl Orchestrator {
    /// Dependency order: NGC secret, ClusterPolicy, network operator, NicClusterPolicy, MacvlanNetwork
    pub fn new(config: Arc<AddonConfig>) -> Self {
        Self::with_steps(vec![
            Box::new(NgcSecretReconciler::new(config.clone())),
            Box::new(ClusterPolicyReconciler::new(config.clone())),
            Box::new(NetworkOperatorReconciler::new(config)),
            Box::new(NicClusterPolicyReconciler::new()),
            Box::new(MacvlanNetworkReconciler::new()),
        ])
    }

    pub fn with_steps(steps: Vec<Box<dyn ResourceReconciler>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.step()).collect()
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// The failing step's conditions are kept alongside those of the steps
    /// before it; later steps do not run.
    pub async fn converge(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> ConvergeReport {
        let mut report = ConvergeReport::default();

        for step in &self.steps {
            match step.reconcile(client, addon).await {
                Ok(conditions) => report.conditions.extend(conditions),
                Err(failure) => {
                    error!(
                        step = step.step(),
                        addon = %addon.name_any(),
                        error = %failure,
                        "Reconcile step failed, skipping remaining steps"
                    );
                    report.conditions.extend(failure.conditions);
                    report.error = Some(failure.error);
                    return report;
                }
            }
        }

        report
    }

    /// Delete everything the steps manage, last step first.
    pub async fn teardown(&self, client: &dyn ClusterClient) -> Result<(), ControllerError> {
        for step in self.steps.iter().rev() {
            let outcome = step.delete(client).await?;
            if outcome == DeleteOutcome::Deleted {
                info!(step = step.step(), "Dependent resources deleted");
            }
        }
        Ok(())
    }
}
