//! MacvlanNetwork (RDMA only).
//!
//! A secondary macvlan network on the RDMA interface with whereabouts IPAM,
//! addressed from the range configured on the add-on.

use super::{ResourceReconciler, StepResult, delete_object, fetch, upsert};
use crate::condition::{self, reasons};
use crate::error::ControllerError;
use cluster_client::{ClusterClient, DeleteOutcome, ObjectKey, Target};
use crds::{GPUAddon, MacvlanNetwork, MacvlanNetworkSpec, RDMASpec};
use kube::ResourceExt;
use serde::Serialize;
use tracing::info;

pub const CONDITION_TYPE: &str = "MacvlanNetworkDeployed";
pub const MACVLAN_NETWORK_NAME: &str = "macvlannetwork-gpu-addon";

pub const DEFAULT_MASTER_INTERFACE: &str = "ens2f0np0";
pub const NETWORK_NAMESPACE: &str = "default";
const MODE: &str = "bridge";
const MTU: i32 = 1500;

/// whereabouts IPAM plugin configuration
#[derive(Debug, Serialize)]
struct WhereaboutsIpam<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    range: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude: Option<&'a [String]>,
}

pub fn ipam_config(rdma: &RDMASpec) -> Result<String, ControllerError> {
    let ipam = &rdma.macvlan_network.ipam;
    if ipam.range.trim().is_empty() {
        return Err(ControllerError::InvalidInput(
            "RDMA macvlanNetwork.ipam.range must not be empty".to_string(),
        ));
    }

    Ok(serde_json::to_string(&WhereaboutsIpam {
        type_: "whereabouts",
        range: &ipam.range,
        exclude: (!ipam.omit_ranges.is_empty()).then_some(ipam.omit_ranges.as_slice()),
    })?)
}

pub fn set_desired_macvlan_network(spec: &mut MacvlanNetworkSpec, rdma: &RDMASpec) -> Result<(), ControllerError> {
    let master = rdma
        .macvlan_network
        .master
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MASTER_INTERFACE);

    spec.network_namespace = Some(NETWORK_NAMESPACE.to_string());
    spec.master = Some(master.to_string());
    spec.mode = Some(MODE.to_string());
    spec.mtu = Some(MTU);
    spec.ipam = Some(ipam_config(rdma)?);
    Ok(())
}

#[derive(Debug, Default)]
pub struct MacvlanNetworkReconciler;

impl MacvlanNetworkReconciler {
    pub fn new() -> Self {
        Self
    }

    fn key(&self) -> ObjectKey {
        ObjectKey::cluster::<MacvlanNetwork>(MACVLAN_NETWORK_NAME)
    }
}

#[async_trait::async_trait]
impl ResourceReconciler for MacvlanNetworkReconciler {
    fn step(&self) -> &'static str {
        "MacvlanNetwork CR"
    }

    async fn reconcile(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> StepResult {
        let Some(rdma) = addon.spec.rdma.as_ref() else {
            info!(
                step = self.step(),
                addon = %addon.name_any(),
                "MacvlanNetwork CR will not be reconciled as GPUAddon RDMA is not configured"
            );
            return Ok(vec![condition::skipped(
                CONDITION_TYPE,
                reasons::NOT_CONFIGURED,
                "GPUAddon RDMA is not configured, the MacvlanNetwork CR won't be deployed",
            )]);
        };

        let key = self.key();
        let existing = fetch::<MacvlanNetwork>(client, &key, CONDITION_TYPE).await?;
        let target = Target::resolve(existing, || {
            MacvlanNetwork::new(&key.name, MacvlanNetworkSpec::default())
        });

        let result = upsert(client, &key, target, CONDITION_TYPE, |network: &mut MacvlanNetwork| {
            set_desired_macvlan_network(&mut network.spec, rdma)
        })
        .await?;

        info!(step = self.step(), object = %key, result = %result, "MacvlanNetwork reconciled successfully");
        Ok(vec![condition::success(CONDITION_TYPE, "MacvlanNetwork deployed successfully")])
    }

    async fn delete(&self, client: &dyn ClusterClient) -> Result<DeleteOutcome, ControllerError> {
        delete_object(client, &self.key()).await
    }
}
