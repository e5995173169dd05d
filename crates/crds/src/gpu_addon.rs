//! GPUAddon CRD
//!
//! The parent resource: user intent for the GPU add-on (console plugin,
//! optional GPUDirect RDMA, optional NVAIE pull secret) and the aggregated
//! reconciliation status.

use crate::condition::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "nvidia.addons.rh-ecosystem-edge.io",
    version = "v1alpha1",
    kind = "GPUAddon",
    plural = "gpuaddons",
    namespaced,
    status = "GPUAddonStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Console Plugin","type":"boolean","jsonPath":".spec.console_plugin_enabled"}"#
)]
pub struct GPUAddonSpec {
    /// Deploy the GPU console plugin
    #[serde(default = "default_console_plugin_enabled")]
    pub console_plugin_enabled: bool,

    /// Optional RDMA configuration. When set, the NVIDIA Network Operator and
    /// the GPU operator are configured for GPUDirect RDMA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdma: Option<RDMASpec>,

    /// Optional NVAIE pull secret name
    #[serde(
        default,
        rename = "nvaie_pullsecret",
        skip_serializing_if = "Option::is_none"
    )]
    pub nvaie_pull_secret: Option<String>,
}

fn default_console_plugin_enabled() -> bool {
    true
}

impl Default for GPUAddonSpec {
    fn default() -> Self {
        Self {
            console_plugin_enabled: default_console_plugin_enabled(),
            rdma: None,
            nvaie_pull_secret: None,
        }
    }
}

/// GPUDirect RDMA configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RDMASpec {
    /// RDMA shared devices to expose
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,

    /// Secondary network used by RDMA workloads
    #[serde(default)]
    pub macvlan_network: MacvlanNetworkConfig,
}

/// A device exposed by the RDMA shared device plugin
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSpec {
    /// User selected resource name
    pub resource_name: String,

    /// Device selectors
    #[serde(default)]
    pub selectors: Selectors,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Selectors {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MacvlanNetworkConfig {
    /// Host interface backing the macvlan network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,

    /// IPAM configuration for the network
    #[serde(default)]
    pub ipam: IPAMConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IPAMConfig {
    /// CIDR handed to whereabouts
    #[serde(default)]
    pub range: String,

    /// CIDRs excluded from the range
    #[serde(default, rename = "exclude", skip_serializing_if = "Vec::is_empty")]
    pub omit_ranges: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GPUAddonStatus {
    /// Lifecycle phase of the add-on
    #[serde(default)]
    pub phase: GPUAddonPhase,

    /// Latest observations, one per condition type
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation the status was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum GPUAddonPhase {
    Failed,
    #[default]
    Idle,
    Installing,
    Ready,
    Updating,
    Uninstalling,
}

impl fmt::Display for GPUAddonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GPUAddonPhase::Failed => "Failed",
            GPUAddonPhase::Idle => "Idle",
            GPUAddonPhase::Installing => "Installing",
            GPUAddonPhase::Ready => "Ready",
            GPUAddonPhase::Updating => "Updating",
            GPUAddonPhase::Uninstalling => "Uninstalling",
        };
        f.write_str(s)
    }
}
