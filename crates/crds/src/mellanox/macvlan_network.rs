//! MacvlanNetwork
//!
//! Secondary macvlan network rendered by the network operator into a
//! NetworkAttachmentDefinition.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "mellanox.com",
    version = "v1alpha1",
    kind = "MacvlanNetwork",
    plural = "macvlannetworks"
)]
#[serde(rename_all = "camelCase")]
pub struct MacvlanNetworkSpec {
    /// Namespace the NetworkAttachmentDefinition is created in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_namespace: Option<String>,

    /// Host interface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,

    /// "private", "vepa", "bridge" or "passthru"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<i32>,

    /// IPAM plugin configuration as a JSON document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipam: Option<String>,
}
