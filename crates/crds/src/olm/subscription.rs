//! Subscription
//!
//! Asks OLM to install and keep an operator package up to date from a catalog.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "Subscription",
    plural = "subscriptions",
    namespaced,
    status = "SubscriptionStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    /// CatalogSource name
    #[serde(default, rename = "source")]
    pub catalog_source: String,

    /// Namespace of the CatalogSource
    #[serde(default, rename = "sourceNamespace")]
    pub catalog_source_namespace: String,

    /// Package name
    #[serde(default, rename = "name")]
    pub package: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, rename = "startingCSV", skip_serializing_if = "Option::is_none")]
    pub starting_csv: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_plan_approval: Option<Approval>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum Approval {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct SubscriptionStatus {
    /// CSV the subscription is currently tracking
    #[serde(default, rename = "currentCSV", skip_serializing_if = "Option::is_none")]
    pub current_csv: Option<String>,

    /// CSV that has been installed
    #[serde(default, rename = "installedCSV", skip_serializing_if = "Option::is_none")]
    pub installed_csv: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_wire_names() {
        let spec = SubscriptionSpec {
            catalog_source: "certified-operators".to_string(),
            catalog_source_namespace: "openshift-marketplace".to_string(),
            package: "nvidia-network-operator".to_string(),
            channel: Some("v1.1.0".to_string()),
            starting_csv: None,
            install_plan_approval: Some(Approval::Automatic),
        };
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(value["source"], "certified-operators");
        assert_eq!(value["sourceNamespace"], "openshift-marketplace");
        assert_eq!(value["name"], "nvidia-network-operator");
        assert_eq!(value["installPlanApproval"], "Automatic");
        assert!(value.get("startingCSV").is_none());

        let status: SubscriptionStatus =
            serde_json::from_str(r#"{"installedCSV":"nvidia-network-operator.v1.1.0"}"#).unwrap();
        assert_eq!(
            status.installed_csv.as_deref(),
            Some("nvidia-network-operator.v1.1.0")
        );
    }
}
