//! Controller owner references.
//!
//! A namespace-scoped GPUAddon can only own objects in its own namespace.
//! Anything else (cluster-scoped kinds, or the addon namespace when the parent
//! lives elsewhere) is removed explicitly on teardown instead.

use crate::error::ControllerError;
use crds::GPUAddon;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};
use tracing::debug;

/// Make `addon` the controlling owner of `child` when scopes allow it.
///
/// Returns whether the reference was set. Fails if another controller already
/// owns the object.
pub fn set_controller_reference(addon: &GPUAddon, child: &mut ObjectMeta) -> Result<bool, ControllerError> {
    let same_namespace = child.namespace.is_some() && child.namespace == addon.metadata.namespace;
    if !same_namespace {
        debug!(
            parent = %addon.name_any(),
            child = child.name.as_deref().unwrap_or_default(),
            "Owner reference skipped, child is outside the parent namespace"
        );
        return Ok(false);
    }

    let owner_ref = addon.controller_owner_ref(&()).ok_or_else(|| {
        ControllerError::InvalidInput(format!("GPUAddon {} has no uid", addon.name_any()))
    })?;

    let refs = child.owner_references.get_or_insert_with(Vec::new);
    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner_ref.uid)
    {
        return Err(ControllerError::InvalidInput(format!(
            "{} is already controlled by {} {}",
            child.name.as_deref().unwrap_or_default(),
            other.kind,
            other.name
        )));
    }

    match refs.iter_mut().find(|r| r.uid == owner_ref.uid) {
        Some(existing) => *existing = owner_ref,
        None => refs.push(owner_ref),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_addon;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    fn child(namespace: Option<&str>) -> ObjectMeta {
        ObjectMeta {
            name: Some("child".to_string()),
            namespace: namespace.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_sets_reference_in_same_namespace() {
        let addon = test_addon("gpu-addon", "addon-ns", None);
        let mut meta = child(Some("addon-ns"));

        assert!(set_controller_reference(&addon, &mut meta).unwrap());
        let refs = meta.owner_references.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, "GPUAddon");
        assert_eq!(refs[0].name, "gpu-addon");
        assert_eq!(refs[0].controller, Some(true));
    }

    #[test]
    fn test_idempotent() {
        let addon = test_addon("gpu-addon", "addon-ns", None);
        let mut meta = child(Some("addon-ns"));
        set_controller_reference(&addon, &mut meta).unwrap();
        let once = meta.clone();
        set_controller_reference(&addon, &mut meta).unwrap();
        assert_eq!(meta, once);
    }

    #[test]
    fn test_skips_cluster_scoped_and_foreign_namespace() {
        let addon = test_addon("gpu-addon", "addon-ns", None);

        let mut cluster_scoped = child(None);
        assert!(!set_controller_reference(&addon, &mut cluster_scoped).unwrap());
        assert!(cluster_scoped.owner_references.is_none());

        let mut elsewhere = child(Some("other-ns"));
        assert!(!set_controller_reference(&addon, &mut elsewhere).unwrap());
        assert!(elsewhere.owner_references.is_none());
    }

    #[test]
    fn test_rejects_other_controller() {
        let addon = test_addon("gpu-addon", "addon-ns", None);
        let mut meta = child(Some("addon-ns"));
        meta.owner_references = Some(vec![OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: "someone-else".to_string(),
            uid: "another-uid".to_string(),
            controller: Some(true),
            block_owner_deletion: None,
        }]);

        let err = set_controller_reference(&addon, &mut meta).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidInput(_)));
    }
}
