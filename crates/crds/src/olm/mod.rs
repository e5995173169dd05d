//! Operator Lifecycle Manager resources (operators.coreos.com/v1alpha1)

pub mod cluster_service_version;
pub mod subscription;

pub use cluster_service_version::*;
pub use subscription::*;
