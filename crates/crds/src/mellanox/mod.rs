//! NVIDIA Network Operator resources (mellanox.com/v1alpha1)
//!
//! Both kinds are cluster-scoped.

pub mod macvlan_network;
pub mod nic_cluster_policy;

pub use macvlan_network::*;
pub use nic_cluster_policy::*;
