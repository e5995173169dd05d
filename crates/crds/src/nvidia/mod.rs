//! NVIDIA GPU operator resources

pub mod cluster_policy;

pub use cluster_policy::*;
