//! Minikube and kubectl integration

pub mod cluster;
pub mod kubectl;
pub mod launcher;
pub mod prepull;

pub use cluster::{ClusterProfile, MinikubeCluster};
pub use launcher::{LaunchReport, LaunchState, launch_with_retry, poll_readiness};
