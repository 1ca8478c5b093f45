//! Command implementations for minikube-dev

pub mod cluster;
pub mod configure;
pub mod images;
pub mod install;
pub mod troubleshoot;
