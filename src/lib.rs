//! minikube-dev library crate
//!
//! Orchestration glue for local minikube Kubernetes development
//! environments: binary installation, image pre-pull with registry
//! fallback, and cluster lifecycle with bounded retries.

pub mod commands;
pub mod config;
pub mod minikube;
pub mod utils;
