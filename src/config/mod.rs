//! Configuration modules for minikube-dev

pub mod images;
pub mod settings;
