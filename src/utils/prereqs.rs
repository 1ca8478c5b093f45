//! Prerequisite checking system for required tools

use anyhow::{Result, anyhow};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrereqError {
    #[error("Tool '{name}' not found")]
    NotFound { name: String, hint: String },

    #[error("Failed to check for tool '{name}': {source}")]
    CheckFailed { name: String, source: anyhow::Error },
}

/// Trait for checking prerequisites
pub trait Prerequisite {
    /// Name of the prerequisite tool
    fn name(&self) -> &str;

    /// Check if the tool is available
    fn check(&self) -> Result<(), PrereqError>;

    /// Installation hint for the user
    fn install_hint(&self) -> &str;
}

/// Basic prerequisite that checks if a command exists
pub struct CommandPrereq {
    pub name: String,
    pub hint: String,
}

impl CommandPrereq {
    pub fn new(name: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: hint.into(),
        }
    }
}

impl Prerequisite for CommandPrereq {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<(), PrereqError> {
        which::which(&self.name).map_err(|_| PrereqError::NotFound {
            name: self.name.clone(),
            hint: self.hint.clone(),
        })?;
        Ok(())
    }

    fn install_hint(&self) -> &str {
        &self.hint
    }
}

/// Common prerequisites for minikube-dev
pub struct CommonPrereqs;

impl CommonPrereqs {
    /// Get docker prerequisite
    pub fn docker() -> CommandPrereq {
        CommandPrereq::new(
            "docker",
            "Run 'minikube-dev setup-docker' or install from: https://docs.docker.com/get-docker/",
        )
    }

    /// Get minikube prerequisite
    pub fn minikube() -> CommandPrereq {
        CommandPrereq::new(
            "minikube",
            "Run 'minikube-dev fresh-install' or install from: https://minikube.sigs.k8s.io/docs/start/",
        )
    }

    /// Get kubectl prerequisite
    pub fn kubectl() -> CommandPrereq {
        CommandPrereq::new(
            "kubectl",
            "Run 'minikube-dev fresh-install' or install from: https://kubernetes.io/docs/tasks/tools/",
        )
    }

    /// Check all prerequisites and return detailed results
    /// Returns (found_tools, missing_tools_with_hints)
    pub fn check_all(prereqs: &[&dyn Prerequisite]) -> (Vec<String>, Vec<(String, String)>) {
        let mut found = Vec::new();
        let mut missing = Vec::new();

        for prereq in prereqs {
            match prereq.check() {
                Ok(_) => {
                    found.push(prereq.name().to_string());
                }
                Err(e) => match e {
                    PrereqError::NotFound { name, hint } => {
                        missing.push((name, hint));
                    }
                    PrereqError::CheckFailed { name, source } => {
                        crate::log_warn!("Failed to check {}: {}", name, source);
                    }
                },
            }
        }

        (found, missing)
    }

    /// Require that every cluster-facing tool is present.
    ///
    /// Missing prerequisites are fatal; the returned error names each tool
    /// and tells the user what to run first.
    pub fn require_cluster_tools() -> Result<()> {
        let docker = Self::docker();
        let minikube = Self::minikube();
        let kubectl = Self::kubectl();

        let prereqs: Vec<&dyn Prerequisite> = vec![&docker, &minikube, &kubectl];
        let (_, missing) = Self::check_all(&prereqs);

        if missing.is_empty() {
            return Ok(());
        }

        let mut msg = String::from("Missing prerequisites:\n");
        for (name, hint) in &missing {
            msg.push_str(&format!("  - {}: {}\n", name, hint));
        }
        Err(anyhow!(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prereq_trait() {
        let prereq = CommandPrereq::new("echo", "Should always exist");
        assert_eq!(prereq.name(), "echo");
        assert!(prereq.check().is_ok());
    }

    #[test]
    fn test_missing_prereq() {
        let prereq = CommandPrereq::new("nonexistent-tool-xyz", "Test hint");
        assert!(prereq.check().is_err());
        assert_eq!(prereq.install_hint(), "Test hint");
    }

    #[test]
    fn test_check_all_partitions() {
        let present = CommandPrereq::new("echo", "n/a");
        let absent = CommandPrereq::new("nonexistent-tool-xyz", "install it");
        let prereqs: Vec<&dyn Prerequisite> = vec![&present, &absent];

        let (found, missing) = CommonPrereqs::check_all(&prereqs);
        assert_eq!(found, vec!["echo".to_string()]);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].0, "nonexistent-tool-xyz");
    }
}
