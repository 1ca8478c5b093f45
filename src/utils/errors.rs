//! Enhanced error types with actionable suggestions

use colored::Colorize;
use thiserror::Error;

/// Enhanced error with suggestions and documentation links
#[derive(Error, Debug)]
#[error("{message}")]
pub struct MinikubeDevError {
    pub message: String,
    pub suggestions: Vec<String>,
    pub docs_link: Option<String>,
}

impl MinikubeDevError {
    /// Create a new error with suggestions
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
            docs_link: None,
        }
    }

    /// Add a suggestion to the error
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a documentation link
    pub fn with_docs(mut self, link: impl Into<String>) -> Self {
        self.docs_link = Some(link.into());
        self
    }

    /// Display the error with suggestions
    pub fn display(&self) {
        crate::log_error!("{}", self.message);

        if !self.suggestions.is_empty() {
            println!();
            println!("{}", "Suggestions:".yellow().bold());
            for suggestion in &self.suggestions {
                println!("  {} {}", "→".blue(), suggestion);
            }
        }

        if let Some(docs) = &self.docs_link {
            println!();
            println!("{} {}", "Documentation:".cyan(), docs);
        }
    }

    // Common error patterns

    /// Docker not installed error
    pub fn docker_not_found() -> Self {
        Self::new("Docker is not installed or not on PATH")
            .suggest("Run: minikube-dev setup-docker")
            .suggest("Verify with: docker version")
            .with_docs("https://docs.docker.com/get-docker/")
    }

    /// Cluster start retries exhausted
    pub fn start_exhausted(profile: &str, attempts: u32) -> Self {
        Self::new(format!(
            "Cluster '{}' failed to start after {} attempt(s)",
            profile, attempts
        ))
        .suggest("Run: minikube-dev troubleshoot")
        .suggest(format!("Inspect minikube logs: minikube logs -p {}", profile))
        .suggest("Check that Docker has enough memory and CPU available")
    }

    /// Binary download failure
    pub fn download_failed(tool: &str, url: &str) -> Self {
        Self::new(format!("Failed to download {} from {}", tool, url))
            .suggest("Check network connectivity and proxy settings")
            .suggest("Configure an internal mirror with: minikube-dev configure mirror")
    }

    /// Profile not found error
    pub fn profile_not_found(profile: &str) -> Self {
        Self::new(format!("Minikube profile '{}' not found", profile))
            .suggest(format!("Start it with: minikube-dev start --profile {}", profile))
            .suggest("List profiles with: minikube profile list")
    }
}

/// Helper to display error and exit
pub fn display_error_and_exit(error: MinikubeDevError) -> ! {
    error.display();
    std::process::exit(1);
}
