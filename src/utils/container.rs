//! Docker CLI wrapper for image operations

use anyhow::{Context, Result, anyhow};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::utils::progress::create_spinner;

/// Handle to the local Docker CLI.
///
/// minikube's docker driver requires Docker specifically, so unlike more
/// generic tooling there is no podman fallback here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Docker;

impl Docker {
    /// Detect the docker binary on PATH
    pub fn detect() -> Result<Self> {
        if which::which("docker").is_ok() {
            return Ok(Docker);
        }

        Err(anyhow!(
            "docker not found on PATH.\n  \
             Run 'minikube-dev setup-docker' for installation instructions."
        ))
    }

    /// Check if an image exists in the local store
    pub fn image_exists(&self, image: &str) -> Result<bool> {
        let output = Command::new("docker")
            .args(["image", "inspect", image])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("Failed to check if image exists: {}", image))?;

        Ok(output.status.success())
    }

    /// Pull an image, killing the subprocess if it exceeds `timeout`.
    /// Output is suppressed; a spinner stands in for docker's own progress.
    pub fn pull(&self, image: &str, timeout: Duration) -> Result<()> {
        let mut child = Command::new("docker")
            .args(["pull", image])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn docker pull for: {}", image))?;

        let pb = create_spinner(format!("Pulling {}", image));
        let result = wait_with_deadline(&mut child, image, timeout);

        match &result {
            Ok(()) => pb.finish_with_message(format!("✓ Pulled {}", image)),
            Err(_) => pb.finish_and_clear(),
        }

        result
    }

    /// Tag an image under a new name
    pub fn tag(&self, source: &str, target: &str) -> Result<()> {
        let status = Command::new("docker")
            .args(["tag", source, target])
            .status()
            .with_context(|| format!("Failed to tag image {} as {}", source, target))?;

        if !status.success() {
            return Err(anyhow!("docker tag {} {} failed", source, target));
        }

        Ok(())
    }

    /// Remove an image from the local store
    pub fn remove_image(&self, image: &str) -> Result<()> {
        let status = Command::new("docker")
            .args(["rmi", image])
            .status()
            .with_context(|| format!("Failed to remove image: {}", image))?;

        if !status.success() {
            return Err(anyhow!("docker rmi {} failed", image));
        }

        Ok(())
    }

    /// Get list of local images as repository:tag strings
    pub fn list_images(&self) -> Result<Vec<String>> {
        let output = Command::new("docker")
            .args(["images", "--format", "{{.Repository}}:{{.Tag}}"])
            .output()
            .context("Failed to list images")?;

        if !output.status.success() {
            return Err(anyhow!("Failed to list images"));
        }

        let images = String::from_utf8(output.stdout)
            .context("Failed to parse image list")?
            .lines()
            .map(|s| s.to_string())
            .collect();

        Ok(images)
    }

    /// Capture `docker info` output for diagnostics
    pub fn info(&self) -> Result<String> {
        let output = Command::new("docker")
            .args(["info"])
            .output()
            .context("Failed to run docker info")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("docker info failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn wait_with_deadline(child: &mut Child, image: &str, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait()? {
            Some(status) if status.success() => return Ok(()),
            Some(status) => {
                return Err(anyhow!(
                    "docker pull {} exited with status {}",
                    image,
                    status
                ));
            }
            None => {
                if Instant::now() >= deadline {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(anyhow!(
                        "docker pull {} timed out after {}s",
                        image,
                        timeout.as_secs()
                    ));
                }
                std::thread::sleep(Duration::from_millis(250));
            }
        }
    }
}

impl std::fmt::Display for Docker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "docker")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_docker() {
        // Docker may or may not be installed in CI; only assert the error
        // shape when it is missing.
        match Docker::detect() {
            Ok(runtime) => assert_eq!(format!("{}", runtime), "docker"),
            Err(e) => assert!(e.to_string().contains("docker not found")),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Docker), "docker");
    }
}
