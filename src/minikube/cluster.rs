//! Minikube cluster profile and lifecycle operations

use anyhow::{Context, Result, anyhow};
use std::process::Command;

use crate::config::settings::{ProxySettings, Settings};

/// A named local cluster configuration, turned into `minikube start` flags
/// by a typed builder instead of ad-hoc string concatenation.
#[derive(Debug, Clone)]
pub struct ClusterProfile {
    pub name: String,
    pub driver: String,
    pub memory_mb: u32,
    pub cpus: u32,
    pub disk_size_gb: u32,
    pub insecure_registries: Vec<String>,
    pub registry_mirrors: Vec<String>,
    /// kicbase image URL passed as --base-image when overridden
    pub base_image: Option<String>,
    /// Extra flags from config, already split with shell quoting rules
    pub extra_flags: Vec<String>,
}

impl ClusterProfile {
    /// Build a profile from settings; CLI flag overrides are applied by the
    /// caller before this is used.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let extra_flags = match &settings.defaults.extra_start_flags {
            Some(raw) => shell_words::split(raw)
                .with_context(|| format!("Failed to parse extra_start_flags: {}", raw))?,
            None => Vec::new(),
        };

        Ok(Self {
            name: settings.defaults.profile.clone(),
            driver: settings.defaults.driver.clone(),
            memory_mb: settings.defaults.memory_mb,
            cpus: settings.defaults.cpus,
            disk_size_gb: settings.defaults.disk_size_gb,
            insecure_registries: settings.registry.insecure.clone(),
            registry_mirrors: settings.registry.mirrors.clone(),
            base_image: None,
            extra_flags,
        })
    }

    /// Assemble the argument vector for `minikube start`
    pub fn start_args(&self) -> Vec<String> {
        let mut args = vec![
            "start".to_string(),
            "--profile".to_string(),
            self.name.clone(),
            "--driver".to_string(),
            self.driver.clone(),
            format!("--memory={}mb", self.memory_mb),
            format!("--cpus={}", self.cpus),
            format!("--disk-size={}g", self.disk_size_gb),
        ];

        for registry in &self.insecure_registries {
            args.push(format!("--insecure-registry={}", registry));
        }

        for mirror in &self.registry_mirrors {
            args.push(format!("--registry-mirror={}", mirror));
        }

        if let Some(base) = &self.base_image {
            args.push(format!("--base-image={}", base));
        }

        args.extend(self.extra_flags.iter().cloned());

        args
    }
}

/// Handle for minikube lifecycle operations on one profile
#[derive(Debug, Clone)]
pub struct MinikubeCluster {
    pub profile: ClusterProfile,
    pub proxy: ProxySettings,
}

impl MinikubeCluster {
    pub fn new(profile: ClusterProfile, proxy: ProxySettings) -> Self {
        Self { profile, proxy }
    }

    /// Run `minikube start` once; a non-zero exit is an error the launcher
    /// retry loop handles.
    pub fn start_once(&self) -> Result<()> {
        let args = self.profile.start_args();
        crate::log_info!("Running: minikube {}", args.join(" "));

        let mut cmd = Command::new("minikube");
        cmd.args(&args);
        self.apply_proxy_env(&mut cmd);

        let status = cmd.status().context("Failed to run minikube start")?;

        if !status.success() {
            return Err(anyhow!(
                "minikube start failed for profile '{}' (exit: {})",
                self.profile.name,
                status
            ));
        }

        Ok(())
    }

    /// Stop the cluster
    pub fn stop(&self) -> Result<()> {
        crate::log_info!("Stopping minikube profile '{}'...", self.profile.name);

        let status = Command::new("minikube")
            .args(["stop", "--profile", &self.profile.name])
            .status()
            .context("Failed to run minikube stop")?;

        if !status.success() {
            return Err(anyhow!(
                "minikube stop failed for profile '{}'",
                self.profile.name
            ));
        }

        Ok(())
    }

    /// Delete the cluster profile, also used to clean up between failed
    /// start attempts.
    pub fn delete(&self) -> Result<()> {
        crate::log_info!("Deleting minikube profile '{}'...", self.profile.name);

        let status = Command::new("minikube")
            .args(["delete", "--profile", &self.profile.name])
            .status()
            .context("Failed to run minikube delete")?;

        if !status.success() {
            return Err(anyhow!(
                "minikube delete failed for profile '{}'",
                self.profile.name
            ));
        }

        Ok(())
    }

    /// Capture `minikube status` output for this profile
    pub fn status_output(&self) -> Result<String> {
        let output = Command::new("minikube")
            .args(["status", "--profile", &self.profile.name])
            .output()
            .context("Failed to run minikube status")?;

        // minikube status exits non-zero for stopped clusters; the text is
        // still the useful part either way
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Check whether the profile exists
    pub fn exists(&self) -> Result<bool> {
        Ok(Self::list_profiles()?
            .iter()
            .any(|p| p == &self.profile.name))
    }

    /// List known minikube profiles
    pub fn list_profiles() -> Result<Vec<String>> {
        let output = Command::new("minikube")
            .args(["profile", "list", "-o", "json"])
            .output()
            .context("Failed to list minikube profiles")?;

        if !output.status.success() {
            // No profiles yet is not an error
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: serde_json::Value = serde_json::from_str(stdout.trim())
            .context("Failed to parse minikube profile list output")?;

        let mut names = Vec::new();
        if let Some(valid) = parsed.get("valid").and_then(|v| v.as_array()) {
            for profile in valid {
                if let Some(name) = profile.get("Name").and_then(|n| n.as_str()) {
                    names.push(name.to_string());
                }
            }
        }

        Ok(names)
    }

    /// Load a cached image into the cluster's runtime
    pub fn load_image(&self, image: &str) -> Result<()> {
        crate::log_info!("Loading image into profile '{}': {}", self.profile.name, image);

        let status = Command::new("minikube")
            .args(["image", "load", image, "--profile", &self.profile.name])
            .status()
            .with_context(|| format!("Failed to load image: {}", image))?;

        if !status.success() {
            return Err(anyhow!("minikube image load failed for: {}", image));
        }

        Ok(())
    }

    /// Capture recent minikube logs for diagnostics
    pub fn recent_logs(&self) -> Result<String> {
        let output = Command::new("minikube")
            .args([
                "logs",
                "--profile",
                &self.profile.name,
                "--length",
                "50",
            ])
            .output()
            .context("Failed to run minikube logs")?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn apply_proxy_env(&self, cmd: &mut Command) {
        if let Some(http) = &self.proxy.http_proxy {
            cmd.env("HTTP_PROXY", http);
        }
        if let Some(https) = &self.proxy.https_proxy {
            cmd.env("HTTPS_PROXY", https);
        }
        if let Some(no_proxy) = &self.proxy.no_proxy {
            cmd.env("NO_PROXY", no_proxy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile() -> ClusterProfile {
        ClusterProfile {
            name: "dev".to_string(),
            driver: "docker".to_string(),
            memory_mb: 8192,
            cpus: 4,
            disk_size_gb: 40,
            insecure_registries: vec!["10.0.0.5:5000".to_string()],
            registry_mirrors: vec!["https://mirror.corp".to_string()],
            base_image: None,
            extra_flags: Vec::new(),
        }
    }

    #[test]
    fn test_start_args_basic() {
        let args = test_profile().start_args();

        assert_eq!(args[0], "start");
        assert!(args.contains(&"--profile".to_string()));
        assert!(args.contains(&"dev".to_string()));
        assert!(args.contains(&"--memory=8192mb".to_string()));
        assert!(args.contains(&"--cpus=4".to_string()));
        assert!(args.contains(&"--disk-size=40g".to_string()));
        assert!(args.contains(&"--insecure-registry=10.0.0.5:5000".to_string()));
        assert!(args.contains(&"--registry-mirror=https://mirror.corp".to_string()));
    }

    #[test]
    fn test_start_args_deterministic() {
        let profile = test_profile();
        assert_eq!(profile.start_args(), profile.start_args());
    }

    #[test]
    fn test_start_args_base_image() {
        let mut profile = test_profile();
        profile.base_image = Some("mirror.corp/kicbase:v0.0.45".to_string());

        let args = profile.start_args();
        assert!(args.contains(&"--base-image=mirror.corp/kicbase:v0.0.45".to_string()));
    }

    #[test]
    fn test_start_args_extra_flags_appended_last() {
        let mut profile = test_profile();
        profile.extra_flags = vec!["--wait=all".to_string()];

        let args = profile.start_args();
        assert_eq!(args.last().unwrap(), "--wait=all");
    }

    #[test]
    fn test_from_settings_parses_extra_flags() {
        let mut settings = Settings::default();
        settings.defaults.extra_start_flags =
            Some("--wait=all --extra-config 'kubelet.v=4'".to_string());

        let profile = ClusterProfile::from_settings(&settings).unwrap();
        assert_eq!(
            profile.extra_flags,
            vec!["--wait=all", "--extra-config", "kubelet.v=4"]
        );
    }
}
