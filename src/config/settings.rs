//! Configuration file support for minikube-dev
//!
//! Replaces the shell-sourced key/value files of the original scripts with
//! one typed TOML document. CLI flags override anything loaded from here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::images::Component;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub proxy: ProxySettings,

    #[serde(default)]
    pub images: ImageOverrides,

    #[serde(default)]
    pub versions: Versions,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub mirrors: BinaryMirrors,
}

/// Default values for the cluster profile
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Defaults {
    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default = "default_driver")]
    pub driver: String,

    #[serde(default = "default_memory_mb")]
    pub memory_mb: u32,

    #[serde(default = "default_cpus")]
    pub cpus: u32,

    #[serde(default = "default_disk_size_gb")]
    pub disk_size_gb: u32,

    /// Extra flags appended verbatim to `minikube start`, split with
    /// shell-style quoting rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_start_flags: Option<String>,
}

/// Container registry settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistrySettings {
    /// Registries accessed without TLS certificate validation
    #[serde(default)]
    pub insecure: Vec<String>,

    /// Registry mirrors passed to minikube
    #[serde(default)]
    pub mirrors: Vec<String>,

    /// Ordered fallback registries tried when a default image pull fails
    #[serde(default = "default_fallback_registries")]
    pub fallbacks: Vec<String>,
}

/// Proxy settings applied to the minikube subprocess environment
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProxySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<String>,
}

/// Per-component image URL overrides.
///
/// A set override is used verbatim and never falls back to another
/// registry on pull failure.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ImageOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apiserver: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coredns: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kicbase: Option<String>,
}

impl ImageOverrides {
    /// Get the override URL for a component, if set and non-empty
    pub fn get(&self, component: Component) -> Option<&str> {
        let value = match component {
            Component::Pause => &self.pause,
            Component::ApiServer => &self.apiserver,
            Component::Scheduler => &self.scheduler,
            Component::ControllerManager => &self.controller,
            Component::KubeProxy => &self.proxy,
            Component::Etcd => &self.etcd,
            Component::CoreDns => &self.coredns,
            Component::StorageProvisioner => &self.storage,
            Component::Kicbase => &self.kicbase,
        };
        value.as_deref().filter(|s| !s.is_empty())
    }

    /// Set the override URL for a component
    pub fn set(&mut self, component: Component, url: Option<String>) {
        let slot = match component {
            Component::Pause => &mut self.pause,
            Component::ApiServer => &mut self.apiserver,
            Component::Scheduler => &mut self.scheduler,
            Component::ControllerManager => &mut self.controller,
            Component::KubeProxy => &mut self.proxy,
            Component::Etcd => &mut self.etcd,
            Component::CoreDns => &mut self.coredns,
            Component::StorageProvisioner => &mut self.storage,
            Component::Kicbase => &mut self.kicbase,
        };
        *slot = url;
    }

    /// Merge another set of overrides on top of this one (other wins)
    pub fn merge(&mut self, other: &ImageOverrides) {
        for component in Component::ALL {
            if let Some(url) = other.get(component) {
                self.set(component, Some(url.to_string()));
            }
        }
    }
}

/// Version settings for the component images and downloaded tools
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Versions {
    #[serde(default = "default_kubernetes_version")]
    pub kubernetes: String,

    #[serde(default = "default_pause_version")]
    pub pause: String,

    #[serde(default = "default_etcd_version")]
    pub etcd: String,

    #[serde(default = "default_coredns_version")]
    pub coredns: String,

    #[serde(default = "default_storage_provisioner_version")]
    pub storage_provisioner: String,

    #[serde(default = "default_kicbase_version")]
    pub kicbase: String,

    #[serde(default = "default_minikube_version")]
    pub minikube: String,

    #[serde(default = "default_kubectl_version")]
    pub kubectl: String,
}

/// Retry and timeout settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrySettings {
    #[serde(default = "default_start_max_attempts")]
    pub start_max_attempts: u32,

    #[serde(default = "default_start_interval_secs")]
    pub start_interval_secs: u64,

    #[serde(default = "default_pull_timeout_secs")]
    pub pull_timeout_secs: u64,

    #[serde(default = "default_readiness_attempts")]
    pub readiness_attempts: u32,

    #[serde(default = "default_readiness_interval_secs")]
    pub readiness_interval_secs: u64,
}

/// Enterprise mirror base URLs for binary downloads.
///
/// When unset, minikube comes from GitHub releases and kubectl from
/// dl.k8s.io.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BinaryMirrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minikube_base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubectl_base: Option<String>,
}

// Default value functions
fn default_profile() -> String {
    "minikube-dev".to_string()
}

fn default_driver() -> String {
    "docker".to_string()
}

fn default_memory_mb() -> u32 {
    8192
}

fn default_cpus() -> u32 {
    4
}

fn default_disk_size_gb() -> u32 {
    40
}

fn default_fallback_registries() -> Vec<String> {
    vec![
        "registry.aliyuncs.com/google_containers".to_string(),
        "registry.cn-hangzhou.aliyuncs.com/google_containers".to_string(),
    ]
}

fn default_kubernetes_version() -> String {
    "v1.31.0".to_string()
}

fn default_pause_version() -> String {
    "3.10".to_string()
}

fn default_etcd_version() -> String {
    "3.5.15-0".to_string()
}

fn default_coredns_version() -> String {
    "v1.11.1".to_string()
}

fn default_storage_provisioner_version() -> String {
    "v5".to_string()
}

fn default_kicbase_version() -> String {
    "v0.0.45".to_string()
}

fn default_minikube_version() -> String {
    "v1.34.0".to_string()
}

fn default_kubectl_version() -> String {
    "v1.31.0".to_string()
}

fn default_start_max_attempts() -> u32 {
    3
}

fn default_start_interval_secs() -> u64 {
    10
}

fn default_pull_timeout_secs() -> u64 {
    300
}

fn default_readiness_attempts() -> u32 {
    30
}

fn default_readiness_interval_secs() -> u64 {
    10
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            driver: default_driver(),
            memory_mb: default_memory_mb(),
            cpus: default_cpus(),
            disk_size_gb: default_disk_size_gb(),
            extra_start_flags: None,
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            insecure: Vec::new(),
            mirrors: Vec::new(),
            fallbacks: default_fallback_registries(),
        }
    }
}

impl Default for Versions {
    fn default() -> Self {
        Self {
            kubernetes: default_kubernetes_version(),
            pause: default_pause_version(),
            etcd: default_etcd_version(),
            coredns: default_coredns_version(),
            storage_provisioner: default_storage_provisioner_version(),
            kicbase: default_kicbase_version(),
            minikube: default_minikube_version(),
            kubectl: default_kubectl_version(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            start_max_attempts: default_start_max_attempts(),
            start_interval_secs: default_start_interval_secs(),
            pull_timeout_secs: default_pull_timeout_secs(),
            readiness_attempts: default_readiness_attempts(),
            readiness_interval_secs: default_readiness_interval_secs(),
        }
    }
}

impl Settings {
    /// Load settings, preferring an explicit path over the search order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        if let Some(path) = Self::find_config_file() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Find config file in standard locations
    /// Priority:
    /// 1. .minikube-dev.toml in current directory
    /// 2. ~/.config/minikube-dev/config.toml (XDG config directory)
    pub fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(".minikube-dev.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("minikube-dev").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        None
    }

    /// Path where `configure` subcommands persist settings.
    /// Uses the found config file, else the XDG location.
    pub fn persist_path() -> Result<PathBuf> {
        if let Some(path) = Self::find_config_file() {
            return Ok(path);
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("minikube-dev").join("config.toml"))
    }

    /// Save settings to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example config file content
    pub fn example_config() -> String {
        let header = "# minikube-dev configuration file\n\
                      # Place this file at ~/.config/minikube-dev/config.toml or .minikube-dev.toml in your project\n\n";

        match toml::to_string_pretty(&Settings::default()) {
            Ok(config) => format!("{}{}", header, config),
            Err(_) => header.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.defaults.profile, "minikube-dev");
        assert_eq!(settings.defaults.driver, "docker");
        assert_eq!(settings.defaults.memory_mb, 8192);
        assert_eq!(settings.retry.start_max_attempts, 3);
        assert_eq!(settings.versions.etcd, "3.5.15-0");
        assert!(!settings.registry.fallbacks.is_empty());
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        assert!(toml_str.contains("profile"));
        assert!(toml_str.contains("minikube-dev"));
    }

    #[test]
    fn test_settings_deserialization() {
        let toml_str = r#"
[defaults]
profile = "dev2"
memory_mb = 4096

[proxy]
http_proxy = "http://proxy.corp:3128"

[images]
etcd = "mirror.corp/etcd:3.5.15-0"

[retry]
start_max_attempts = 5
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.defaults.profile, "dev2");
        assert_eq!(settings.defaults.memory_mb, 4096);
        // unspecified fields fall back to defaults
        assert_eq!(settings.defaults.cpus, 4);
        assert_eq!(
            settings.proxy.http_proxy.as_deref(),
            Some("http://proxy.corp:3128")
        );
        assert_eq!(
            settings.images.get(Component::Etcd),
            Some("mirror.corp/etcd:3.5.15-0")
        );
        assert_eq!(settings.retry.start_max_attempts, 5);
    }

    #[test]
    fn test_empty_config_loads_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.defaults.profile, "minikube-dev");
        assert_eq!(settings.retry.readiness_attempts, 30);
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");

        let mut settings = Settings::default();
        settings.defaults.profile = "roundtrip".to_string();
        settings.registry.insecure.push("10.0.0.5:5000".to_string());
        settings
            .images
            .set(Component::Pause, Some("mirror.corp/pause:3.10".to_string()));
        settings.save(&path).unwrap();

        let reloaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(reloaded.defaults.profile, "roundtrip");
        assert_eq!(reloaded.registry.insecure, vec!["10.0.0.5:5000"]);
        assert_eq!(
            reloaded.images.get(Component::Pause),
            Some("mirror.corp/pause:3.10")
        );
    }

    #[test]
    fn test_image_overrides_merge() {
        let mut base = ImageOverrides::default();
        base.set(Component::Etcd, Some("a/etcd:1".to_string()));

        let mut top = ImageOverrides::default();
        top.set(Component::Etcd, Some("b/etcd:2".to_string()));
        top.set(Component::Pause, Some("b/pause:3".to_string()));

        base.merge(&top);
        assert_eq!(base.get(Component::Etcd), Some("b/etcd:2"));
        assert_eq!(base.get(Component::Pause), Some("b/pause:3"));
        assert_eq!(base.get(Component::CoreDns), None);
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let mut overrides = ImageOverrides::default();
        overrides.set(Component::Etcd, Some(String::new()));
        assert_eq!(overrides.get(Component::Etcd), None);
    }

    #[test]
    fn test_example_config() {
        let example = Settings::example_config();
        assert!(example.contains("minikube-dev configuration"));
        assert!(example.contains("[defaults]"));
        assert!(example.contains("[retry]"));
    }
}
