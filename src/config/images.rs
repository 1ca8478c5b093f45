//! Component image specifications and URL resolution

use serde::{Deserialize, Serialize};

use crate::config::settings::{ImageOverrides, Versions};

/// The Kubernetes component images a cluster start needs in the local cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Pause,
    ApiServer,
    Scheduler,
    ControllerManager,
    KubeProxy,
    Etcd,
    CoreDns,
    StorageProvisioner,
    Kicbase,
}

impl Component {
    pub const ALL: [Component; 9] = [
        Component::Pause,
        Component::ApiServer,
        Component::Scheduler,
        Component::ControllerManager,
        Component::KubeProxy,
        Component::Etcd,
        Component::CoreDns,
        Component::StorageProvisioner,
        Component::Kicbase,
    ];

    /// Short key used for CLI flags and config entries
    pub fn key(&self) -> &'static str {
        match self {
            Component::Pause => "pause",
            Component::ApiServer => "apiserver",
            Component::Scheduler => "scheduler",
            Component::ControllerManager => "controller",
            Component::KubeProxy => "proxy",
            Component::Etcd => "etcd",
            Component::CoreDns => "coredns",
            Component::StorageProvisioner => "storage",
            Component::Kicbase => "kicbase",
        }
    }

    /// Registry the image is served from upstream
    pub fn default_registry(&self) -> &'static str {
        match self {
            Component::StorageProvisioner | Component::Kicbase => "gcr.io/k8s-minikube",
            _ => "registry.k8s.io",
        }
    }

    /// Repository path under the registry
    pub fn repository(&self) -> &'static str {
        match self {
            Component::Pause => "pause",
            Component::ApiServer => "kube-apiserver",
            Component::Scheduler => "kube-scheduler",
            Component::ControllerManager => "kube-controller-manager",
            Component::KubeProxy => "kube-proxy",
            Component::Etcd => "etcd",
            Component::CoreDns => "coredns/coredns",
            Component::StorageProvisioner => "storage-provisioner",
            Component::Kicbase => "kicbase",
        }
    }

    /// Version tag for this component from the configured versions
    pub fn version(&self, versions: &Versions) -> String {
        match self {
            Component::Pause => versions.pause.clone(),
            Component::ApiServer
            | Component::Scheduler
            | Component::ControllerManager
            | Component::KubeProxy => versions.kubernetes.clone(),
            Component::Etcd => versions.etcd.clone(),
            Component::CoreDns => versions.coredns.clone(),
            Component::StorageProvisioner => versions.storage_provisioner.clone(),
            Component::Kicbase => versions.kicbase.clone(),
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A single component image: where to pull it from and the name minikube
/// expects it under.
#[derive(Debug, Clone)]
pub struct ImageSpec {
    pub component: Component,
    pub custom_url: Option<String>,
    pub registry: String,
    pub repository: String,
    pub version: String,
}

impl ImageSpec {
    /// Build the spec for a component from configured versions and overrides
    pub fn for_component(
        component: Component,
        versions: &Versions,
        overrides: &ImageOverrides,
    ) -> Self {
        Self {
            component,
            custom_url: overrides.get(component).map(|s| s.to_string()),
            registry: component.default_registry().to_string(),
            repository: component.repository().to_string(),
            version: component.version(versions),
        }
    }

    /// URL to pull: the custom URL verbatim if set, otherwise
    /// `{registry}/{repository}:{version}`. No URL syntax validation;
    /// a malformed URL surfaces as a pull failure.
    pub fn resolve(&self) -> String {
        match &self.custom_url {
            Some(url) => url.clone(),
            None => self.expected_name(),
        }
    }

    /// The image name minikube expects in the local cache.
    /// Fallback pulls are re-tagged to this.
    pub fn expected_name(&self) -> String {
        format!("{}/{}:{}", self.registry, self.repository, self.version)
    }

    pub fn has_custom_url(&self) -> bool {
        self.custom_url.is_some()
    }

    /// Last path segment of the repository; fallback registries publish
    /// flattened names (e.g. coredns/coredns -> coredns).
    pub fn short_name(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }

    /// Candidate URL on a fallback registry
    pub fn fallback_url(&self, fallback_registry: &str) -> String {
        format!("{}/{}:{}", fallback_registry, self.short_name(), self.version)
    }
}

/// Build the full image set for a run
pub fn image_set(versions: &Versions, overrides: &ImageOverrides) -> Vec<ImageSpec> {
    Component::ALL
        .iter()
        .map(|c| ImageSpec::for_component(*c, versions, overrides))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_etcd() {
        let versions = Versions::default();
        let overrides = ImageOverrides::default();
        let spec = ImageSpec::for_component(Component::Etcd, &versions, &overrides);

        assert_eq!(spec.resolve(), "registry.k8s.io/etcd:3.5.15-0");
        assert_eq!(spec.expected_name(), "registry.k8s.io/etcd:3.5.15-0");
        assert!(!spec.has_custom_url());
    }

    #[test]
    fn test_resolve_all_defaults_nonempty() {
        let versions = Versions::default();
        let overrides = ImageOverrides::default();

        for spec in image_set(&versions, &overrides) {
            let url = spec.resolve();
            assert!(!url.is_empty());
            assert_eq!(
                url,
                format!("{}/{}:{}", spec.registry, spec.repository, spec.version)
            );
        }
    }

    #[test]
    fn test_resolve_custom_url_verbatim() {
        let versions = Versions::default();
        let mut overrides = ImageOverrides::default();
        overrides.set(
            Component::ApiServer,
            Some("mirror.corp/apiserver:v1.31.0-patched".to_string()),
        );

        let spec = ImageSpec::for_component(Component::ApiServer, &versions, &overrides);
        assert_eq!(spec.resolve(), "mirror.corp/apiserver:v1.31.0-patched");
        assert!(spec.has_custom_url());
        // expected name is still the upstream one minikube looks for
        assert_eq!(
            spec.expected_name(),
            "registry.k8s.io/kube-apiserver:v1.31.0"
        );
    }

    #[test]
    fn test_coredns_nested_repository() {
        let versions = Versions::default();
        let overrides = ImageOverrides::default();
        let spec = ImageSpec::for_component(Component::CoreDns, &versions, &overrides);

        assert_eq!(spec.resolve(), "registry.k8s.io/coredns/coredns:v1.11.1");
        assert_eq!(spec.short_name(), "coredns");
        assert_eq!(
            spec.fallback_url("registry.aliyuncs.com/google_containers"),
            "registry.aliyuncs.com/google_containers/coredns:v1.11.1"
        );
    }

    #[test]
    fn test_storage_provisioner_registry() {
        let versions = Versions::default();
        let overrides = ImageOverrides::default();
        let spec =
            ImageSpec::for_component(Component::StorageProvisioner, &versions, &overrides);

        assert_eq!(
            spec.resolve(),
            "gcr.io/k8s-minikube/storage-provisioner:v5"
        );
    }

    #[test]
    fn test_image_set_covers_all_components() {
        let versions = Versions::default();
        let overrides = ImageOverrides::default();
        let set = image_set(&versions, &overrides);

        assert_eq!(set.len(), Component::ALL.len());
        assert!(set.iter().any(|s| s.component == Component::Kicbase));
    }

    #[test]
    fn test_component_keys() {
        assert_eq!(Component::ControllerManager.key(), "controller");
        assert_eq!(format!("{}", Component::KubeProxy), "proxy");
    }
}
