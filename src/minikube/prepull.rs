//! Image pre-pull pipeline with registry fallback and re-tagging
//!
//! Best-effort cache warming before `minikube start`: pull failures are
//! logged and counted but never abort the run.

use anyhow::Result;
use std::time::Duration;

use crate::config::images::ImageSpec;
use crate::utils::Docker;

/// Seam over the local image store so the pipeline can be exercised
/// without a container runtime.
pub trait ImageStore {
    fn pull(&mut self, image: &str) -> Result<()>;
    fn tag(&mut self, source: &str, target: &str) -> Result<()>;
}

/// Docker-backed store with a per-pull timeout
pub struct DockerStore {
    docker: Docker,
    pull_timeout: Duration,
}

impl DockerStore {
    pub fn new(docker: Docker, pull_timeout: Duration) -> Self {
        Self {
            docker,
            pull_timeout,
        }
    }
}

impl ImageStore for DockerStore {
    fn pull(&mut self, image: &str) -> Result<()> {
        self.docker.pull(image, self.pull_timeout)
    }

    fn tag(&mut self, source: &str, target: &str) -> Result<()> {
        self.docker.tag(source, target)
    }
}

/// Where a successfully cached image came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullSource {
    /// Pulled directly from the resolved URL
    Direct(String),
    /// Pulled from a fallback registry and re-tagged to the expected name
    Fallback { pulled: String, retagged_to: String },
}

/// Result of the pipeline over the whole image set
#[derive(Debug, Default)]
pub struct PullSummary {
    pub pulled: Vec<(String, PullSource)>,
    pub failed: Vec<String>,
}

impl PullSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pull every image in the set.
///
/// Default-resolved images that fail are retried against the fallback
/// registries in order; the first success is re-tagged to the name
/// minikube expects. Custom URLs never fall back: a failure there is
/// terminal for that image but non-fatal for the run.
pub fn prepull_images<S: ImageStore>(
    store: &mut S,
    specs: &[ImageSpec],
    fallback_registries: &[String],
) -> PullSummary {
    let mut summary = PullSummary::default();

    for spec in specs {
        let url = spec.resolve();

        match store.pull(&url) {
            Ok(()) => {
                crate::log_info!("Pulled {}: {}", spec.component, url);
                summary
                    .pulled
                    .push((spec.component.key().to_string(), PullSource::Direct(url)));
                continue;
            }
            Err(e) => {
                crate::log_warn!("Pull failed for {} ({}): {}", spec.component, url, e);
            }
        }

        if spec.has_custom_url() {
            // Custom URLs are taken verbatim, no fallback
            summary.failed.push(spec.component.key().to_string());
            continue;
        }

        match pull_via_fallback(store, spec, fallback_registries) {
            Some(source) => {
                summary
                    .pulled
                    .push((spec.component.key().to_string(), source));
            }
            None => {
                crate::log_warn!(
                    "All registries failed for {}; continuing without it",
                    spec.component
                );
                summary.failed.push(spec.component.key().to_string());
            }
        }
    }

    crate::log_info!(
        "Image pre-pull finished: {} cached, {} failed",
        summary.pulled.len(),
        summary.failed.len()
    );

    summary
}

fn pull_via_fallback<S: ImageStore>(
    store: &mut S,
    spec: &ImageSpec,
    fallback_registries: &[String],
) -> Option<PullSource> {
    for registry in fallback_registries {
        let candidate = spec.fallback_url(registry);
        crate::log_info!("Trying fallback registry: {}", candidate);

        if let Err(e) = store.pull(&candidate) {
            crate::log_warn!("Fallback pull failed ({}): {}", candidate, e);
            continue;
        }

        let expected = spec.expected_name();
        match store.tag(&candidate, &expected) {
            Ok(()) => {
                crate::log_info!("Re-tagged {} as {}", candidate, expected);
                return Some(PullSource::Fallback {
                    pulled: candidate,
                    retagged_to: expected,
                });
            }
            Err(e) => {
                crate::log_warn!("Re-tag failed for {}: {}", candidate, e);
                continue;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::images::{Component, image_set};
    use crate::config::settings::{ImageOverrides, Versions};
    use anyhow::anyhow;

    /// Records calls; pulls fail unless the URL is in `available`
    struct MockStore {
        available: Vec<String>,
        pulls: Vec<String>,
        tags: Vec<(String, String)>,
    }

    impl MockStore {
        fn new(available: &[&str]) -> Self {
            Self {
                available: available.iter().map(|s| s.to_string()).collect(),
                pulls: Vec::new(),
                tags: Vec::new(),
            }
        }
    }

    impl ImageStore for MockStore {
        fn pull(&mut self, image: &str) -> Result<()> {
            self.pulls.push(image.to_string());
            if self.available.iter().any(|a| a == image) {
                Ok(())
            } else {
                Err(anyhow!("manifest unknown: {}", image))
            }
        }

        fn tag(&mut self, source: &str, target: &str) -> Result<()> {
            self.tags.push((source.to_string(), target.to_string()));
            Ok(())
        }
    }

    fn etcd_spec(overrides: &ImageOverrides) -> ImageSpec {
        ImageSpec::for_component(Component::Etcd, &Versions::default(), overrides)
    }

    fn fallbacks() -> Vec<String> {
        vec![
            "fallback-a.example.com/images".to_string(),
            "fallback-b.example.com/images".to_string(),
        ]
    }

    #[test]
    fn test_direct_pull_success() {
        let spec = etcd_spec(&ImageOverrides::default());
        let mut store = MockStore::new(&["registry.k8s.io/etcd:3.5.15-0"]);

        let summary = prepull_images(&mut store, &[spec], &fallbacks());

        assert!(summary.all_succeeded());
        assert_eq!(store.pulls, vec!["registry.k8s.io/etcd:3.5.15-0"]);
        assert!(store.tags.is_empty());
        assert_eq!(
            summary.pulled[0].1,
            PullSource::Direct("registry.k8s.io/etcd:3.5.15-0".to_string())
        );
    }

    #[test]
    fn test_fallback_pull_retags_to_expected_name() {
        let spec = etcd_spec(&ImageOverrides::default());
        // Direct pull fails, second fallback succeeds
        let mut store = MockStore::new(&["fallback-b.example.com/images/etcd:3.5.15-0"]);

        let summary = prepull_images(&mut store, &[spec], &fallbacks());

        assert!(summary.all_succeeded());
        assert_eq!(
            store.pulls,
            vec![
                "registry.k8s.io/etcd:3.5.15-0",
                "fallback-a.example.com/images/etcd:3.5.15-0",
                "fallback-b.example.com/images/etcd:3.5.15-0",
            ]
        );
        assert_eq!(
            store.tags,
            vec![(
                "fallback-b.example.com/images/etcd:3.5.15-0".to_string(),
                "registry.k8s.io/etcd:3.5.15-0".to_string()
            )]
        );
    }

    #[test]
    fn test_custom_url_never_falls_back() {
        let mut overrides = ImageOverrides::default();
        overrides.set(Component::Etcd, Some("mirror.corp/etcd:custom".to_string()));
        let spec = etcd_spec(&overrides);

        // Nothing is available, custom pull fails
        let mut store = MockStore::new(&[]);
        let summary = prepull_images(&mut store, &[spec], &fallbacks());

        // Exactly one pull attempt, no fallback, no tag; failure is recorded
        // but non-fatal
        assert_eq!(store.pulls, vec!["mirror.corp/etcd:custom"]);
        assert!(store.tags.is_empty());
        assert_eq!(summary.failed, vec!["etcd"]);
        assert!(summary.pulled.is_empty());
    }

    #[test]
    fn test_total_failure_is_nonfatal_and_counted() {
        let spec = etcd_spec(&ImageOverrides::default());
        let mut store = MockStore::new(&[]);

        let summary = prepull_images(&mut store, &[spec], &fallbacks());

        assert_eq!(summary.failed, vec!["etcd"]);
        // Direct attempt plus every fallback, nothing more
        assert_eq!(store.pulls.len(), 3);
    }

    #[test]
    fn test_mixed_set_continues_after_failures() {
        let versions = Versions::default();
        let overrides = ImageOverrides::default();
        let specs = image_set(&versions, &overrides);

        // Only pause and etcd are available upstream
        let mut store = MockStore::new(&[
            "registry.k8s.io/pause:3.10",
            "registry.k8s.io/etcd:3.5.15-0",
        ]);

        let summary = prepull_images(&mut store, &specs, &[]);

        assert_eq!(summary.pulled.len(), 2);
        assert_eq!(summary.failed.len(), specs.len() - 2);
    }
}
