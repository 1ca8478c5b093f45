//! Image command implementations: pull, list, load, clean

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::images::{ImageSpec, image_set};
use crate::config::settings::{ImageOverrides, Settings};
use crate::minikube::prepull::{DockerStore, PullSource, PullSummary, prepull_images};
use crate::minikube::{ClusterProfile, MinikubeCluster};
use crate::utils::{Docker, dryrun};

/// Handle images pull: the pre-pull/fallback/retag pipeline
pub fn pull(settings: &Settings, cli_overrides: &ImageOverrides) -> Result<()> {
    let mut overrides = settings.images.clone();
    overrides.merge(cli_overrides);
    let specs = image_set(&settings.versions, &overrides);

    if dryrun::is_dry_run() {
        for spec in &specs {
            dryrun::log_action(&format!("docker pull {}", spec.resolve()));
        }
        return Ok(());
    }

    let docker = Docker::detect()?;
    let mut store = DockerStore::new(
        docker,
        Duration::from_secs(settings.retry.pull_timeout_secs),
    );

    let summary = prepull_images(&mut store, &specs, &settings.registry.fallbacks);

    let manifest = write_manifest(&summary)?;
    crate::log_info!("Image manifest written to {}", manifest.display());

    if !summary.all_succeeded() {
        crate::log_warn!(
            "{} image(s) could not be cached: {}",
            summary.failed.len(),
            summary.failed.join(", ")
        );
    }

    Ok(())
}

/// Handle images list: print resolved URLs from config
pub fn list(settings: &Settings) -> Result<()> {
    let specs = image_set(&settings.versions, &settings.images);

    println!("Resolved component images:");
    println!();
    for spec in &specs {
        let marker = if spec.has_custom_url() { " (custom)" } else { "" };
        println!("  {:<12} {}{}", spec.component.key(), spec.resolve(), marker);
    }

    Ok(())
}

/// Handle images load: push cached images into the cluster runtime
pub fn load(settings: &Settings, profile: Option<String>) -> Result<()> {
    let mut cluster_profile = ClusterProfile::from_settings(settings)?;
    if let Some(name) = profile {
        cluster_profile.name = name;
    }
    let cluster = MinikubeCluster::new(cluster_profile, settings.proxy.clone());

    let specs = image_set(&settings.versions, &settings.images);
    let targets = load_targets(&specs);

    if dryrun::is_dry_run() {
        for image in &targets {
            dryrun::log_action(&format!("minikube image load {}", image));
        }
        return Ok(());
    }

    let docker = Docker::detect()?;
    let mut loaded = 0;

    for image in &targets {
        if !docker.image_exists(image)? {
            crate::log_warn!(
                "{} is not in the local Docker store, skipping (run 'minikube-dev images pull' first)",
                image
            );
            continue;
        }

        cluster.load_image(image)?;
        loaded += 1;
    }

    crate::log_info!(
        "{} image(s) loaded into profile '{}'",
        loaded,
        cluster.profile.name
    );
    Ok(())
}

/// Names `images load` pushes into the cluster. A custom override is
/// cached under its own URL verbatim, never under the default name, so
/// the load targets are the resolved URLs.
fn load_targets(specs: &[ImageSpec]) -> Vec<String> {
    specs.iter().map(|s| s.resolve()).collect()
}

/// Handle images clean: remove the component images from the local store
pub fn clean(settings: &Settings, yes: bool) -> Result<()> {
    let specs = image_set(&settings.versions, &settings.images);

    if !yes
        && !crate::utils::confirm(&format!(
            "Remove {} component images from the local Docker store?",
            specs.len()
        ))?
    {
        crate::log_info!("Clean cancelled");
        return Ok(());
    }

    let docker = Docker::detect()?;
    let local_images = docker.list_images().unwrap_or_default();
    let candidates = clean_candidates(&specs, &local_images);

    if dryrun::is_dry_run() {
        for image in &candidates {
            dryrun::log_action(&format!("docker rmi {}", image));
        }
        return Ok(());
    }

    let mut removed = 0;
    for image in &candidates {
        match docker.remove_image(image) {
            Ok(()) => removed += 1,
            Err(e) => crate::log_warn!("Could not remove {}: {}", image, e),
        }
    }

    crate::log_info!("Removed {} image(s)", removed);
    Ok(())
}

/// Locally present images `images clean` removes. Both the expected
/// name and a custom source URL may be in the store.
fn clean_candidates(specs: &[ImageSpec], local_images: &[String]) -> Vec<String> {
    let mut out = Vec::new();

    for spec in specs {
        let mut names = vec![spec.expected_name()];
        if let Some(custom) = &spec.custom_url {
            names.push(custom.clone());
        }

        for name in names {
            if local_images.iter().any(|i| i == &name) {
                out.push(name);
            }
        }
    }

    out
}

/// Render the manifest of cached images as text
pub fn format_manifest(summary: &PullSummary) -> String {
    let mut out = String::from("# minikube-dev image manifest\n");

    for (component, source) in &summary.pulled {
        match source {
            PullSource::Direct(url) => {
                out.push_str(&format!("{} {}\n", component, url));
            }
            PullSource::Fallback {
                pulled,
                retagged_to,
            } => {
                out.push_str(&format!("{} {} -> {}\n", component, pulled, retagged_to));
            }
        }
    }

    for component in &summary.failed {
        out.push_str(&format!("{} FAILED\n", component));
    }

    out
}

/// Write the manifest listing next to the config
pub fn write_manifest(summary: &PullSummary) -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("minikube-dev");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create directory: {}", config_dir.display()))?;

    let path = config_dir.join("image-manifest.txt");
    std::fs::write(&path, format_manifest(summary))
        .with_context(|| format!("Failed to write manifest: {}", path.display()))?;

    Ok(path)
}
