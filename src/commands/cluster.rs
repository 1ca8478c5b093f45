//! Cluster lifecycle command implementations

use anyhow::Result;
use std::time::Duration;

use crate::commands::images::write_manifest;
use crate::config::images::{Component, image_set};
use crate::config::settings::{ImageOverrides, Settings};
use crate::minikube::prepull::{DockerStore, prepull_images};
use crate::minikube::{ClusterProfile, LaunchState, MinikubeCluster, kubectl};
use crate::utils::errors::{MinikubeDevError, display_error_and_exit};
use crate::utils::{CommonPrereqs, Docker, RetryPolicy, dryrun};

/// Options for the start command, CLI flags layered over config defaults
#[derive(Debug, Default)]
pub struct StartOptions {
    pub profile: Option<String>,
    pub driver: Option<String>,
    pub memory: Option<u32>,
    pub cpus: Option<u32>,
    pub disk_size: Option<u32>,
    pub skip_pull: bool,
    pub image_overrides: ImageOverrides,
}

/// Handle the start command: pre-pull images, then launch with bounded
/// retries and poll node readiness.
pub fn start(settings: &Settings, opts: StartOptions) -> Result<()> {
    CommonPrereqs::require_cluster_tools()?;

    // Effective image overrides: config file first, CLI flags win
    let mut overrides = settings.images.clone();
    overrides.merge(&opts.image_overrides);
    let specs = image_set(&settings.versions, &overrides);

    if opts.skip_pull {
        crate::log_info!("Skipping image pre-pull (--skip-pull)");
    } else {
        dryrun::exec_unless_dry_run("Pre-pull component images", || {
            let docker = Docker::detect()?;
            let mut store = DockerStore::new(
                docker,
                Duration::from_secs(settings.retry.pull_timeout_secs),
            );
            let summary = prepull_images(&mut store, &specs, &settings.registry.fallbacks);
            let manifest = write_manifest(&summary)?;
            crate::log_info!("Image manifest written to {}", manifest.display());
            Ok(())
        })?;
    }

    let mut profile = ClusterProfile::from_settings(settings)?;
    if let Some(name) = opts.profile {
        profile.name = name;
    }
    if let Some(driver) = opts.driver {
        profile.driver = driver;
    }
    if let Some(memory) = opts.memory {
        profile.memory_mb = memory;
    }
    if let Some(cpus) = opts.cpus {
        profile.cpus = cpus;
    }
    if let Some(disk) = opts.disk_size {
        profile.disk_size_gb = disk;
    }

    // An overridden kicbase is handed to minikube directly; the default one
    // is only pre-pulled into the local cache
    if overrides.get(Component::Kicbase).is_some() {
        let kicbase = specs
            .iter()
            .find(|s| s.component == Component::Kicbase)
            .map(|s| s.resolve());
        profile.base_image = kicbase;
    }

    let cluster = MinikubeCluster::new(profile, settings.proxy.clone());
    let start_policy = RetryPolicy::new(
        settings.retry.start_max_attempts,
        Duration::from_secs(settings.retry.start_interval_secs),
    );

    if dryrun::is_dry_run() {
        dryrun::log_action(&format!(
            "minikube {}",
            cluster.profile.start_args().join(" ")
        ));
        return Ok(());
    }

    let report = crate::minikube::launch_with_retry(
        &start_policy,
        |_attempt| cluster.start_once(),
        || cluster.delete(),
    );

    if report.state == LaunchState::Failed {
        display_error_and_exit(MinikubeDevError::start_exhausted(
            &cluster.profile.name,
            report.start_attempts,
        ));
    }

    // Readiness is best-effort: warn on exhaustion and proceed
    let readiness_policy = RetryPolicy::new(
        settings.retry.readiness_attempts,
        Duration::from_secs(settings.retry.readiness_interval_secs),
    );
    let context = cluster.profile.name.clone();
    let ready = crate::minikube::poll_readiness(&readiness_policy, || {
        kubectl::nodes_ready(Some(&context))
    });

    if !ready {
        crate::log_warn!(
            "Nodes did not report Ready within {} poll attempts; continuing anyway",
            readiness_policy.max_attempts
        );
    }

    crate::log_info!("");
    crate::log_info!("==========================================");
    crate::log_info!("Cluster started successfully!");
    crate::log_info!("==========================================");
    crate::log_info!("");
    crate::log_info!("Profile: {}", cluster.profile.name);
    crate::log_info!("Start attempts: {}", report.start_attempts);
    crate::log_info!("");
    crate::log_info!("To use this cluster, run:");
    crate::log_info!("  kubectl --context {} get pods -A", cluster.profile.name);
    crate::log_info!("");

    Ok(())
}

/// Handle the stop command
pub fn stop(settings: &Settings, profile: Option<String>) -> Result<()> {
    let mut cluster_profile = ClusterProfile::from_settings(settings)?;
    if let Some(name) = profile {
        cluster_profile.name = name;
    }

    let cluster = MinikubeCluster::new(cluster_profile, settings.proxy.clone());

    dryrun::exec_unless_dry_run(
        &format!("minikube stop --profile {}", cluster.profile.name),
        || cluster.stop(),
    )?;

    crate::log_info!("Profile '{}' stopped", cluster.profile.name);
    Ok(())
}

/// Handle the delete command
pub fn delete(settings: &Settings, profile: Option<String>, yes: bool) -> Result<()> {
    let mut cluster_profile = ClusterProfile::from_settings(settings)?;
    if let Some(name) = profile {
        cluster_profile.name = name;
    }

    let cluster = MinikubeCluster::new(cluster_profile, settings.proxy.clone());

    if !cluster.exists()? {
        crate::log_warn!("Profile '{}' does not exist", cluster.profile.name);
        return Ok(());
    }

    if !yes
        && !crate::utils::confirm(&format!(
            "Are you sure you want to delete profile '{}'?",
            cluster.profile.name
        ))?
    {
        crate::log_info!("Deletion cancelled");
        return Ok(());
    }

    dryrun::exec_unless_dry_run(
        &format!("minikube delete --profile {}", cluster.profile.name),
        || cluster.delete(),
    )?;

    crate::log_info!("Profile '{}' deleted", cluster.profile.name);
    Ok(())
}

/// Handle the status command
pub fn status(settings: &Settings, profile: Option<String>) -> Result<()> {
    let mut cluster_profile = ClusterProfile::from_settings(settings)?;
    if let Some(name) = profile {
        cluster_profile.name = name;
    }

    let cluster = MinikubeCluster::new(cluster_profile, settings.proxy.clone());

    if !cluster.exists()? {
        display_error_and_exit(MinikubeDevError::profile_not_found(&cluster.profile.name));
    }

    println!("Profile: {}", cluster.profile.name);
    println!();
    println!("{}", cluster.status_output()?.trim_end());
    println!();

    match kubectl::get_nodes_wide(Some(&cluster.profile.name)) {
        Ok(nodes) => {
            println!("Nodes:");
            println!("{}", nodes.trim_end());
        }
        Err(e) => {
            crate::log_warn!("Could not query nodes: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_options_default() {
        let opts = StartOptions::default();
        assert!(opts.profile.is_none());
        assert!(!opts.skip_pull);
    }
}
