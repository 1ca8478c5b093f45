//! Diagnostics command: collect and print environment status

use anyhow::Result;
use colored::Colorize;

use crate::config::settings::Settings;
use crate::minikube::{ClusterProfile, MinikubeCluster, kubectl};
use crate::utils::{CommonPrereqs, Docker, Prerequisite};

/// Handle the troubleshoot command. Every section is best-effort; a
/// failing collector prints what went wrong and moves on.
pub fn run(settings: &Settings, profile: Option<String>) -> Result<()> {
    let mut cluster_profile = ClusterProfile::from_settings(settings)?;
    if let Some(name) = profile {
        cluster_profile.name = name;
    }
    let cluster = MinikubeCluster::new(cluster_profile, settings.proxy.clone());

    section("Prerequisites");
    print_prereqs();

    section("Minikube profiles");
    match MinikubeCluster::list_profiles() {
        Ok(profiles) if profiles.is_empty() => println!("  (none)"),
        Ok(profiles) => {
            for p in profiles {
                println!("  - {}", p);
            }
        }
        Err(e) => println!("  error: {}", e),
    }

    section(&format!("Status for profile '{}'", cluster.profile.name));
    match cluster.status_output() {
        Ok(status) if status.trim().is_empty() => println!("  (no status output)"),
        Ok(status) => print_indented(&status),
        Err(e) => println!("  error: {}", e),
    }

    section("Docker");
    match Docker::detect().and_then(|d| d.info()) {
        Ok(info) => {
            // The summary lines are enough for diagnostics
            for line in info.lines().take(15) {
                println!("  {}", line);
            }
        }
        Err(e) => println!("  error: {}", e),
    }

    section("Nodes");
    match kubectl::get_nodes_wide(Some(&cluster.profile.name)) {
        Ok(nodes) => print_indented(&nodes),
        Err(e) => println!("  error: {}", e),
    }

    section("Recent minikube logs");
    match cluster.recent_logs() {
        Ok(logs) if logs.trim().is_empty() => println!("  (no logs)"),
        Ok(logs) => print_indented(&logs),
        Err(e) => println!("  error: {}", e),
    }

    println!();
    Ok(())
}

fn print_prereqs() {
    let docker = CommonPrereqs::docker();
    let minikube = CommonPrereqs::minikube();
    let kubectl_prereq = CommonPrereqs::kubectl();
    let prereqs: Vec<&dyn Prerequisite> = vec![&docker, &minikube, &kubectl_prereq];

    let (found, missing) = CommonPrereqs::check_all(&prereqs);
    for name in found {
        println!("  {} {}", "✓".green(), name);
    }
    for (name, hint) in missing {
        println!("  {} {} ({})", "✗".red(), name, hint);
    }
}

fn section(title: &str) {
    println!();
    println!("{}", format!("=== {} ===", title).cyan().bold());
}

fn print_indented(text: &str) {
    for line in text.trim_end().lines() {
        println!("  {}", line);
    }
}
