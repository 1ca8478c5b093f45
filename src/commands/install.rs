//! Binary installation commands: fresh-install and setup-docker

use anyhow::Result;
use std::env::consts::{ARCH, OS};

use crate::config::settings::Settings;
use crate::utils::errors::{MinikubeDevError, display_error_and_exit};
use crate::utils::{download, dryrun};

/// Map the build target to the release artifact platform suffix
pub fn platform_suffix() -> (&'static str, &'static str) {
    let os = match OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };
    (os, arch)
}

/// Download URL for the minikube binary
pub fn minikube_url(settings: &Settings) -> String {
    let (os, arch) = platform_suffix();
    let version = &settings.versions.minikube;

    match &settings.mirrors.minikube_base {
        Some(base) => format!(
            "{}/{}/minikube-{}-{}",
            base.trim_end_matches('/'),
            version,
            os,
            arch
        ),
        None => format!(
            "https://github.com/kubernetes/minikube/releases/download/{}/minikube-{}-{}",
            version, os, arch
        ),
    }
}

/// Download URL for the kubectl binary
pub fn kubectl_url(settings: &Settings) -> String {
    let (os, arch) = platform_suffix();
    let version = &settings.versions.kubectl;

    match &settings.mirrors.kubectl_base {
        Some(base) => format!(
            "{}/{}/bin/{}/{}/kubectl",
            base.trim_end_matches('/'),
            version,
            os,
            arch
        ),
        None => format!(
            "https://dl.k8s.io/release/{}/bin/{}/{}/kubectl",
            version, os, arch
        ),
    }
}

/// Handle fresh-install: verify Docker, then install minikube and kubectl
pub fn fresh_install(settings: &Settings, force: bool) -> Result<()> {
    // Docker is the one prerequisite this command cannot provide
    if which::which("docker").is_err() {
        display_error_and_exit(MinikubeDevError::docker_not_found());
    }
    crate::log_info!("Docker found");

    let install_dir = download::install_dir()?;

    for (tool, url) in [
        ("minikube", minikube_url(settings)),
        ("kubectl", kubectl_url(settings)),
    ] {
        if !force && which::which(tool).is_ok() {
            crate::log_info!("{} already installed, skipping (use --force to reinstall)", tool);
            continue;
        }

        let dest = install_dir.join(tool);

        if dryrun::is_dry_run() {
            dryrun::log_action(&format!("download {} -> {}", url, dest.display()));
            continue;
        }

        if let Err(e) = download::download_binary(&url, &dest) {
            crate::log_error!("{}", e);
            display_error_and_exit(MinikubeDevError::download_failed(tool, &url));
        }

        crate::log_info!("{} installed to {}", tool, dest.display());
    }

    // Nothing was installed in a dry run, so no completion banner
    if dryrun::is_dry_run() {
        return Ok(());
    }

    crate::log_info!("");
    crate::log_info!("==========================================");
    crate::log_info!("Fresh install completed!");
    crate::log_info!("==========================================");
    crate::log_info!("");
    crate::log_info!("Add the install directory to your PATH:");
    crate::log_info!("  export PATH=\"{}:$PATH\"", install_dir.display());
    crate::log_info!("");
    crate::log_info!("Then start a cluster with:");
    crate::log_info!("  minikube-dev start");
    crate::log_info!("");

    Ok(())
}

/// Handle setup-docker: check for Docker and print installation guidance.
/// OS package installation itself is out of scope.
pub fn setup_docker() -> Result<()> {
    if which::which("docker").is_ok() {
        crate::log_info!("Docker is already installed");

        match crate::utils::Docker::detect()?.info() {
            Ok(info) => {
                // First lines carry the client/daemon summary
                for line in info.lines().take(8) {
                    println!("  {}", line);
                }
            }
            Err(e) => {
                crate::log_warn!("Docker CLI found but daemon not reachable: {}", e);
                crate::log_warn!("Start the daemon, e.g.: sudo systemctl start docker");
            }
        }

        return Ok(());
    }

    crate::log_warn!("Docker is not installed");
    println!();
    println!("Install Docker for your platform:");
    println!("  Linux:   https://docs.docker.com/engine/install/");
    println!("           e.g. Debian/Ubuntu: sudo apt-get install docker.io");
    println!("  macOS:   https://docs.docker.com/desktop/setup/install/mac-install/");
    println!("  Windows: https://docs.docker.com/desktop/setup/install/windows-install/");
    println!();
    println!("After installing, add yourself to the docker group:");
    println!("  sudo usermod -aG docker $USER");
    println!();
    println!("Then re-run: minikube-dev setup-docker");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_suffix_known_values() {
        let (os, arch) = platform_suffix();
        assert!(["linux", "darwin", "windows"].contains(&os));
        assert!(["amd64", "arm64"].contains(&arch) || !arch.is_empty());
    }

    #[test]
    fn test_minikube_url_default() {
        let settings = Settings::default();
        let url = minikube_url(&settings);
        assert!(url.starts_with("https://github.com/kubernetes/minikube/releases/download/"));
        assert!(url.contains(&settings.versions.minikube));
    }

    #[test]
    fn test_minikube_url_mirror() {
        let mut settings = Settings::default();
        settings.mirrors.minikube_base = Some("https://mirror.corp/minikube/".to_string());

        let url = minikube_url(&settings);
        assert!(url.starts_with("https://mirror.corp/minikube/"));
        // no double slash from the trailing slash in the base
        assert!(!url.contains("//v"));
    }

    #[test]
    fn test_kubectl_url_default() {
        let settings = Settings::default();
        let url = kubectl_url(&settings);
        assert!(url.starts_with("https://dl.k8s.io/release/"));
        assert!(url.ends_with("/kubectl"));
    }

    #[test]
    fn test_kubectl_url_mirror() {
        let mut settings = Settings::default();
        settings.mirrors.kubectl_base = Some("https://mirror.corp/k8s".to_string());

        let url = kubectl_url(&settings);
        assert!(url.starts_with("https://mirror.corp/k8s/"));
        assert!(url.ends_with("/kubectl"));
    }
}
