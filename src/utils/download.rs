//! Binary download helpers for fresh-install

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;

use crate::utils::progress::DownloadProgress;

/// Download a release binary to `dest` and mark it executable.
///
/// Streams the response body straight to the destination file; partial
/// downloads are removed on failure so a retry starts clean.
pub fn download_binary(url: &str, dest: &Path) -> Result<()> {
    let progress = DownloadProgress::new(format!("Downloading {}", url));

    let result = fetch_to_file(url, dest);

    match &result {
        Ok(_) => progress.finish_with_message(format!("✓ Downloaded {}", dest.display())),
        Err(_) => {
            progress.finish();
            // Do not leave a truncated binary behind
            let _ = fs::remove_file(dest);
        }
    }

    result
}

fn fetch_to_file(url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut response = reqwest::blocking::get(url)
        .with_context(|| format!("Failed to request: {}", url))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Download failed with HTTP {}: {}",
            response.status(),
            url
        ));
    }

    let mut file = fs::File::create(dest)
        .with_context(|| format!("Failed to create file: {}", dest.display()))?;

    std::io::copy(&mut response, &mut file)
        .with_context(|| format!("Failed to write download to: {}", dest.display()))?;

    make_executable(dest)?;

    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .with_context(|| format!("Failed to stat: {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions on: {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Directory where downloaded binaries are installed
pub fn install_dir() -> Result<std::path::PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".minikube-dev").join("bin"))
}
