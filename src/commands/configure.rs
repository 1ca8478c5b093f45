//! Configuration command implementations
//!
//! Each subcommand loads the persisted settings, applies the requested
//! change, and writes the file back.

use anyhow::Result;

use crate::config::settings::{ImageOverrides, Settings};

/// Persist per-component image override URLs
pub fn images(cli_overrides: &ImageOverrides) -> Result<()> {
    update_settings(|settings| {
        settings.images.merge(cli_overrides);
    })
}

/// Persist insecure registry entries
pub fn registry(insecure: Vec<String>, clear: bool) -> Result<()> {
    update_settings(|settings| {
        if clear {
            settings.registry.insecure.clear();
        }
        for entry in insecure {
            if !settings.registry.insecure.contains(&entry) {
                settings.registry.insecure.push(entry);
            }
        }
    })
}

/// Persist registry mirror entries
pub fn mirror(mirrors: Vec<String>, clear: bool) -> Result<()> {
    update_settings(|settings| {
        if clear {
            settings.registry.mirrors.clear();
        }
        for entry in mirrors {
            if !settings.registry.mirrors.contains(&entry) {
                settings.registry.mirrors.push(entry);
            }
        }
    })
}

/// Persist proxy settings; empty strings clear the corresponding entry
pub fn proxy(
    http: Option<String>,
    https: Option<String>,
    no_proxy: Option<String>,
) -> Result<()> {
    update_settings(|settings| {
        if let Some(value) = http {
            settings.proxy.http_proxy = non_empty(value);
        }
        if let Some(value) = https {
            settings.proxy.https_proxy = non_empty(value);
        }
        if let Some(value) = no_proxy {
            settings.proxy.no_proxy = non_empty(value);
        }
    })
}

/// Print an example configuration file
pub fn show_example() -> Result<()> {
    print!("{}", Settings::example_config());
    Ok(())
}

fn update_settings<F>(apply: F) -> Result<()>
where
    F: FnOnce(&mut Settings),
{
    let path = Settings::persist_path()?;
    let mut settings = if path.exists() {
        Settings::load_from_file(&path)?
    } else {
        Settings::default()
    };

    apply(&mut settings);
    settings.save(&path)?;

    crate::log_info!("Configuration written to {}", path.display());
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::images::Component;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }

    #[test]
    fn test_override_merge_into_settings() {
        let mut settings = Settings::default();
        let mut cli = ImageOverrides::default();
        cli.set(Component::Etcd, Some("mirror.corp/etcd:x".to_string()));

        settings.images.merge(&cli);
        assert_eq!(settings.images.get(Component::Etcd), Some("mirror.corp/etcd:x"));
    }
}
