mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./stagehand.toml",
        "~/.config/stagehand/config.toml",
        "/etc/stagehand/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let threshold = config.classifier.threshold;
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("Classifier threshold must be within [0, 1], got {}", threshold);
    }

    for media_type in config.enabled_types() {
        let Some(library) = config.library(media_type) else {
            continue;
        };
        if library.upload_dir.as_os_str().is_empty() {
            anyhow::bail!("Library '{}' is enabled but has no upload_dir", media_type);
        }
        if !library.upload_dir.exists() {
            tracing::warn!("Upload directory for {} does not exist: {:?}", media_type, library.upload_dir);
        }
        if let Some(ref library_dir) = library.library_dir {
            if !library_dir.exists() {
                tracing::warn!("Library directory for {} does not exist: {:?}", media_type, library_dir);
            }
        }
    }

    Ok(())
}
