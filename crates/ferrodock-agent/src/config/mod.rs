//! Configuration loading for Ferrodock.
//! Reads the file given by `--config`, else the path in FERRODOCK_CONFIG, else
//! ferrodock.toml in the current directory.

use anyhow::Context;
use std::path::{Path, PathBuf};

use ferrodock_common::PipelineConfig;

pub const CONFIG_ENV: &str = "FERRODOCK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ferrodock.toml";

/// Where the configuration path came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    Default(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Flag(p) | Self::Env(p) | Self::Default(p) => p,
        }
    }

    /// Only the implicit default may be absent.
    fn required(&self) -> bool {
        !matches!(self, Self::Default(_))
    }
}

pub fn resolve(flag: Option<&Path>, env: Option<String>) -> ConfigSource {
    if let Some(path) = flag {
        return ConfigSource::Flag(path.to_path_buf());
    }
    match env.filter(|v| !v.trim().is_empty()) {
        Some(path) => ConfigSource::Env(PathBuf::from(path)),
        None => ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_FILE)),
    }
}

pub fn load_from(source: &ConfigSource) -> anyhow::Result<PipelineConfig> {
    let path = source.path();
    if !path.exists() {
        if source.required() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        tracing::warn!(
            "No {} found, using built-in defaults. Copy ferrodock.example.toml to {} to customise.",
            DEFAULT_CONFIG_FILE,
            DEFAULT_CONFIG_FILE
        );
        return Ok(PipelineConfig::default());
    }

    let config = PipelineConfig::from_path(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Resolve and load the configuration.
pub fn load(flag: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    load_from(&resolve(flag, std::env::var(CONFIG_ENV).ok()))
}
