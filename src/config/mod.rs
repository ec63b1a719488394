pub mod persist;
mod types;

pub use types::*;

use crate::matcher::Normalizer;
use crate::merge::{MergeSettings, OutputPlacement};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Locations searched, in order, when no config path is given.
const DEFAULT_PATHS: &[&str] = &[
    "./avmerge.toml",
    "~/.config/avmerge/config.toml",
    "~/.avmerge.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config).with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// First existing default config file, if any
pub fn find_default_config() -> Option<PathBuf> {
    DEFAULT_PATHS
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
        .find(|p| p.exists())
}

/// Where `--save` writes when no config path is given
pub fn default_save_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.config/avmerge/config.toml").as_ref())
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match find_default_config() {
        Some(path) => {
            tracing::debug!("Using config file {:?}", path);
            load_config(&path)
        }
        None => Ok(Config::default()),
    }
}

/// Load config for a command that writes it back afterwards.
///
/// An explicit path that does not exist yet starts from the defaults so the
/// save can create it; any other read or parse failure is still an error.
pub fn load_config_or_default_for_save(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        if let Err(e) = std::fs::metadata(path) {
            if e.kind() == std::io::ErrorKind::NotFound {
                tracing::debug!("Config file {:?} does not exist yet; using defaults", path);
                return Ok(Config::default());
            }
        }
    }
    load_config_or_default(custom_path)
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let threshold = config.matching.threshold;
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("matching.threshold must be between 0.0 and 1.0, got {}", threshold);
    }

    if config.merge.max_workers == 0 {
        anyhow::bail!("merge.max_workers must be at least 1");
    }

    if config.merge.video_codec.trim().is_empty() || config.merge.audio_codec.trim().is_empty() {
        anyhow::bail!("merge codecs must not be empty");
    }

    Normalizer::new(config.matching.normalize.clone())?;

    if let Some(dir) = &config.scan.source_dir {
        if !dir.is_dir() {
            tracing::warn!("Configured source directory does not exist: {:?}", dir);
        }
    }

    Ok(())
}

impl Config {
    /// Normalizer built from the matching options.
    pub fn normalizer(&self) -> Result<Normalizer> {
        Ok(Normalizer::new(self.matching.normalize.clone())?)
    }

    /// Runner settings for a resolved merge tool.
    pub fn merge_settings(&self, tool_path: PathBuf) -> MergeSettings {
        let merge = &self.merge;
        let mut settings = MergeSettings::new(tool_path);
        settings.probe_path = self.tools.ffprobe.clone();
        settings.placement = match &merge.output_dir {
            Some(dir) => OutputPlacement::Directory(dir.clone()),
            None => OutputPlacement::BesideSource,
        };
        settings.suffix = merge.suffix.clone();
        settings.overwrite = merge.overwrite;
        settings.max_workers = merge.max_workers;
        settings.video_codec = merge.video_codec.clone();
        settings.audio_codec = merge.audio_codec.clone();
        settings.shortest = merge.shortest;
        settings.probe_timeout = Duration::from_secs(merge.probe_timeout_secs);
        settings.stall_timeout =
            (merge.stall_timeout_secs > 0).then(|| Duration::from_secs(merge.stall_timeout_secs));
        settings.cancel_grace = Duration::from_secs(merge.cancel_grace_secs);
        settings.diagnostic_lines = merge.diagnostic_lines;
        settings
    }
}
