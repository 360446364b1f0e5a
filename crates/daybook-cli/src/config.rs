use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use daybook_core::tasks::DEFAULT_CATEGORY;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::theme::Theme;

/// Categories offered by the input form when the config names none.
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Work", "Personal", "Home", "Shopping", "Health"];

/// User-level configuration loaded from `~/.config/daybook/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the data directory.
    pub data_dir: Option<PathBuf>,
    /// Theme used until one is toggled and persisted.
    pub theme: Option<Theme>,
    /// Preset category labels for new tasks.
    pub categories: Option<Vec<String>>,
}

impl Config {
    /// `None` followed by the configured presets, without blanks or repeats.
    pub fn category_choices(&self) -> Vec<String> {
        let presets: Vec<String> = match &self.categories {
            Some(list) => list.clone(),
            None => DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        };
        let mut choices = vec![DEFAULT_CATEGORY.to_string()];
        for label in presets {
            let label = label.trim().to_string();
            if !label.is_empty() && !choices.contains(&label) {
                choices.push(label);
            }
        }
        choices
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("daybook").join("config.toml"))
}

/// Write the config to the default path unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    let path = default_path()?;
    write_to_path_if_missing(config, &path)
}

fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}
