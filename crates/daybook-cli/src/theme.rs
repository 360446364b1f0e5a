use color_eyre::Result;
use daybook_core::storage::KeyValueStore;
use daybook_task::KvTaskStorage;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{cli::ThemeChoice, config::Config, storage};

/// Light or dark palette, persisted under the `ui-theme` key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Persisted preference first, then the config default, then light.
pub fn resolve<S: KeyValueStore>(storage: &KvTaskStorage<S>, config: &Config) -> Theme {
    if let Some(stored) = storage.theme_preference() {
        match Theme::parse(&stored) {
            Some(theme) => return theme,
            None => warn!(stored = %stored, "ignoring unknown theme preference"),
        }
    }
    config.theme.unwrap_or_default()
}

pub fn save<S: KeyValueStore>(storage: &KvTaskStorage<S>, theme: Theme) {
    if let Err(err) = storage.save_theme_preference(theme.label()) {
        warn!("failed to save theme preference: {err:#}");
    }
}

/// Applies a theme choice and returns the theme now in effect.
pub fn apply<S: KeyValueStore>(
    storage: &KvTaskStorage<S>,
    config: &Config,
    choice: Option<ThemeChoice>,
) -> Theme {
    let current = resolve(storage, config);
    let next = match choice {
        None => return current,
        Some(ThemeChoice::Light) => Theme::Light,
        Some(ThemeChoice::Dark) => Theme::Dark,
        Some(ThemeChoice::Toggle) => current.toggled(),
    };
    save(storage, next);
    next
}

pub fn handle(choice: Option<ThemeChoice>, config: &Config) -> Result<()> {
    let storage = KvTaskStorage::new(storage::store_from_config(config)?);
    let theme = apply(&storage, config, choice);
    println!("Theme: {}", theme.label());
    Ok(())
}
