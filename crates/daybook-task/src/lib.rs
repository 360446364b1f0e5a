//! Storage adapter mapping the task collection, the daily reset marker and
//! the theme preference onto keys of a `KeyValueStore`.

use std::collections::HashSet;

use anyhow::{Context, Result};
use daybook_core::{
    storage::{KeyValueStore, StoreError},
    tasks::{Task, TaskPersistence},
};
use tracing::{instrument, warn};

pub const TASKS_KEY: &str = "todoTasks";
pub const RESET_MARKER_KEY: &str = "lastResetDate";
pub const THEME_KEY: &str = "ui-theme";

/// Task persistence backed by any `KeyValueStore`.
pub struct KvTaskStorage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> KvTaskStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_string(&self, key: &str) -> Result<Option<String>> {
        match self.store.get(key) {
            Ok(bytes) => Ok(Some(
                String::from_utf8(bytes).with_context(|| format!("{key} is not utf-8"))?,
            )),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(anyhow::anyhow!(err.to_string())),
        }
    }

    fn write_string(&self, key: &str, value: &str) -> Result<()> {
        self.store
            .put(key, value.as_bytes())
            .map_err(|e| anyhow::anyhow!(e.to_string()))
            .with_context(|| format!("failed to write {key}"))
    }

    /// Stored theme label, if any. Interpretation belongs to the caller.
    #[instrument(skip(self))]
    pub fn theme_preference(&self) -> Option<String> {
        match self.read_string(THEME_KEY) {
            Ok(theme) => theme,
            Err(err) => {
                warn!("failed to read theme preference: {err:#}");
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub fn save_theme_preference(&self, theme: &str) -> Result<()> {
        self.write_string(THEME_KEY, theme)
    }
}

impl<S: KeyValueStore> TaskPersistence for KvTaskStorage<S> {
    #[instrument(skip(self))]
    fn load_tasks(&self) -> Vec<Task> {
        let raw = match self.read_string(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("failed to load tasks: {err:#}");
                return Vec::new();
            }
        };
        match decode_tasks(&raw) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!("stored tasks are corrupt, starting empty: {err:#}");
                Vec::new()
            }
        }
    }

    #[instrument(skip_all, fields(count = tasks.len()))]
    fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks).context("failed to encode tasks")?;
        self.write_string(TASKS_KEY, &json)
    }

    #[instrument(skip(self))]
    fn load_reset_marker(&self) -> Option<String> {
        match self.read_string(RESET_MARKER_KEY) {
            Ok(marker) => marker,
            Err(err) => {
                warn!("failed to load reset marker: {err:#}");
                None
            }
        }
    }

    #[instrument(skip(self))]
    fn save_reset_marker(&self, marker: &str) -> Result<()> {
        self.write_string(RESET_MARKER_KEY, marker)
    }
}

/// Parses the stored array. `null` reads as empty; records with blank text
/// are dropped and repeated ids keep their first occurrence.
fn decode_tasks(raw: &str) -> Result<Vec<Task>> {
    let parsed: Option<Vec<Task>> = serde_json::from_str(raw).context("invalid task json")?;
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();
    for task in parsed.unwrap_or_default() {
        if task.text.trim().is_empty() {
            warn!(id = %task.id, "dropping stored task with blank text");
            continue;
        }
        if !seen.insert(task.id.clone()) {
            warn!(id = %task.id, "dropping stored task with duplicate id");
            continue;
        }
        tasks.push(task);
    }
    Ok(tasks)
}
