use std::path::PathBuf;

use color_eyre::Result;
use daybook_core::{
    clock::{Clock, SystemClock},
    storage::KeyValueStore,
    store::TaskStore,
};
use daybook_storage::file_store::FileStore;
use daybook_task::KvTaskStorage;
use dirs::data_dir;
use tracing::debug;

pub type Tasks<S, C = SystemClock> = TaskStore<KvTaskStorage<S>, C>;

/// Resolve the default data directory for Daybook.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("daybook"))
}

/// Data directory from config overrides, else the platform default.
pub fn data_dir_from_config(config: &crate::config::Config) -> Result<PathBuf> {
    match &config.data_dir {
        Some(root) => Ok(root.clone()),
        None => default_data_dir(),
    }
}

/// Build the file store using config overrides.
pub fn store_from_config(config: &crate::config::Config) -> Result<FileStore> {
    let root = data_dir_from_config(config)?;
    debug!(?root, "initializing file store");
    Ok(FileStore::new(root))
}

/// Loads the task store and runs the startup daily reset check.
pub fn open_tasks<S: KeyValueStore, C: Clock>(store: S, clock: C) -> Tasks<S, C> {
    let mut tasks = TaskStore::with_clock(KvTaskStorage::new(store), clock);
    tasks.check_daily_reset();
    tasks
}

/// Helper for tests to construct a store rooted at a temp dir.
#[cfg(test)]
pub fn test_store(root: impl Into<PathBuf>) -> FileStore {
    FileStore::new(root)
}
