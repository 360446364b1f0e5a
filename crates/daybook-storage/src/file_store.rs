use std::{
    fs::{self, File},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use daybook_core::storage::{KeyValueStore, StoreError};
use tempfile::NamedTempFile;
use tracing::instrument;

/// File-backed store implementing the shared `KeyValueStore` contract.
/// One file per key under `root`; writes replace the file atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }
}

impl KeyValueStore for FileStore {
    #[instrument(skip_all, fields(key = %key))]
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        write_atomic(&path, value)
    }

    #[instrument(skip_all, fields(key = %key))]
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key);
        let mut file = File::open(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::NotFound {
                    key: key.to_string(),
                }
            } else {
                storage_err(err)
            }
        })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(storage_err)?;
        Ok(buf)
    }

    #[instrument(skip_all, fields(key = %key))]
    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_err(err)),
        }
    }
}

fn write_atomic(path: &Path, value: &[u8]) -> Result<(), StoreError> {
    let parent = path.parent().ok_or_else(|| StoreError::Storage {
        reason: "invalid storage path".to_string(),
    })?;
    fs::create_dir_all(parent).map_err(storage_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    tmp.write_all(value).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

/// File name for a key; base64url keeps path separators out.
fn sanitize_key(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key)
}

fn storage_err<E: ToString>(err: E) -> StoreError {
    StoreError::Storage {
        reason: err.to_string(),
    }
}
