//! Named-blob persistence for the store's state.
//!
//! The store only needs get/set/remove of one JSON blob by name. Two backends
//! are provided: an in-memory map and a directory of JSON files written with
//! file locking and atomic renames.

use crate::{Error, PersistedState, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Async key-value store of text blobs
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob; `None` if it was never written
    async fn get(&self, name: &str) -> Result<Option<String>>;
    async fn set(&self, name: &str, value: &str) -> Result<()>;
    /// Removing a missing blob is not an error
    async fn remove(&self, name: &str) -> Result<()>;
}

/// In-process blob store, mostly for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.blobs
            .lock()
            .map_err(|_| Error::Persistence("memory blob store lock poisoned".into()))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(name).cloned())
    }

    async fn set(&self, name: &str, value: &str) -> Result<()> {
        self.lock()?.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.lock()?.remove(name);
        Ok(())
    }
}

/// Directory of `<name>.json` files
///
/// Writes go to a temp file in the same directory under an exclusive lock and
/// are renamed over the target; reads take a shared lock.
#[derive(Clone, Debug)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing blob `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    fn read_blob(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        Ok(Some(contents))
    }

    fn write_blob(dir: &Path, path: &Path, value: &str) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let temp = NamedTempFile::new_in(dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        Self::read_blob(&self.path_for(name))
    }

    async fn set(&self, name: &str, value: &str) -> Result<()> {
        let path = self.path_for(name);
        Self::write_blob(&self.dir, &path, value)?;
        tracing::debug!("Saved blob {} to {:?}", name, path);
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Load persisted state from blob `name`
///
/// A missing blob yields the default state. An unreadable or corrupt blob is
/// logged and also yields the default state.
pub async fn load_state<B: BlobStore + ?Sized>(blobs: &B, name: &str) -> PersistedState {
    let text = match blobs.get(name).await {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::info!("No saved state '{}', starting empty", name);
            return PersistedState::default();
        }
        Err(e) => {
            tracing::warn!("Unable to read saved state '{}': {}. Using defaults.", name, e);
            return PersistedState::default();
        }
    };

    match serde_json::from_str::<PersistedState>(&text) {
        Ok(state) => {
            tracing::debug!("Loaded saved state '{}'", name);
            state
        }
        Err(e) => {
            tracing::warn!("Failed to parse saved state '{}': {}. Using defaults.", name, e);
            PersistedState::default()
        }
    }
}

/// Write the whole persisted state to blob `name` as compact JSON
pub async fn save_state<B: BlobStore + ?Sized>(
    blobs: &B,
    name: &str,
    state: &PersistedState,
) -> Result<()> {
    let contents = serde_json::to_string(state)?;
    blobs.set(name, &contents).await
}
