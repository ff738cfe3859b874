//! File-backed state store
//!
//! One JSON file per key under a data directory. File names are the
//! hex-encoded key so any key maps to a portable name; long keys are split
//! into nested directories to stay under filesystem name limits.
//!
//! Writes go to a sibling `.tmp` file that is synced and then renamed over
//! the record, so a reader sees either the old record or the new one. The
//! parent directory is synced after every rename and removal, so an
//! acknowledged write or clear survives a crash.

use crate::store::StateStore;
use async_trait::async_trait;
use smartcache_core::{EntityKey, EntityState, Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Maximum hex characters in one path component
const PATH_COMPONENT_HEX_CHARS_MAX: usize = 200;

/// Record file extension
const RECORD_EXTENSION: &str = "json";

/// File-backed store rooted at a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| Error::Internal {
                reason: format!("create data dir {}: {}", root.display(), e),
            })?;
        debug!(root = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    /// Root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `key`
    fn record_path(&self, key: &EntityKey) -> PathBuf {
        let encoded = hex::encode(key.as_str().as_bytes());
        let mut path = self.root.clone();
        let mut rest = encoded.as_str();

        while rest.len() > PATH_COMPONENT_HEX_CHARS_MAX {
            let (head, tail) = rest.split_at(PATH_COMPONENT_HEX_CHARS_MAX);
            path.push(head);
            rest = tail;
        }
        path.push(format!("{}.{}", rest, RECORD_EXTENSION));
        path
    }
}

#[async_trait]
impl StateStore for FileStore {
    #[instrument(skip(self), fields(key = %key))]
    async fn read(&self, key: &EntityKey) -> Result<Option<EntityState>> {
        let path = self.record_path(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                let state = EntityState::from_json(&bytes)
                    .map_err(|e| Error::storage_read_failed(key.as_str(), e.to_string()))?;
                Ok(Some(state))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage_read_failed(key.as_str(), e.to_string())),
        }
    }

    #[instrument(skip(self, state), fields(key = %key, breached = state.breached))]
    async fn write(&self, key: &EntityKey, state: &EntityState) -> Result<()> {
        let path = self.record_path(key);
        let tmp_path = path.with_extension("tmp");
        let bytes = state.to_json()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::storage_write_failed(key.as_str(), e.to_string()))?;
        }

        let write_result = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp_path, &path).await?;
            sync_parent(&path).await
        }
        .await;

        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(Error::storage_write_failed(key.as_str(), e.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn clear(&self, key: &EntityKey) -> Result<()> {
        let path = self.record_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => sync_parent(&path)
                .await
                .map_err(|e| Error::storage_clear_failed(key.as_str(), e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage_clear_failed(key.as_str(), e.to_string())),
        }
    }
}

/// Flush the directory entry for `path` to disk
#[cfg(unix)]
async fn sync_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => fs::File::open(parent).await?.sync_all().await,
        None => Ok(()),
    }
}

/// Directory handles cannot be synced here; the file sync is the barrier
#[cfg(not(unix))]
async fn sync_parent(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
