//! Directory-backed bucket
//!
//! Object keys map to relative paths under a root directory. Used for
//! offline syncing (e.g. through a shared mount) and in tests.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{ObjectPage, ObjectStore};
use crate::error::{Result, SshSyncError};

fn list_failed(e: std::io::Error) -> SshSyncError {
    SshSyncError::storage("ListFailed", e.to_string())
}

pub struct DirBucket {
    root: PathBuf,
}

impl DirBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(SshSyncError::storage(
                "InvalidObjectName",
                format!("object key '{}' is not a plain relative path", key),
            ));
        }
        Ok(self.root.join(relative))
    }

    /// Every stored key, sorted
    async fn all_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if !self.root.exists() {
            return Ok(keys);
        }

        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(list_failed)?;
            while let Some(entry) = entries.next_entry().await.map_err(list_failed)? {
                let path = entry.path();
                if entry.file_type().await.map_err(list_failed)?.is_dir() {
                    pending.push(path);
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&self.root) {
                    let key: Vec<String> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    keys.push(key.join("/"));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl ObjectStore for DirBucket {
    async fn list(
        &self,
        prefix: &str,
        marker: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage> {
        let mut matching = self
            .all_keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| marker.map_or(true, |m| key.as_str() > m));

        let keys: Vec<String> = matching.by_ref().take(max_keys.max(1)).collect();
        let next_marker = match matching.next() {
            Some(_) => keys.last().cloned(),
            None => None,
        };
        Ok(ObjectPage { keys, next_marker })
    }

    async fn download(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SshSyncError::storage("ReadFailed", e.to_string())),
        }
    }

    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SshSyncError::storage("WriteFailed", e.to_string()))?;
        }
        fs::write(&path, data)
            .await
            .map_err(|e| SshSyncError::storage("WriteFailed", e.to_string()))
    }
}
