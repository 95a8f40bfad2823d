//! Reconciliation between `~/.ssh/config` and the bucket
//!
//! `get` copies named hosts from the remote document into the local one and
//! fetches their identity files; `put` is the inverse. Neither operation is
//! atomic: identity files transferred before a failure stay where they are.

use crate::config::{
    ensure_private_dir, load_local, save_local, write_private_file, ConfigDocument, HostEntry,
    SshPaths,
};
use crate::error::{Result, SshSyncError};
use crate::oss::{identity_digest, identity_object_key, ObjectStore, CONFIG_OBJECT};

/// Result of a `get` or `put`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Hosts were copied
    Synced,
    /// The destination already has a host with this name
    AlreadyExists,
    /// The source has no host with this name
    NotFound,
}

impl SyncOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Synced => 0,
            Self::AlreadyExists => 1,
            Self::NotFound => 2,
        }
    }
}

/// Whether a missing local identity file aborts an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingKey {
    Fail,
    Skip,
}

/// Moves host entries and identity files between the two sides
pub struct Reconciler<'a> {
    store: &'a dyn ObjectStore,
    paths: &'a SshPaths,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn ObjectStore, paths: &'a SshPaths) -> Self {
        Self { store, paths }
    }

    /// Load the `(local, remote)` pair, seeding the bucket on first use
    ///
    /// If the remote document does not exist yet, the local document becomes
    /// the remote one and every referenced identity file is uploaded.
    pub async fn load(&self) -> Result<(ConfigDocument, ConfigDocument)> {
        let local = load_local(self.paths)?;

        let remote = if self.store.exists(CONFIG_OBJECT).await? {
            tracing::info!("Reading remote config");
            let bytes = self.store.download(CONFIG_OBJECT).await?.ok_or_else(|| {
                SshSyncError::storage("NoSuchKey", format!("{} vanished while reading", CONFIG_OBJECT))
            })?;
            ConfigDocument::from_json(&bytes).map_err(SshSyncError::RemoteDocument)?
        } else {
            tracing::info!("No remote config yet, seeding it from {}", self.paths.config_file().display());
            let remote = local.clone();
            for host in &remote.hosts {
                self.publish_identity(host, MissingKey::Skip).await?;
            }
            self.upload_document(&remote).await?;
            remote
        };

        Ok((local, remote))
    }

    /// Copy every remote host named `name` into `local` and write it out
    pub async fn get(
        &self,
        remote: &ConfigDocument,
        local: &mut ConfigDocument,
        name: &str,
    ) -> Result<SyncOutcome> {
        if local.contains(name) {
            return Ok(SyncOutcome::AlreadyExists);
        }

        let found = remote.matching(name);
        if found.is_empty() {
            return Ok(SyncOutcome::NotFound);
        }

        local.extend_hosts(found.iter().cloned());
        for host in &found {
            self.fetch_identity(host).await?;
        }

        save_local(self.paths, local)?;
        Ok(SyncOutcome::Synced)
    }

    /// Copy every local host named `name` into `remote` and upload it
    pub async fn put(
        &self,
        local: &ConfigDocument,
        remote: &mut ConfigDocument,
        name: &str,
    ) -> Result<SyncOutcome> {
        if remote.contains(name) {
            return Ok(SyncOutcome::AlreadyExists);
        }

        let found = local.matching(name);
        if found.is_empty() {
            return Ok(SyncOutcome::NotFound);
        }

        remote.extend_hosts(found.iter().cloned());
        for host in &found {
            self.publish_identity(host, MissingKey::Fail).await?;
        }

        self.upload_document(remote).await?;
        Ok(SyncOutcome::Synced)
    }

    /// Download a host's identity file unless it is already present locally
    async fn fetch_identity(&self, host: &HostEntry) -> Result<()> {
        if !host.has_identity_file() {
            return Ok(());
        }

        let path = self.paths.resolve(&host.identity_file);
        if path.exists() {
            tracing::debug!("{}: {} already present", host.name, path.display());
            return Ok(());
        }

        let digest = identity_digest(&host.identity_file);
        tracing::info!("{}: downloading identity file {}", host.name, digest);

        match self.store.download(&identity_object_key(&host.identity_file)).await? {
            Some(bytes) => {
                if let Some(parent) = path.parent() {
                    ensure_private_dir(parent)?;
                }
                write_private_file(&path, &bytes)?;
                tracing::info!("{}: wrote {}", host.name, path.display());
            }
            None => {
                tracing::warn!(
                    "{}: identity file {} is not in the bucket, skipping",
                    host.name,
                    digest
                );
            }
        }
        Ok(())
    }

    /// Upload a host's identity file unless the bucket already has it
    async fn publish_identity(&self, host: &HostEntry, missing: MissingKey) -> Result<()> {
        if !host.has_identity_file() {
            return Ok(());
        }

        let key = identity_object_key(&host.identity_file);
        if self.store.exists(&key).await? {
            tracing::debug!("{}: {} already in bucket", host.name, key);
            return Ok(());
        }

        let path = self.paths.resolve(&host.identity_file);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if missing == MissingKey::Skip => {
                tracing::warn!("{}: cannot read {} ({}), skipping", host.name, path.display(), e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "{}: uploading identity file {}",
            host.name,
            identity_digest(&host.identity_file)
        );
        self.store.upload(&key, data).await
    }

    async fn upload_document(&self, remote: &ConfigDocument) -> Result<()> {
        tracing::info!("Uploading remote config ({} hosts)", remote.len());
        self.store.upload(CONFIG_OBJECT, remote.to_json()?).await
    }
}
