//! Bucket credentials and location

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::config::ensure_private_dir;
use crate::error::{Result, SshSyncError};

/// Settings needed to reach the OSS bucket
///
/// Stored as JSON (`accessKeyId`, `accessKeySecret`, `bucket`, `region`).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[serde(rename_all = "camelCase")]
pub struct OssSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Drop for OssSettings {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl std::fmt::Debug for OssSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OssSettings")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &self.access_key_secret.as_ref().map(|_| "***"))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

impl OssSettings {
    /// Read settings from a JSON file; None if the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read(path)?;
        let settings = serde_json::from_slice(&content).map_err(|e| {
            SshSyncError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        Ok(Some(settings))
    }

    /// Write settings to a JSON file, owner-readable only
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            ensure_private_dir(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        crate::config::write_private_file(path, &json)
    }

    /// Overlay the values that are set in `overrides`
    pub fn apply(&mut self, mut overrides: OssSettings) {
        if overrides.access_key_id.is_some() {
            self.access_key_id = overrides.access_key_id.take();
        }
        if overrides.access_key_secret.is_some() {
            self.access_key_secret = overrides.access_key_secret.take();
        }
        if overrides.bucket.is_some() {
            self.bucket = overrides.bucket.take();
        }
        if overrides.region.is_some() {
            self.region = overrides.region.take();
        }
    }

    /// Check every field needed to build a client is present
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("accessKeyId", &self.access_key_id),
            ("accessKeySecret", &self.access_key_secret),
            ("bucket", &self.bucket),
            ("region", &self.region),
        ]
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SshSyncError::InvalidConfig(format!(
                "missing OSS settings: {}",
                missing.join(", ")
            )))
        }
    }
}
