//! Object storage for the shared config
//!
//! This module provides:
//! - The `ObjectStore` seam the reconciler talks to
//! - The fixed object-key scheme under `appdata/sshconfig/`
//! - Bucket settings, an Aliyun OSS client and a directory-backed bucket

mod aliyun;
mod local;
mod settings;

use async_trait::async_trait;
use md5::{Digest, Md5};

use crate::error::Result;

pub use aliyun::OssClient;
pub use local::DirBucket;
pub use settings::OssSettings;

/// Prefix of every object this tool writes
pub const OBJECT_PREFIX: &str = "appdata/sshconfig/";

/// Object holding the JSON-encoded remote document
pub const CONFIG_OBJECT: &str = "appdata/sshconfig/config";

/// Page size used when probing for a single key
pub const LIST_PAGE_SIZE: usize = 100;

/// Digest naming the stored copy of an identity file
///
/// Hashes the configured path string, not the key material, so hosts that
/// share an `IdentityFile` value share one object.
pub fn identity_digest(identity_file: &str) -> String {
    hex::encode(Md5::digest(identity_file.as_bytes()))
}

/// Object key for an identity file
pub fn identity_object_key(identity_file: &str) -> String {
    format!("{}keys/{}", OBJECT_PREFIX, identity_digest(identity_file))
}

/// One page of a prefix listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Object keys in this page
    pub keys: Vec<String>,
    /// Marker for the next page, None when the listing is complete
    pub next_marker: Option<String>,
}

/// Remote bucket operations
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List keys starting with `prefix`, after `marker`
    async fn list(&self, prefix: &str, marker: Option<&str>, max_keys: usize)
        -> Result<ObjectPage>;

    /// Fetch an object; None if it does not exist
    async fn download(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store an object, replacing any previous value
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<()>;

    /// Check for an exact key by paging through a prefix listing
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut marker: Option<String> = None;
        loop {
            let page = self.list(key, marker.as_deref(), LIST_PAGE_SIZE).await?;
            if page.keys.iter().any(|k| k == key) {
                return Ok(true);
            }
            match page.next_marker {
                Some(next) if marker.as_deref() != Some(next.as_str()) => marker = Some(next),
                _ => return Ok(false),
            }
        }
    }
}
