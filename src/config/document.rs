//! SSH config document structures

use serde::{Deserialize, Serialize};

/// Version tag written into generated config headers
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default SSH port, used when a host entry carries none
pub const DEFAULT_PORT: u16 = 22;

/// A single `Host` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEntry {
    /// Comment lines attached to this block, kept verbatim
    #[serde(default)]
    pub comments: Vec<String>,
    /// The `Host` alias
    pub name: String,
    /// Hostname or IP address
    #[serde(default)]
    pub host: String,
    /// SSH port (None means 22)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Login name
    #[serde(default)]
    pub user: String,
    /// Private key path as written in the config (may be empty)
    #[serde(default)]
    pub identity_file: String,
    /// Directives this model does not interpret, kept verbatim and in order
    #[serde(default)]
    pub other_configs: Vec<String>,
}

impl HostEntry {
    /// Create a host entry with the structured fields set
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        user: impl Into<String>,
        identity_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            user: user.into(),
            identity_file: identity_file.into(),
            ..Default::default()
        }
    }

    /// Set a non-default port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Port to connect to, falling back to 22
    pub fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) if port != 0 => port,
            _ => DEFAULT_PORT,
        }
    }

    /// Whether this entry references a private key
    pub fn has_identity_file(&self) -> bool {
        !self.identity_file.is_empty()
    }
}

/// A whole SSH config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Leading comment lines other than the version header
    #[serde(default)]
    pub comments: Vec<String>,
    /// Version of the tool that last wrote the file
    #[serde(default = "current_version")]
    pub version: String,
    /// Host blocks, kept sorted by name
    #[serde(default)]
    pub hosts: Vec<HostEntry>,
}

fn current_version() -> String {
    CURRENT_VERSION.to_string()
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDocument {
    /// Create an empty document tagged with the current version
    pub fn new() -> Self {
        Self {
            comments: Vec::new(),
            version: current_version(),
            hosts: Vec::new(),
        }
    }

    /// Whether any host is named `name`
    pub fn contains(&self, name: &str) -> bool {
        self.hosts.iter().any(|h| h.name == name)
    }

    /// First host named `name`
    pub fn get(&self, name: &str) -> Option<&HostEntry> {
        self.hosts.iter().find(|h| h.name == name)
    }

    /// Every host named `name`, in document order
    pub fn matching(&self, name: &str) -> Vec<HostEntry> {
        self.hosts.iter().filter(|h| h.name == name).cloned().collect()
    }

    /// Append hosts and restore name order
    pub fn extend_hosts(&mut self, hosts: impl IntoIterator<Item = HostEntry>) {
        self.hosts.extend(hosts);
        self.sort_hosts();
    }

    /// Sort hosts by name (ordinal, stable for duplicates)
    pub fn sort_hosts(&mut self) {
        self.hosts.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Number of hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Check if the document has no hosts
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Decode the JSON form stored in the bucket
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut doc: Self = serde_json::from_slice(bytes)?;
        doc.sort_hosts();
        Ok(doc)
    }

    /// Encode the JSON form stored in the bucket
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
