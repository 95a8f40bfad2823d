//! Local SSH directory layout and config file persistence

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SshSyncError};

use super::{codec, ConfigDocument};

const SSH_DIR: &str = ".ssh";
const CONFIG_FILE: &str = "config";
const OSS_SETTINGS_FILE: &str = "ossconfig.json";

/// Where the local side of the sync lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshPaths {
    home: PathBuf,
}

impl SshPaths {
    /// Layout rooted at the current user's home directory
    pub fn discover() -> Result<Self> {
        dirs::home_dir()
            .map(Self::with_home)
            .ok_or(SshSyncError::NoHomeDir)
    }

    /// Layout rooted at an explicit home directory
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `~/.ssh`
    pub fn ssh_dir(&self) -> PathBuf {
        self.home.join(SSH_DIR)
    }

    /// `~/.ssh/config`
    pub fn config_file(&self) -> PathBuf {
        self.ssh_dir().join(CONFIG_FILE)
    }

    /// `~/.ssh/ossconfig.json`
    pub fn oss_settings_file(&self) -> PathBuf {
        self.ssh_dir().join(OSS_SETTINGS_FILE)
    }

    /// Resolve a path as written in a config file
    ///
    /// `~/` expands to the home directory, absolute paths are kept and
    /// anything else is taken relative to the current directory.
    pub fn resolve(&self, configured: &str) -> PathBuf {
        if configured == "~" {
            return self.home.clone();
        }
        if let Some(rest) = configured
            .strip_prefix("~/")
            .or_else(|| configured.strip_prefix("~\\"))
        {
            return self.home.join(rest);
        }

        let path = Path::new(configured);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    }
}

/// Create a directory (and parents) readable only by the owner
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}

/// Write a file and restrict it to owner read/write
pub fn write_private_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Load `~/.ssh/config`, or an empty document if it does not exist
pub fn load_local(paths: &SshPaths) -> Result<ConfigDocument> {
    let path = paths.config_file();

    if !path.exists() {
        return Ok(ConfigDocument::new());
    }

    let content = fs::read_to_string(&path)?;
    Ok(codec::parse(&content))
}

/// Serialize a document to `~/.ssh/config`
pub fn save_local(paths: &SshPaths, doc: &ConfigDocument) -> Result<()> {
    ensure_private_dir(&paths.ssh_dir())?;

    let content = codec::serialize(doc);
    write_private_file(&paths.config_file(), content.as_bytes())?;

    tracing::debug!("Wrote {} hosts to {}", doc.len(), paths.config_file().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostEntry;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_paths() {
        let paths = SshPaths::with_home("/home/alice");
        assert_eq!(paths.resolve("~/.ssh/id"), PathBuf::from("/home/alice/.ssh/id"));
        assert_eq!(paths.resolve("~"), PathBuf::from("/home/alice"));
        assert_eq!(paths.resolve("/etc/key"), PathBuf::from("/etc/key"));

        let relative = paths.resolve("keys/id");
        assert!(relative.is_absolute());
        assert!(relative.ends_with("keys/id"));
    }

    #[test]
    fn test_load_missing_config_is_empty() {
        let home = TempDir::new().unwrap();
        let paths = SshPaths::with_home(home.path());

        let doc = load_local(&paths).unwrap();
        assert!(doc.is_empty());
        assert!(!paths.config_file().exists());
    }

    #[test]
    fn test_save_then_load() {
        let home = TempDir::new().unwrap();
        let paths = SshPaths::with_home(home.path());

        let mut doc = ConfigDocument::new();
        doc.extend_hosts(vec![
            HostEntry::new("b", "hb", "u", ""),
            HostEntry::new("a", "ha", "u", "~/.ssh/a.pem"),
        ]);
        save_local(&paths, &doc).unwrap();

        let loaded = load_local(&paths).unwrap();
        assert_eq!(loaded.hosts, doc.hosts);

        let text = fs::read_to_string(paths.config_file()).unwrap();
        assert!(text.find("Host\ta").unwrap() < text.find("Host\tb").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_config_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let home = TempDir::new().unwrap();
        let paths = SshPaths::with_home(home.path());
        save_local(&paths, &ConfigDocument::new()).unwrap();

        let dir_mode = fs::metadata(paths.ssh_dir()).unwrap().permissions().mode();
        let file_mode = fs::metadata(paths.config_file()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
        assert_eq!(file_mode & 0o777, 0o600);
    }
}
