//! CLI command implementations

pub mod check;
pub mod get;
pub mod put;
pub mod show;

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::config::SshPaths;
use crate::error::{Result, SshSyncError};
use crate::oss::{DirBucket, ObjectStore, OssClient, OssSettings};
use crate::sync::SyncOutcome;

/// Bucket selection and credentials shared by every command
#[derive(Debug, Clone, Default, Args)]
pub struct BucketOptions {
    /// OSS settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub oss_config: Option<PathBuf>,

    /// OSS accessKeyId
    #[arg(long, global = true)]
    pub access_key_id: Option<String>,

    /// OSS accessKeySecret
    #[arg(long, global = true)]
    pub access_key_secret: Option<String>,

    /// OSS bucket
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// OSS region, e.g. oss-cn-shanghai
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Use a local directory as the bucket instead of OSS
    #[arg(long, global = true, value_name = "DIR")]
    pub bucket_dir: Option<PathBuf>,
}

impl BucketOptions {
    /// Settings file in use (`--oss-config` or `~/.ssh/ossconfig.json`)
    pub fn settings_path(&self, paths: &SshPaths) -> PathBuf {
        match &self.oss_config {
            Some(path) => paths.resolve(&path.to_string_lossy()),
            None => paths.oss_settings_file(),
        }
    }

    /// Settings file values overlaid with the command-line flags
    pub fn settings(&self, paths: &SshPaths) -> Result<OssSettings> {
        let mut settings = OssSettings::load(&self.settings_path(paths))?.unwrap_or_default();

        let mut overrides = OssSettings::default();
        overrides.access_key_id = self.access_key_id.clone();
        overrides.access_key_secret = self.access_key_secret.clone();
        overrides.bucket = self.bucket.clone();
        overrides.region = self.region.clone();
        settings.apply(overrides);

        Ok(settings)
    }

    /// Build the object store these options select
    pub fn open_store(&self, paths: &SshPaths) -> Result<Box<dyn ObjectStore>> {
        if let Some(dir) = &self.bucket_dir {
            tracing::debug!("Using directory bucket at {}", dir.display());
            return Ok(Box::new(DirBucket::new(dir.clone())));
        }

        let mut settings = self.settings(paths)?;
        prompt_missing_secret(&mut settings)?;
        Ok(Box::new(OssClient::new(&settings)?))
    }
}

/// Ask for the secret on a terminal when neither file nor flags gave one
fn prompt_missing_secret(settings: &mut OssSettings) -> Result<()> {
    let missing = settings
        .access_key_secret
        .as_deref()
        .map_or(true, str::is_empty);
    if missing && settings.access_key_id.is_some() && io::stdin().is_terminal() {
        let secret = rpassword::prompt_password("OSS accessKeySecret: ")?;
        settings.access_key_secret = Some(secret);
    }
    Ok(())
}

/// Create the runtime each command drives its storage calls on
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SshSyncError::Other(format!("Failed to create async runtime: {}", e)))
}

/// Print the result of a get/put
pub fn report(outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::Synced => println!("{}", "OK".green().bold()),
        SyncOutcome::AlreadyExists => {
            eprintln!("{} target already exists", "Error:".red().bold())
        }
        SyncOutcome::NotFound => eprintln!("{} target not found", "Error:".red().bold()),
    }
}
