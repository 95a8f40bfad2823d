//! Publish a host from `~/.ssh/config` to the bucket

use colored::Colorize;

use crate::config::SshPaths;
use crate::error::Result;
use crate::sync::{Reconciler, SyncOutcome};

use super::{runtime, BucketOptions};

pub fn run(options: &BucketOptions, name: &str) -> Result<SyncOutcome> {
    let paths = SshPaths::discover()?;
    println!("{} {}", "Uploading".cyan(), name.bold());

    let store = options.open_store(&paths)?;
    let runtime = runtime()?;
    runtime.block_on(async {
        let reconciler = Reconciler::new(store.as_ref(), &paths);
        let (local, mut remote) = reconciler.load().await?;
        reconciler.put(&local, &mut remote, name).await
    })
}
