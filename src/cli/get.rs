//! Copy a host from the bucket into `~/.ssh/config`

use colored::Colorize;

use crate::config::SshPaths;
use crate::error::Result;
use crate::sync::{Reconciler, SyncOutcome};

use super::{runtime, BucketOptions};

pub fn run(options: &BucketOptions, name: &str) -> Result<SyncOutcome> {
    let paths = SshPaths::discover()?;
    println!("{} {}", "Downloading".cyan(), name.bold());

    let store = options.open_store(&paths)?;
    let runtime = runtime()?;
    runtime.block_on(async {
        let reconciler = Reconciler::new(store.as_ref(), &paths);
        let (mut local, remote) = reconciler.load().await?;
        reconciler.get(&remote, &mut local, name).await
    })
}
