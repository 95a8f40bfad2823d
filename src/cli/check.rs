//! Check that the bucket settings work

use colored::Colorize;

use crate::config::SshPaths;
use crate::error::Result;
use crate::oss::ObjectStore;

use super::{runtime, BucketOptions};

pub fn run(options: &BucketOptions, save: bool) -> Result<()> {
    let paths = SshPaths::discover()?;
    println!("{}", "Testing bucket settings".cyan().bold());

    let store = options.open_store(&paths)?;
    let runtime = runtime()?;
    runtime.block_on(async { store.list("", None, 1).await })?;
    println!("{}", "OK".green().bold());

    if save {
        if options.bucket_dir.is_some() {
            println!("{}", "--bucket-dir is not persisted, nothing saved".yellow());
            return Ok(());
        }
        let path = options.settings_path(&paths);
        options.settings(&paths)?.save(&path)?;
        println!("Settings saved to {}", path.display().to_string().cyan());
    }

    Ok(())
}
