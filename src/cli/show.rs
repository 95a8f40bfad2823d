//! Show local and remote hosts, seeding the bucket on first use

use colored::Colorize;

use crate::config::{ConfigDocument, SshPaths};
use crate::error::Result;
use crate::sync::Reconciler;

use super::{runtime, BucketOptions};

pub fn run(options: &BucketOptions) -> Result<()> {
    let paths = SshPaths::discover()?;
    let store = options.open_store(&paths)?;

    let runtime = runtime()?;
    let (local, remote) = runtime.block_on(async {
        Reconciler::new(store.as_ref(), &paths).load().await
    })?;

    println!();
    print_hosts("Local config", &local);
    print_hosts("Remote config", &remote);
    Ok(())
}

fn print_hosts(title: &str, doc: &ConfigDocument) {
    println!(
        "{} has {} hosts",
        title.cyan().bold(),
        doc.len().to_string().bold()
    );
    for host in &doc.hosts {
        println!("\t{} {} {}", host.name.bold(), host.host, host.identity_file.dimmed());
    }
}
