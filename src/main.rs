use clap::error::ErrorKind;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use ssh_config_sync::cli::{self, BucketOptions};
use ssh_config_sync::Result;

/// Exit status for command-line usage errors
const USAGE_EXIT: u8 = 99;

#[derive(Parser)]
#[command(name = "sshcfg")]
#[command(author = "Oleg")]
#[command(version)]
#[command(arg_required_else_help = true)]
#[command(about = "Sync ~/.ssh/config hosts and their keys through an OSS bucket", long_about = None)]
struct Cli {
    #[command(flatten)]
    bucket: BucketOptions,

    /// More log output (-v for debug, -vv for debug from every crate)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show local and remote hosts (seeds the bucket on first run)
    Show,

    /// Copy a host from the bucket into ~/.ssh/config
    Get {
        /// Host alias
        name: String,
    },

    /// Upload a host from ~/.ssh/config to the bucket
    Put {
        /// Host alias
        name: String,
    },

    /// Check that the bucket settings work
    Test {
        /// Save the settings after a successful check
        #[arg(long)]
        save: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
                _ => ExitCode::from(USAGE_EXIT),
            };
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG wins; otherwise progress at info level
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "ssh_config_sync=info",
        1 => "ssh_config_sync=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let outcome = match cli.command {
        Commands::Show => return cli::show::run(&cli.bucket).map(|()| ExitCode::SUCCESS),
        Commands::Test { save } => {
            return cli::check::run(&cli.bucket, save).map(|()| ExitCode::SUCCESS)
        }
        Commands::Get { name } => cli::get::run(&cli.bucket, &name)?,
        Commands::Put { name } => cli::put::run(&cli.bucket, &name)?,
    };

    cli::report(outcome);
    Ok(ExitCode::from(outcome.exit_code()))
}
