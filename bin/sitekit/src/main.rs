//! Sitekit CLI
//!
//! Validates and resolves static-site configuration.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;
use sitekit::cmd::check::{self, CheckOptions};
use sitekit_config::{Command, ServerHost};

/// Command-line interface for Sitekit.
#[derive(Parser)]
#[command(
    name = "sitekit",
    version,
    about = "Validate and resolve static-site configuration"
)]
struct Cli {
    /// Path to configuration file (defaults to sitekit.{toml,json,yaml} in the root)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Validate the configuration and print the resolved result
    Check {
        /// Command to resolve for (dev, build, preview)
        #[arg(long, default_value = "dev")]
        command: Command,
        /// Project root directory
        #[arg(long)]
        root: Option<std::path::PathBuf>,
        /// Override server port
        #[arg(long)]
        port: Option<u16>,
        /// Override server host (bare flag listens on all addresses)
        #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = check::parse_host)]
        host: Option<ServerHost>,
        /// Override deployed site URL (e.g., https://example.com)
        #[arg(long)]
        site: Option<String>,
        /// Override base path (e.g., /docs)
        #[arg(long)]
        base: Option<String>,
        /// Print the resolved configuration as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    sitekit::init_tracing(cli.verbose);

    match cli.command {
        Commands::Check {
            command,
            root,
            port,
            host,
            site,
            base,
            json,
        } => {
            let options = CheckOptions {
                command,
                root,
                port,
                host,
                site,
                base,
                json,
            };
            check::run(cli.config.as_deref(), &options).await?;
        }
    }

    Ok(())
}
