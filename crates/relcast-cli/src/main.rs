//! Relcast CLI - copy releases between git hosting providers.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use relcast_core::ProviderKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Relcast - copy releases between git hosting providers
#[derive(Parser, Debug)]
#[command(name = "relcast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy all releases from a source repository to a destination repository
    Copy(CopyArgs),

    /// List a repository's releases in canonical form
    Releases(ReleasesArgs),

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
struct CopyArgs {
    /// JSON config file holding source and destination endpoints
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source provider kind (github or gitlab)
    #[arg(long)]
    source_provider: Option<ProviderKind>,

    /// Source repository URL (scheme://host/namespace/repo)
    #[arg(long)]
    source_url: Option<String>,

    /// Extra source header as "Name: value" (repeatable)
    #[arg(long = "source-header", value_name = "HEADER")]
    source_headers: Vec<String>,

    /// Destination provider kind (github or gitlab)
    #[arg(long)]
    dest_provider: Option<ProviderKind>,

    /// Destination repository URL (scheme://host/namespace/repo)
    #[arg(long)]
    dest_url: Option<String>,

    /// Extra destination header as "Name: value" (repeatable)
    #[arg(long = "dest-header", value_name = "HEADER")]
    dest_headers: Vec<String>,
}

#[derive(Args, Debug)]
struct ReleasesArgs {
    /// Provider kind (github or gitlab)
    #[arg(long)]
    provider: ProviderKind,

    /// Repository URL (scheme://host/namespace/repo)
    #[arg(long)]
    url: String,

    /// Extra header as "Name: value" (repeatable)
    #[arg(long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// List newest releases first instead of oldest first
    #[arg(long)]
    newest_first: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("relcast={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::Copy(args) => commands::copy(args).await,
        Commands::Releases(args) => commands::releases(args).await,
        Commands::Version => {
            println!("relcast {}", relcast_core::VERSION);
            Ok(0)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
