//! SkyDisk CLI - one drive over local and S3-compatible storage.
//!
//! Every command loads the layered configuration, bootstraps the drive
//! (registering `local-default` and the optional object-store source), runs
//! one operation and exits.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use skydisk_drive::Drive;
use skydisk_telemetry::{LogConfig, LogFormat, LogTarget, setup_logging};

mod commands;
mod config_bridge;
mod theme;

use commands::{config, files, links, sources};
use theme::Theme;

/// SkyDisk - multi-backend file drive
#[derive(Parser)]
#[command(name = "skydisk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file (default: ~/.skydisk/config.toml)
    #[arg(short, long, global = true, env = "SKYDISK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List storage sources
    Sources,

    /// Upload a local file
    Upload {
        /// Source name or id
        source: String,
        /// File to upload
        file: PathBuf,
        /// Destination directory
        #[arg(short, long, default_value = "")]
        path: String,
        /// Store under a different name
        #[arg(short, long)]
        name: Option<String>,
        /// Content type to record
        #[arg(long)]
        content_type: Option<String>,
    },

    /// List a directory
    Ls {
        /// Source name or id
        source: String,
        /// Directory (default: root)
        #[arg(default_value = "")]
        path: String,
    },

    /// List every entry, newest first
    Files {
        /// Restrict to one source
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Create a directory and its missing parents
    Mkdir {
        /// Source name or id
        source: String,
        /// Directory path
        path: String,
    },

    /// Download a file
    Get {
        /// Entry id
        id: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Open for inline display
        #[arg(long)]
        inline: bool,
    },

    /// Rename a file or directory
    Rename {
        /// Entry id
        id: String,
        /// New leaf name
        name: String,
    },

    /// Delete a file or directory
    Rm {
        /// Entry id
        id: String,
    },

    /// Create a short link to a file
    Link {
        /// Entry id
        id: String,
        /// Lifetime in seconds (default: never expires)
        #[arg(long)]
        ttl: Option<u64>,
        /// Access code required to resolve the link
        #[arg(long)]
        code: Option<String>,
    },

    /// List short links
    Links,

    /// Get the best direct URL for a file
    DirectLink {
        /// Entry id
        id: String,
        /// Lifetime in seconds
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Check a short link, optionally saving its file
    Resolve {
        /// Link token
        token: String,
        /// Access code
        #[arg(long)]
        code: Option<String>,
        /// Save the file here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete expired short links
    PurgeLinks,

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show {
        /// Output format: toml or json
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

fn init_logging(cli: &Cli) {
    let log_config = match skydisk_config::Config::load(cli.config.as_deref()) {
        Ok(resolved) => config_bridge::to_log_config(&resolved.config, cli.verbose),
        Err(_) => {
            let level = if cli.verbose { "debug" } else { "warn" };
            LogConfig::new(level)
                .with_format(LogFormat::Compact)
                .with_target(LogTarget::Stderr)
        },
    };
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Config {
        command: ConfigCommands::Show { format },
    } = &cli.command
    {
        return config::show(cli.config.as_deref(), format);
    }

    let resolved = skydisk_config::Config::load(cli.config.as_deref())?;
    let drive = Drive::bootstrap(&resolved.config).await?;

    match cli.command {
        Commands::Sources => sources::list_sources(&drive).await,
        Commands::Upload {
            source,
            file,
            path,
            name,
            content_type,
        } => {
            files::upload(
                &drive,
                &source,
                &file,
                &path,
                name.as_deref(),
                content_type.as_deref(),
            )
            .await
        },
        Commands::Ls { source, path } => files::browse(&drive, &source, &path).await,
        Commands::Files { source } => files::list_files(&drive, source.as_deref()).await,
        Commands::Mkdir { source, path } => files::mkdir(&drive, &source, &path).await,
        Commands::Get { id, output, inline } => {
            files::get(&drive, &id, output.as_deref(), inline).await
        },
        Commands::Rename { id, name } => files::rename(&drive, &id, &name).await,
        Commands::Rm { id } => files::remove(&drive, &id).await,
        Commands::Link { id, ttl, code } => links::create(&drive, &id, ttl, code.as_deref()).await,
        Commands::Links => links::list(&drive).await,
        Commands::DirectLink { id, ttl } => links::direct(&drive, &id, ttl).await,
        Commands::Resolve {
            token,
            code,
            output,
        } => links::resolve(&drive, &token, code.as_deref(), output.as_deref()).await,
        Commands::PurgeLinks => links::purge(&drive).await,
        Commands::Config { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", Theme::error(&format!("{e:#}")));
            ExitCode::FAILURE
        },
    }
}
