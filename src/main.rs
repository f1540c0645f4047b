// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use stb_portal::Config;

mod cli;
use cli::{CommandContext, ListCommand, OutputFormat, PlayCommand, ProfilesCommand, ResolveCommand};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "stbportal")]
#[command(about = "Client for set-top-box middleware portals")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (stbportal_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Profile name to use (case-insensitive, or set STBPORTAL_PROFILE)
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Accept invalid TLS certificates from the portal
    #[arg(long, global = true)]
    insecure: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage device profiles
    #[command(subcommand)]
    Profiles(ProfilesSubcommand),

    /// Authenticate with the selected profile and report the result
    Auth,

    /// List live-TV genres
    Genres,

    /// List channels (all pages unless --page is given)
    Channels {
        /// Genre id to filter by
        #[arg(short, long)]
        genre: Option<String>,
        /// Fetch a single page
        #[arg(long)]
        page: Option<u32>,
        /// Ignore cached channel list
        #[arg(long)]
        refresh: bool,
    },

    /// List VOD categories
    VodCategories,

    /// List VOD items
    Vod {
        /// Category id to filter by
        #[arg(short = 'C', long)]
        category: Option<String>,
        /// Fetch a single page
        #[arg(long)]
        page: Option<u32>,
        /// Maximum number of pages to fetch
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// Resolve a content command to a playable URL
    Resolve {
        cmd: String,
        /// The command belongs to a VOD item
        #[arg(long)]
        vod: bool,
    },

    /// Resolve and play with the configured player, keeping the session alive
    Play {
        cmd: String,
        /// The command belongs to a VOD item
        #[arg(long)]
        vod: bool,
    },
}

#[derive(Subcommand)]
enum ProfilesSubcommand {
    /// List configured profiles
    List,
    /// Add a profile (a MAC is generated when omitted)
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        portal_url: String,
        #[arg(long)]
        mac: Option<String>,
        #[arg(long)]
        serial_number: Option<String>,
        #[arg(long)]
        stb_type: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
    },
}

fn init_logging(cli: &Cli) -> Result<()> {
    if cli.debug_log {
        let file = File::create("stbportal_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("stb_portal=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    if cli.insecure {
        config.client.accept_invalid_certs = true;
    }

    let format = OutputFormat::from_str(&cli.format)?;
    let selected_profile = cli
        .profile
        .clone()
        .or_else(|| std::env::var("STBPORTAL_PROFILE").ok());
    let context = CommandContext::new(config, selected_profile);

    match cli.command {
        Commands::Profiles(cmd) => {
            let cmd = match cmd {
                ProfilesSubcommand::List => ProfilesCommand::List,
                ProfilesSubcommand::Add {
                    name,
                    portal_url,
                    mac,
                    serial_number,
                    stb_type,
                    timezone,
                } => ProfilesCommand::Add {
                    name,
                    portal_url,
                    mac,
                    serial_number,
                    stb_type,
                    timezone,
                    config_path,
                },
            };
            cmd.execute(context, format).await?;
        }
        Commands::Auth => ProfilesCommand::Auth.execute(context, format).await?,
        Commands::Genres => ListCommand::Genres.execute(context, format).await?,
        Commands::Channels {
            genre,
            page,
            refresh,
        } => {
            ListCommand::Channels {
                genre,
                page,
                refresh,
            }
            .execute(context, format)
            .await?
        }
        Commands::VodCategories => ListCommand::VodCategories.execute(context, format).await?,
        Commands::Vod {
            category,
            page,
            max_pages,
        } => {
            ListCommand::Vod {
                category,
                page,
                max_pages,
            }
            .execute(context, format)
            .await?
        }
        Commands::Resolve { cmd, vod } => {
            ResolveCommand { cmd, vod }.execute(context, format).await?
        }
        Commands::Play { cmd, vod } => PlayCommand { cmd, vod }.execute(context).await?,
    }

    Ok(())
}
