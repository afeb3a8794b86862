use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use movie_curator::chooser::{Chooser, FzfChooser};
use movie_curator::config::Config;
use movie_curator::error::CuratorError;
use movie_curator::library::{ensure_mounted, remove_directory, render_listing, MovieLibrary, NameFilter};
use movie_curator::metadata::ImdbClient;
use movie_curator::reconcile::{ReconcileOptions, Reconciler};
use movie_curator::subtitles::SubtitleTrigger;
use movie_curator::torrents::TransmissionClient;
use movie_curator::video::ClassificationMode;

#[derive(Parser)]
#[command(name = "movies")]
#[command(author = "TigreRoll", version, about = "Movie library curation: missing movies, IMDb markers and housekeeping")]
#[command(infer_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the usual locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate movie files and dirs: root and inbox structure, missing movies, IMDb markers
    Validate {
        /// Redo IMDb lookups and missing reports that already exist
        #[arg(short, long)]
        force: bool,

        #[arg(short, long)]
        verbose: bool,

        /// Recognise movies by content type instead of extension
        #[arg(short, long)]
        magic: bool,

        /// Only directories matching these words
        name: Vec<String>,
    },
    /// List movie directories
    Ls {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Remove a movie directory
    Rm {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Search subtitles for recent movies
    Subtitles {
        /// Only for Transmission torrents
        #[arg(short, long)]
        torrent: bool,

        /// Days to consider recent files
        #[arg(short, long, default_value_t = 2)]
        days: i64,

        name: Vec<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> (Config, Option<String>) {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(format!("Failed to load config, using defaults: {}", e))),
    }
}

fn init_tracing(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("movie_curator={},movies={},warn", level, level)));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (config, load_warning) = load_config(cli.config.as_ref());
    let verbose = matches!(cli.command, Commands::Validate { verbose: true, .. });
    init_tracing(&config, verbose);
    if let Some(message) = load_warning {
        warn!("{}", message);
    }

    if let Err(e) = run(cli.command, config).await {
        let code = match e.downcast_ref::<CuratorError>() {
            Some(failure) => {
                eprintln!("{}", failure.to_string().red());
                for line in failure.remediation() {
                    eprintln!("{}", line);
                }
                failure.exit_code()
            }
            None => {
                error!("❌ {:#}", e);
                1
            }
        };
        std::process::exit(code);
    }
}

async fn run(command: Commands, config: Config) -> Result<()> {
    if let Err(e) = config.validate() {
        warn!("Configuration problem: {}", e);
    }
    debug!("{}", config.summary());

    let library = MovieLibrary::new(&config.library);
    ensure_mounted(&library, config.library.mount_hint.as_deref())?;

    match command {
        Commands::Validate {
            force,
            verbose,
            magic,
            name,
        } => {
            let filter = NameFilter::new(&name)?;
            let mode = if magic || config.classification.use_content_sniffing {
                ClassificationMode::ContentSniffing
            } else {
                ClassificationMode::Extension
            };
            let options = ReconcileOptions { force, verbose, mode };

            let service = ImdbClient::new(config.metadata.clone())?;
            let chooser = FzfChooser::new(&config.commands.chooser);
            let reconciler = Reconciler::new(config, options, Box::new(service), Box::new(chooser));
            reconciler.run(&library, &filter).await?;
        }

        Commands::Ls { name } => {
            let dirs = library.movie_dirs(&NameFilter::new(&name)?)?;
            if dirs.is_empty() {
                return Err(CuratorError::NoMatch.into());
            }
            for dir in dirs {
                println!("{}", render_listing(&dir.path)?);
            }
        }

        Commands::Rm { name } => {
            let dirs = library.movie_dirs(&NameFilter::new(&name)?)?;
            if dirs.is_empty() {
                return Err(CuratorError::NoMatch.into());
            }

            let chooser = FzfChooser::new(&config.commands.chooser);
            let lines: Vec<String> = dirs.iter().map(|dir| dir.path.display().to_string()).collect();
            let chosen = chooser.choose(&lines).await?.ok_or(CuratorError::NoSelection)?;
            let dir = PathBuf::from(chosen);

            println!("{}", render_listing(&dir)?);
            if !chooser.confirm("\nDo you really want to remove this directory?").await? {
                return Err(CuratorError::Aborted.into());
            }

            remove_directory(&dir).await?;
            println!("Directory removed");
        }

        Commands::Subtitles { torrent, days, name } => {
            let filter = NameFilter::new(&name)?;
            let dirs = if torrent {
                TransmissionClient::new(&config.transmission)?.torrent_dirs(&filter).await?
            } else {
                library
                    .movie_dirs(&filter)?
                    .into_iter()
                    .map(|dir| dir.path)
                    .collect()
            };

            let trigger = SubtitleTrigger::new(&config.commands.subtitles, &config.classification.movie_extensions);
            let handled = trigger.run(&dirs, days).await?;
            info!("💬 Subtitles requested for {} directories", handled.len());
        }
    }

    Ok(())
}
