use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use movie_curator::config::{expand_home, Config};
use movie_curator::video::find_videos;

#[derive(Parser)]
#[command(name = "videos")]
#[command(about = "List video files by partial name")]
struct Cli {
    /// Directory to search
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Partial file names; none lists every video
    partial_names: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        debug!("No config loaded, using defaults: {}", e);
        Config::default()
    });

    let dir = expand_home(&cli.dir);
    debug!("Looking for videos under {}", dir.display());
    for video in find_videos(&dir, &cli.partial_names, &config.classification.video_extensions)? {
        println!("{}", video.display());
    }

    Ok(())
}
