//! Subtitle fetching for recently downloaded movies

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Local};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::CuratorError;
use crate::video::lowercase_extension;

/// Movie files directly inside `dir` modified after `since`
pub fn recent_movies(dir: &Path, movie_extensions: &[String], since: DateTime<Local>) -> Result<Vec<PathBuf>> {
    let mut recent = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !movie_extensions.contains(&lowercase_extension(&path)) {
            continue;
        }
        let modified: DateTime<Local> = entry.metadata()?.modified()?.into();
        if modified > since {
            recent.push(path);
        }
    }
    recent.sort();
    Ok(recent)
}

/// Runs the external subtitle command on movie directories
pub struct SubtitleTrigger {
    command: String,
    movie_extensions: Vec<String>,
}

impl SubtitleTrigger {
    pub fn new(command: &str, movie_extensions: &[String]) -> Self {
        Self {
            command: command.to_string(),
            movie_extensions: movie_extensions.iter().map(|ext| ext.to_lowercase()).collect(),
        }
    }

    /// Invoke the command with the directory as its only argument
    pub async fn trigger(&self, dir: &Path) -> Result<()> {
        info!("💬 Fetching subtitles for {}", dir.display());
        let status = Command::new(&self.command)
            .arg(dir)
            .status()
            .await
            .with_context(|| format!("failed to run {}", self.command))?;

        if !status.success() {
            return Err(anyhow!("{} failed for {} with {}", self.command, dir.display(), status));
        }
        Ok(())
    }

    /// Trigger every directory holding movies modified in the last `days` days.
    ///
    /// Returns the directories handled; none at all is a [`CuratorError::NoRecentMovies`].
    pub async fn run(&self, dirs: &[PathBuf], days: i64) -> Result<Vec<PathBuf>> {
        let since = Local::now() - Duration::days(days);
        debug!("Looking for movies modified since {}", since);

        let mut handled = Vec::new();
        for dir in dirs {
            if !dir.exists() {
                eprintln!(
                    "{}",
                    format!("Recent torrent, movie dir doesn't exist yet: {}", dir.display()).red()
                );
                continue;
            }

            if recent_movies(dir, &self.movie_extensions, since)?.is_empty() {
                continue;
            }

            println!();
            if let Err(e) = self.trigger(dir).await {
                warn!("{}", e);
            }
            handled.push(dir.clone());
        }

        if handled.is_empty() {
            return Err(CuratorError::NoRecentMovies.into());
        }
        Ok(handled)
    }
}
