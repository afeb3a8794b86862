//! Sidecar markers recording the reconciliation state of a movie directory
//!
//! A directory carries either a missing report (no movie file found yet) or a
//! metadata marker beside its canonical movie file, never both.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::config::MarkerConfig;

/// Marker file naming for a library
#[derive(Debug, Clone)]
pub struct SidecarLayout {
    missing_file: String,
    metadata_extension: String,
}

impl SidecarLayout {
    pub fn new(config: &MarkerConfig) -> Self {
        Self {
            missing_file: config.missing_file.clone(),
            metadata_extension: config.metadata_extension.clone(),
        }
    }

    /// Path of the missing report inside a movie directory
    pub fn missing_marker(&self, movie_dir: &Path) -> PathBuf {
        movie_dir.join(&self.missing_file)
    }

    /// Path of the metadata marker beside a movie file (same stem)
    pub fn metadata_marker(&self, movie_file: &Path) -> PathBuf {
        movie_file.with_extension(&self.metadata_extension)
    }

    pub fn has_metadata_marker(&self, movie_file: &Path) -> bool {
        self.metadata_marker(movie_file).exists()
    }

    /// Stored missing report, if the directory has one
    pub async fn read_missing_report(&self, movie_dir: &Path) -> Result<Option<String>> {
        let path = self.missing_marker(movie_dir);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path).await?))
    }

    pub async fn write_missing_report(&self, movie_dir: &Path, content: &str) -> Result<PathBuf> {
        let path = self.missing_marker(movie_dir);
        fs::write(&path, content).await?;
        info!("📝 Wrote missing report: {}", path.display());
        Ok(path)
    }

    /// Delete a stale missing report; returns whether one existed
    pub async fn remove_missing_report(&self, movie_dir: &Path) -> Result<bool> {
        let path = self.missing_marker(movie_dir);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).await?;
        info!("🧹 Removed stale missing report: {}", path.display());
        Ok(true)
    }

    /// Size in bytes of an existing metadata marker
    pub async fn metadata_marker_size(&self, movie_file: &Path) -> Result<Option<u64>> {
        let path = self.metadata_marker(movie_file);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::metadata(&path).await?.len()))
    }

    /// Write the detail URL as the metadata marker's only line
    pub async fn write_metadata_marker(&self, movie_file: &Path, detail_url: &str) -> Result<PathBuf> {
        let path = self.metadata_marker(movie_file);
        fs::write(&path, format!("{}\n", detail_url)).await?;
        debug!("  Writing {} on {}", detail_url, path.display());
        Ok(path)
    }
}
