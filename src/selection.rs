use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::chooser::Chooser;
use crate::sidecar::SidecarLayout;

/// Outcome of picking the canonical movie file of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Canonical(PathBuf),
    /// Several candidates and the user chose none of them
    Skipped,
}

/// Pick the canonical movie among the candidates of one directory.
///
/// A single candidate wins outright, then the first candidate that already has
/// a metadata marker. Only otherwise is the user asked.
pub async fn select_canonical(
    candidates: &[PathBuf],
    layout: &SidecarLayout,
    chooser: &dyn Chooser,
) -> Result<Selection> {
    if let [only] = candidates {
        return Ok(Selection::Canonical(only.clone()));
    }

    if let Some(marked) = candidates.iter().find(|path| layout.has_metadata_marker(path)) {
        debug!("  Using movie with an existing marker: {}", marked.display());
        return Ok(Selection::Canonical(marked.clone()));
    }

    let lines: Vec<String> = candidates
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    let Some(chosen) = chooser.choose(&lines).await? else {
        info!("⏭️  No movie chosen among {} candidates", candidates.len());
        return Ok(Selection::Skipped);
    };

    Ok(candidates
        .iter()
        .find(|path| Path::new(&chosen) == path.as_path())
        .cloned()
        .map(Selection::Canonical)
        .unwrap_or(Selection::Skipped))
}
