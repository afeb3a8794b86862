//! The set of movie directories under the configured roots

pub mod guard;
pub mod listing;

pub use guard::{check_inbox_empty, check_no_loose_files, ensure_mounted, verify_structure};
pub use listing::{remove_directory, render_listing};

use anyhow::Result;
use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{expand_home, LibraryConfig};
use crate::error::CuratorError;

/// A directory holding (or waiting for) one movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieDirectory {
    pub path: PathBuf,
    /// Directory name; seeds the metadata search
    pub name: String,
}

impl MovieDirectory {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, name }
    }
}

/// Case-insensitive name filter built from command line words
#[derive(Debug, Clone)]
pub struct NameFilter {
    regex: Option<Regex>,
}

impl NameFilter {
    /// Words are joined with `.*` and matched anywhere in the name
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, CuratorError> {
        if patterns.is_empty() {
            return Ok(Self::all());
        }

        let joined = patterns
            .iter()
            .map(|pattern| pattern.as_ref())
            .collect::<Vec<_>>()
            .join(".*");
        let regex = RegexBuilder::new(&joined).case_insensitive(true).build()?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn all() -> Self {
        Self { regex: None }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.as_ref().map_or(true, |regex| regex.is_match(name))
    }
}

/// Interleave lists one element at a time: first of each, then second of each...
pub fn round_robin<T>(lists: Vec<Vec<T>>) -> Vec<T> {
    let total = lists.iter().map(Vec::len).sum();
    let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    let mut merged = Vec::with_capacity(total);

    while merged.len() < total {
        for iter in iters.iter_mut() {
            if let Some(item) = iter.next() {
                merged.push(item);
            }
        }
    }
    merged
}

/// Movie roots plus the download inbox
#[derive(Debug, Clone)]
pub struct MovieLibrary {
    roots: Vec<PathBuf>,
    inbox: PathBuf,
}

impl MovieLibrary {
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            roots: config.roots.iter().map(|root| expand_home(root)).collect(),
            inbox: expand_home(&config.inbox),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    /// Subdirectories of one root, newest first by modification time
    pub fn subdirectories(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            warn!("Library root does not exist: {}", root.display());
            return Ok(Vec::new());
        }

        let mut dirs: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            dirs.push((modified, entry.into_path()));
        }

        // Newest first; name breaks ties so the order is stable
        dirs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(dirs.into_iter().map(|(_, path)| path).collect())
    }

    /// Movie directories of every root, newest first, interleaved across roots.
    ///
    /// The filter applies to the interleaved sequence, so matches keep the
    /// position they have in the unfiltered listing.
    pub fn movie_dirs(&self, filter: &NameFilter) -> Result<Vec<MovieDirectory>> {
        let mut per_root = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            let dirs = self.subdirectories(root)?;
            debug!("{} directories under {}", dirs.len(), root.display());
            per_root.push(dirs);
        }

        Ok(round_robin(per_root)
            .into_iter()
            .map(MovieDirectory::new)
            .filter(|dir| filter.matches(&dir.name))
            .collect())
    }
}
