//! Reconciliation of movie directories with their sidecar markers
//!
//! Each directory is either `has-movies` (one canonical file carrying a
//! metadata marker) or `empty` (a missing report explaining how to find the
//! movie). Directories are processed one after the other; a rerun over
//! unchanged directories does no network work.

use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::chooser::Chooser;
use crate::config::Config;
use crate::library::{verify_structure, MovieDirectory, MovieLibrary, NameFilter};
use crate::metadata::{CandidateRecord, MetadataResolver, MetadataService};
use crate::naming::search_slug;
use crate::selection::{select_canonical, Selection};
use crate::sidecar::SidecarLayout;
use crate::video::{ClassificationMode, FileClassifier};

/// Flags of one `validate` run
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Redo the metadata search even when a marker already exists
    pub force: bool,
    pub verbose: bool,
    pub mode: ClassificationMode,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            force: false,
            verbose: false,
            mode: ClassificationMode::Extension,
        }
    }
}

/// What happened to one directory
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryOutcome {
    /// A metadata marker was written beside the canonical movie
    MarkerWritten { movie: PathBuf, url: String },
    /// The canonical movie already had a marker of this size
    MarkerPresent { movie: PathBuf, size: u64 },
    /// Several movies and none was chosen
    Skipped,
    /// Movies present but no title was confirmed
    Unresolved,
    /// No movie, the stored missing report was shown again
    ReportReused,
    /// No movie, a fresh missing report was written
    ReportWritten { record: Option<CandidateRecord> },
    /// Reconciling the directory hit an error; the run moved on
    Failed { error: String },
}

/// Counts for a whole run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub scanned: usize,
    pub markers_written: usize,
    pub markers_present: usize,
    pub reports_written: usize,
    pub reports_reused: usize,
    pub skipped: usize,
    pub unresolved: usize,
    pub failed: usize,
    pub total_time: Duration,
}

impl ReconcileSummary {
    fn record(&mut self, outcome: &DirectoryOutcome) {
        self.scanned += 1;
        match outcome {
            DirectoryOutcome::MarkerWritten { .. } => self.markers_written += 1,
            DirectoryOutcome::MarkerPresent { .. } => self.markers_present += 1,
            DirectoryOutcome::Skipped => self.skipped += 1,
            DirectoryOutcome::Unresolved => self.unresolved += 1,
            DirectoryOutcome::ReportReused => self.reports_reused += 1,
            DirectoryOutcome::ReportWritten { .. } => self.reports_written += 1,
            DirectoryOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Drives classification, selection and metadata resolution over a library
pub struct Reconciler {
    config: Config,
    options: ReconcileOptions,
    classifier: FileClassifier,
    layout: SidecarLayout,
    service: Box<dyn MetadataService>,
    chooser: Box<dyn Chooser>,
}

impl Reconciler {
    pub fn new(
        config: Config,
        options: ReconcileOptions,
        service: Box<dyn MetadataService>,
        chooser: Box<dyn Chooser>,
    ) -> Self {
        let classifier = FileClassifier::new(&config.classification, options.mode);
        let layout = SidecarLayout::new(&config.markers);
        Self {
            config,
            options,
            classifier,
            layout,
            service,
            chooser,
        }
    }

    fn resolver(&self) -> MetadataResolver<'_> {
        MetadataResolver::new(self.service.as_ref(), self.chooser.as_ref(), self.options.verbose)
    }

    /// Check the library structure, then reconcile every matching directory in order
    pub async fn run(&self, library: &MovieLibrary, filter: &NameFilter) -> Result<ReconcileSummary> {
        let start_time = Instant::now();
        verify_structure(library)?;

        let dirs = library.movie_dirs(filter)?;
        info!("🎬 Validating {} movie directories", dirs.len());

        let mut summary = ReconcileSummary::default();
        for dir in &dirs {
            let outcome = match self.reconcile_directory(dir).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("⚠️ Failed to reconcile {}: {:#}", dir.path.display(), e);
                    DirectoryOutcome::Failed {
                        error: format!("{:#}", e),
                    }
                }
            };
            debug!("{}: {:?}", dir.name, outcome);
            summary.record(&outcome);
        }

        summary.total_time = start_time.elapsed();
        info!(
            "✅ {} directories checked in {:.2}s: {} markers written, {} reports written, {} skipped, {} failed",
            summary.scanned,
            summary.total_time.as_secs_f64(),
            summary.markers_written,
            summary.reports_written,
            summary.skipped + summary.unresolved,
            summary.failed
        );
        Ok(summary)
    }

    /// Bring one directory's sidecar state in line with its contents
    pub async fn reconcile_directory(&self, dir: &MovieDirectory) -> Result<DirectoryOutcome> {
        if self.options.verbose {
            info!("📁 {}", dir.path.display());
        }

        let classification = self.classifier.classify_directory(&dir.path)?;
        if classification.movies.is_empty() {
            return self.reconcile_empty(dir).await;
        }

        self.layout.remove_missing_report(&dir.path).await?;

        let movie = match select_canonical(&classification.movies, &self.layout, self.chooser.as_ref()).await? {
            Selection::Canonical(movie) => movie,
            Selection::Skipped => return Ok(DirectoryOutcome::Skipped),
        };

        if !self.options.force {
            if let Some(size) = self.layout.metadata_marker_size(&movie).await? {
                if self.options.verbose {
                    info!(
                        "  {} exists ({} bytes)",
                        self.layout.metadata_marker(&movie).display(),
                        size
                    );
                }
                return Ok(DirectoryOutcome::MarkerPresent { movie, size });
            }
        }

        let resolver = self.resolver();
        match resolver.resolve(&dir.path).await? {
            Some(record) => {
                let url = resolver.detail_url(&record);
                self.layout.write_metadata_marker(&movie, &url).await?;
                Ok(DirectoryOutcome::MarkerWritten { movie, url })
            }
            None => Ok(DirectoryOutcome::Unresolved),
        }
    }

    async fn reconcile_empty(&self, dir: &MovieDirectory) -> Result<DirectoryOutcome> {
        eprintln!("{}", dir.path.display().to_string().red().bold());

        if !self.options.force {
            if let Some(report) = self.layout.read_missing_report(&dir.path).await? {
                println!("{}", report);
                return Ok(DirectoryOutcome::ReportReused);
            }
        }

        let slug = search_slug(&dir.name);
        let mut lines = vec![
            format!("{}{}", self.config.commands.torrent_search, slug),
            format!("IMDB Search: {}", self.service.search_url(&slug)),
        ];

        let resolver = self.resolver();
        let record = resolver.resolve(&dir.path).await?;
        if let Some(record) = &record {
            lines.push(resolver.write_up(record).await);
        }

        let report = lines.join("\n");
        self.layout.write_missing_report(&dir.path, &report).await?;
        println!("{}", report);
        Ok(DirectoryOutcome::ReportWritten { record })
    }
}
