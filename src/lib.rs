//! Movie Curator
//!
//! Keeps a movie library tidy: finds directories without a movie file, looks
//! their names up on IMDb with a human picking the right title, and leaves
//! sidecar markers so repeated runs settle without further lookups.

pub mod chooser;
pub mod config;
pub mod error;
pub mod library;
pub mod metadata;
pub mod naming;
pub mod reconcile;
pub mod selection;
pub mod sidecar;
pub mod subtitles;
pub mod torrents;
pub mod video;

// Re-export main types for easy access
pub use crate::chooser::{Chooser, FzfChooser};
pub use crate::config::Config;
pub use crate::error::CuratorError;
pub use crate::library::{MovieDirectory, MovieLibrary, NameFilter};
pub use crate::metadata::{CandidateRecord, ImdbClient, MetadataResolver, MetadataService};
pub use crate::reconcile::{DirectoryOutcome, ReconcileOptions, ReconcileSummary, Reconciler};
pub use crate::selection::Selection;
pub use crate::sidecar::SidecarLayout;
pub use crate::video::{ClassificationMode, ContentInspector, FileClassifier};
