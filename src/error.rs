//! Classified failures of the curator and their process exit codes

use std::path::PathBuf;

/// Failures that end a command with a specific exit status.
///
/// Anything not listed here travels as a plain `anyhow::Error` and exits with 1.
#[derive(thiserror::Error, Debug)]
pub enum CuratorError {
    #[error("Library root is not mounted: {}", path.display())]
    NotMounted {
        path: PathBuf,
        hint: Option<String>,
    },

    #[error("There are files in the root dir! Move them to subdirectories.")]
    LooseRootFiles(Vec<PathBuf>),

    #[error("Files/directories found under {}. Move them to the correct directory.", inbox.display())]
    InboxNotEmpty {
        inbox: PathBuf,
        entries: Vec<PathBuf>,
    },

    #[error("No movie found")]
    NoMatch,

    #[error("No directory selected")]
    NoSelection,

    #[error("No movies found")]
    NoRecentMovies,

    #[error("Aborted by user")]
    Aborted,

    #[error("Invalid name filter: {0}")]
    InvalidFilter(#[from] regex::Error),
}

impl CuratorError {
    /// Exit status for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CuratorError::NoSelection => 2,
            _ => 1,
        }
    }

    /// Extra lines telling the user how to fix the problem
    pub fn remediation(&self) -> Vec<String> {
        match self {
            CuratorError::NotMounted { hint: Some(hint), .. } => {
                vec![format!("SSH dir not mounted. Run this command:\n{}", hint)]
            }
            CuratorError::LooseRootFiles(files) => files
                .iter()
                .map(|path| format!("  {}", path.display()))
                .collect(),
            CuratorError::InboxNotEmpty { entries, .. } => entries
                .iter()
                .map(|path| format!("  {}", path.display()))
                .collect(),
            _ => Vec::new(),
        }
    }
}
