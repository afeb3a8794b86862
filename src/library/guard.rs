//! Structural preconditions checked before touching any movie directory

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use walkdir::WalkDir;

use super::MovieLibrary;
use crate::error::CuratorError;

/// The first root doubles as the mount point of the remote library
pub fn ensure_mounted(library: &MovieLibrary, mount_hint: Option<&str>) -> Result<(), CuratorError> {
    match library.roots().first() {
        Some(root) if root.is_dir() => Ok(()),
        Some(root) => Err(CuratorError::NotMounted {
            path: root.clone(),
            hint: mount_hint.map(str::to_string),
        }),
        None => Ok(()),
    }
}

fn entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let is_dir = entry.file_type().is_dir();
        found.push((entry.into_path(), is_dir));
    }
    Ok(found)
}

/// Every entry directly under a root must be a directory
pub fn check_no_loose_files(roots: &[PathBuf]) -> Result<()> {
    let mut loose = Vec::new();
    for root in roots.iter().filter(|root| root.is_dir()) {
        loose.extend(
            entries(root)?
                .into_iter()
                .filter(|(_, is_dir)| !is_dir)
                .map(|(path, _)| path),
        );
    }

    if loose.is_empty() {
        return Ok(());
    }
    error!("🚫 {} loose files found in library roots", loose.len());
    Err(CuratorError::LooseRootFiles(loose).into())
}

/// The download inbox must have been emptied into the roots
pub fn check_inbox_empty(inbox: &Path) -> Result<()> {
    if !inbox.is_dir() {
        debug!("Inbox {} does not exist, nothing to check", inbox.display());
        return Ok(());
    }

    let pending: Vec<PathBuf> = entries(inbox)?.into_iter().map(|(path, _)| path).collect();
    if pending.is_empty() {
        return Ok(());
    }
    error!("🚫 {} entries waiting in {}", pending.len(), inbox.display());
    Err(CuratorError::InboxNotEmpty {
        inbox: inbox.to_path_buf(),
        entries: pending,
    }
    .into())
}

/// Run every structural check; the first violation aborts
pub fn verify_structure(library: &MovieLibrary) -> Result<()> {
    check_no_loose_files(library.roots())?;
    check_inbox_empty(library.inbox())?;
    debug!("✅ Library structure verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryConfig;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, MovieLibrary) {
        let temp = TempDir::new().unwrap();
        let movies = temp.path().join("movies");
        let inbox = temp.path().join("completed");
        std::fs::create_dir_all(movies.join("Heat (1995)")).unwrap();
        std::fs::create_dir_all(&inbox).unwrap();
        let library = MovieLibrary::new(&LibraryConfig {
            roots: vec![movies],
            inbox,
            mount_hint: Some("sshfs host:/data ~/data".to_string()),
        });
        (temp, library)
    }

    fn curator_error(result: Result<()>) -> CuratorError {
        result.unwrap_err().downcast::<CuratorError>().unwrap()
    }

    #[test]
    fn test_clean_library_passes() {
        let (_temp, library) = fixture();
        verify_structure(&library).unwrap();
        ensure_mounted(&library, None).unwrap();
    }

    #[test]
    fn test_loose_file_in_root() {
        let (temp, library) = fixture();
        let loose = temp.path().join("movies").join("Heat.1995.mkv");
        std::fs::write(&loose, "x").unwrap();

        match curator_error(verify_structure(&library)) {
            CuratorError::LooseRootFiles(files) => assert_eq!(files, vec![loose]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_inbox_not_empty() {
        let (temp, library) = fixture();
        std::fs::create_dir(temp.path().join("completed").join("Alien.1979")).unwrap();

        match curator_error(verify_structure(&library)) {
            CuratorError::InboxNotEmpty { entries, .. } => assert_eq!(entries.len(), 1),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unmounted_root_carries_hint() {
        let temp = TempDir::new().unwrap();
        let library = MovieLibrary::new(&LibraryConfig {
            roots: vec![temp.path().join("not-mounted")],
            inbox: temp.path().join("completed"),
            mount_hint: None,
        });

        let err = ensure_mounted(&library, Some("sshfs host:/data ~/data")).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.remediation(),
            vec!["SSH dir not mounted. Run this command:\nsshfs host:/data ~/data".to_string()]
        );
    }
}
