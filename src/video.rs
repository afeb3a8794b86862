use anyhow::Result;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ClassificationConfig;

/// Bytes inspected when deciding whether a file is text
const SNIFF_LEN: usize = 1024;

/// Extensions whose content kind is known without reading the file
const KNOWN_BINARY_EXTENSIONS: &[&str] = &[
    "avi", "mp4", "mpg", "mpeg", "mkv", "wmv", "mov", "m4v", "webm", "flv", "f4v", "asf",
    "divx", "ogv", "ts", "jpg", "jpeg", "png", "gif", "bmp", "ico", "pdf", "zip", "gz", "rar",
    "7z", "mp3", "ogg", "flac", "wav", "ac3", "dts", "swf", "sqlite", "iso", "exe",
];
const KNOWN_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "srt", "nfo", "ass", "ssa", "vtt", "xml", "html", "htm", "json", "md", "log",
    "sfv", "nzb", "cue", "m3u", "ini", "yaml", "yml", "csv",
];

/// Content kind of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Binary,
    Text,
    /// Directories, symlinks and anything that is not a regular file
    NotAFile,
}

/// A file scored by the classifier
#[derive(Debug, Clone)]
pub struct ClassifiedFile {
    pub path: PathBuf,
    pub kind: ContentKind,
    /// Lowercased extension without the dot, empty when there is none
    pub extension: String,
    pub mime_type: Option<String>,
}

/// Oracle answering questions about file content
pub trait ContentInspector: Send + Sync {
    fn content_kind(&self, path: &Path) -> Result<ContentKind>;
    fn mime_type(&self, path: &Path) -> Result<Option<String>>;
}

/// Inspector that trusts well-known extensions and sniffs everything else
#[derive(Debug, Clone, Default)]
pub struct FileInspector;

impl FileInspector {
    pub fn new() -> Self {
        Self
    }
}

/// True when every byte belongs to the printable/whitespace text set
pub fn looks_like_text(bytes: &[u8]) -> bool {
    bytes.iter().all(|&byte| match byte {
        7..=13 | 27 => true,
        0x20..=0x7e => true,
        0x80..=0xff => true,
        _ => false,
    })
}

impl ContentInspector for FileInspector {
    fn content_kind(&self, path: &Path) -> Result<ContentKind> {
        let metadata = std::fs::symlink_metadata(path)?;
        if !metadata.file_type().is_file() {
            return Ok(ContentKind::NotAFile);
        }
        if metadata.len() == 0 {
            return Ok(ContentKind::Text);
        }

        let extension = lowercase_extension(path);
        if KNOWN_BINARY_EXTENSIONS.contains(&extension.as_str()) {
            return Ok(ContentKind::Binary);
        }
        if KNOWN_TEXT_EXTENSIONS.contains(&extension.as_str()) {
            return Ok(ContentKind::Text);
        }

        let mut head = Vec::with_capacity(SNIFF_LEN);
        File::open(path)?.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
        if looks_like_text(&head) {
            Ok(ContentKind::Text)
        } else {
            Ok(ContentKind::Binary)
        }
    }

    fn mime_type(&self, path: &Path) -> Result<Option<String>> {
        Ok(infer::get_from_path(path)?.map(|kind| kind.mime_type().to_string()))
    }
}

/// Lowercased extension without the dot, empty when absent
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

/// How candidates are recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMode {
    /// Any binary file outside the deny-list
    Extension,
    /// Binary files sniffed as `video/*`, still subject to the deny-list
    ContentSniffing,
}

/// Result of classifying one directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryClassification {
    /// Accepted movie candidates, in directory iteration order
    pub movies: Vec<PathBuf>,
    /// Candidate extensions missing from the known movie extensions
    pub unknown_extensions: BTreeSet<String>,
}

/// Decides which files in a movie directory are movies
pub struct FileClassifier {
    movie_extensions: BTreeSet<String>,
    ignore_extensions: BTreeSet<String>,
    mode: ClassificationMode,
    inspector: Box<dyn ContentInspector>,
}

impl FileClassifier {
    pub fn new(config: &ClassificationConfig, mode: ClassificationMode) -> Self {
        Self::with_inspector(config, mode, Box::new(FileInspector::new()))
    }

    pub fn with_inspector(
        config: &ClassificationConfig,
        mode: ClassificationMode,
        inspector: Box<dyn ContentInspector>,
    ) -> Self {
        Self {
            movie_extensions: config.movie_extensions.iter().map(|e| e.to_lowercase()).collect(),
            ignore_extensions: config.ignore_extensions.iter().map(|e| e.to_lowercase()).collect(),
            mode,
            inspector,
        }
    }

    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }

    /// Score a single file
    pub fn inspect(&self, path: &Path) -> Result<ClassifiedFile> {
        let kind = self.inspector.content_kind(path)?;
        let mime_type = if kind == ContentKind::Binary && self.mode == ClassificationMode::ContentSniffing {
            self.inspector.mime_type(path)?
        } else {
            None
        };

        Ok(ClassifiedFile {
            path: path.to_path_buf(),
            kind,
            extension: lowercase_extension(path),
            mime_type,
        })
    }

    /// Whether a scored file is a movie candidate
    pub fn is_movie(&self, file: &ClassifiedFile) -> bool {
        if file.kind != ContentKind::Binary {
            return false;
        }
        if self.ignore_extensions.contains(&file.extension) {
            return false;
        }
        match self.mode {
            ClassificationMode::Extension => true,
            ClassificationMode::ContentSniffing => file
                .mime_type
                .as_deref()
                .map(|mime| mime.split('/').next() == Some("video"))
                .unwrap_or(false),
        }
    }

    /// Classify every entry of a directory; entries are visited sorted by name
    pub fn classify_directory(&self, dir: &Path) -> Result<DirectoryClassification> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();

        let mut classification = DirectoryClassification::default();
        for path in entries {
            let file = self.inspect(&path)?;
            if !self.is_movie(&file) {
                continue;
            }

            match &file.mime_type {
                Some(mime) => debug!("  Found movie with magic: {} ({})", file_name(&path), mime),
                None => debug!("  Found binary movie: {}", file_name(&path)),
            }

            if !self.movie_extensions.contains(&file.extension) {
                classification.unknown_extensions.insert(file.extension.clone());
            }
            classification.movies.push(path);
        }

        if !classification.unknown_extensions.is_empty() {
            warn!(
                "Add these extensions to movie_extensions: {:?}",
                classification.unknown_extensions
            );
        }

        Ok(classification)
    }
}

/// Video files below `dir` whose name contains any of the partial names, case-insensitively.
///
/// Paths are relative to `dir` and sorted. No partial names matches every video.
pub fn find_videos<S: AsRef<str>>(dir: &Path, partial_names: &[S], video_extensions: &[String]) -> Result<Vec<PathBuf>> {
    let partials: Vec<String> = partial_names
        .iter()
        .map(|name| name.as_ref().to_lowercase())
        .collect();

    let mut found = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !video_extensions.contains(&lowercase_extension(entry.path())) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        if partials.is_empty() || partials.iter().any(|partial| name.contains(partial.as_str())) {
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            found.insert(relative.to_path_buf());
        }
    }
    Ok(found.into_iter().collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
