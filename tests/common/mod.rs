#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use movie_curator::config::{Config, ConfigBuilder};
use movie_curator::{CandidateRecord, Chooser, MetadataService};

/// Minimal Matroska header, recognised as binary video content
pub const MKV_HEAD: &[u8] = &[
    0x1A, 0x45, 0xDF, 0xA3, 0x93, 0x42, 0x82, 0x88, b'm', b'a', b't', b'r', b'o', b's', b'k', b'a',
    0x42, 0x87, 0x81, 0x04, 0x42, 0x85, 0x81, 0x02,
];

/// Metadata service answering from a fixed table and counting calls
#[derive(Clone, Default)]
pub struct FakeImdb {
    results: HashMap<String, Vec<CandidateRecord>>,
    ratings: HashMap<String, f32>,
    pub searches: Arc<AtomicUsize>,
    pub details: Arc<AtomicUsize>,
}

impl FakeImdb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, query: &str, results: Vec<CandidateRecord>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    pub fn with_rating(mut self, id: &str, rating: f32) -> Self {
        self.ratings.insert(id.to_string(), rating);
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataService for FakeImdb {
    async fn search(&self, query: &str) -> Result<Vec<CandidateRecord>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn details(&self, id: &str) -> Result<CandidateRecord> {
        self.details.fetch_add(1, Ordering::SeqCst);
        let found = self
            .results
            .values()
            .flatten()
            .find(|record| record.id == id)
            .cloned()
            .unwrap_or_else(|| CandidateRecord::new(id, "Unknown", None));
        Ok(CandidateRecord {
            rating: self.ratings.get(id).copied(),
            ..found
        })
    }

    fn detail_url(&self, id: &str) -> String {
        format!("https://www.imdb.com/title/tt{}", id)
    }

    fn search_url(&self, slug: &str) -> String {
        format!("https://www.imdb.com/find?q={}", slug)
    }
}

/// Chooser picking the first line that contains `needle`
#[derive(Clone, Default)]
pub struct FakeChooser {
    needle: Option<String>,
    /// Fail every pick, like fzf exiting with an unexpected status
    broken: bool,
    pub choices: Arc<AtomicUsize>,
    pub prompts: Arc<AtomicUsize>,
}

impl FakeChooser {
    pub fn picking(needle: &str) -> Self {
        Self {
            needle: Some(needle.to_string()),
            ..Self::default()
        }
    }

    pub fn declining() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn choice_count(&self) -> usize {
        self.choices.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Chooser for FakeChooser {
    async fn choose(&self, lines: &[String]) -> Result<Option<String>> {
        self.choices.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(anyhow!("fzf failed with exit status: 2"));
        }
        Ok(self
            .needle
            .as_ref()
            .and_then(|needle| lines.iter().find(|line| line.contains(needle.as_str())).cloned()))
    }

    async fn prompt(&self, _message: &str) -> Result<Option<String>> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn confirm(&self, _message: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Temporary library with `movies`, `odd-movies` and an empty `completed` inbox
pub struct TestLibrary {
    pub temp: TempDir,
    pub config: Config,
}

impl TestLibrary {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let movies = temp.path().join("movies");
        let odd = temp.path().join("odd-movies");
        let inbox = temp.path().join("completed");
        for dir in [&movies, &odd, &inbox] {
            std::fs::create_dir_all(dir).unwrap();
        }

        let config = ConfigBuilder::new()
            .with_roots(vec![movies, odd])
            .with_inbox(inbox)
            .build();
        Self { temp, config }
    }

    pub fn movies(&self) -> PathBuf {
        self.temp.path().join("movies")
    }

    pub fn inbox(&self) -> PathBuf {
        self.temp.path().join("completed")
    }

    pub fn movie_dir(&self, name: &str) -> PathBuf {
        let dir = self.movies().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn movie_file(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, MKV_HEAD).unwrap();
        path
    }
}

pub fn matrix() -> CandidateRecord {
    CandidateRecord::new("0133093", "The Matrix", Some(1999))
}

pub fn heat() -> CandidateRecord {
    CandidateRecord::new("0113277", "Heat", Some(1995))
}
