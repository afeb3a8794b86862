//! Movie metadata lookup
//!
//! Search results are mapped into [`CandidateRecord`] at the service boundary;
//! nothing service-specific leaves the implementation modules.

pub mod imdb;
pub mod resolver;

pub use imdb::ImdbClient;
pub use resolver::{MetadataResolver, SearchState};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Separator between fields of a compact line. Stripped from titles, so the id is always the first field.
pub const UNIQUE_SEPARATOR: &str = "±";

/// One search hit, or a confirmed record once the rating has been fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Numeric IMDb id without the `tt` prefix
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    /// Only present on records loaded through [`MetadataService::details`]
    pub rating: Option<f32>,
}

impl CandidateRecord {
    pub fn new(id: &str, title: &str, year: Option<i32>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            year,
            rating: None,
        }
    }

    fn year_label(&self) -> String {
        self.year
            .map(|year| year.to_string())
            .unwrap_or_else(|| "None".to_string())
    }

    /// Title safe to show inside a compact line
    fn display_title(&self) -> String {
        self.title
            .replace(UNIQUE_SEPARATOR, "")
            .chars()
            .filter(|c| !matches!(c, '&' | '(' | ')' | '\'' | '"'))
            .collect()
    }

    /// `<id> ± <title> ± <year> ± <url>`
    pub fn compact_line(&self, detail_url: &str) -> String {
        format!(
            "{id} {sep} {title} {sep} {year} {sep} {url}",
            id = self.id,
            sep = UNIQUE_SEPARATOR,
            title = self.display_title(),
            year = self.year_label(),
            url = detail_url,
        )
    }

    /// Multi-line write-up of a confirmed record
    pub fn write_up(&self, detail_url: &str) -> String {
        let rating = self
            .rating
            .map(|rating| rating.to_string())
            .unwrap_or_else(|| "Not rated".to_string());
        format!(
            "{} ({})\nRating: {}\n{}",
            self.title,
            self.year_label(),
            rating,
            detail_url
        )
    }
}

/// Recover the id from a line produced by [`CandidateRecord::compact_line`]
pub fn parse_compact_id(line: &str) -> Option<&str> {
    let id = line.split(UNIQUE_SEPARATOR).next()?.trim();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Remote movie database
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Ranked candidates for a free-text query, without ratings
    async fn search(&self, query: &str) -> Result<Vec<CandidateRecord>>;

    /// Full record for an id, including the rating when the title has one
    async fn details(&self, id: &str) -> Result<CandidateRecord>;

    /// Detail page URL for an id
    fn detail_url(&self, id: &str) -> String;

    /// Site search URL for a "+" separated slug
    fn search_url(&self, slug: &str) -> String;
}
