//! Directory-name normalization into progressively relaxed search terms
//!
//! Release directory names look like `The.Matrix.1999.1080p.BluRay-GROUP`. The
//! trailing tokens are usually noise (quality, year, release group), so the
//! search starts with every token and drops the rightmost one at each step.

use deunicode::deunicode;

/// Separator used between slug tokens. Tokens are alphanumeric, so it never collides.
pub const TOKEN_SEPARATOR: char = '±';

/// Slugify a name: lowercase alphanumeric runs joined by `separator`
pub fn slugify(name: &str, separator: &str) -> String {
    slug_tokens(name).join(separator)
}

/// Lowercase ASCII alphanumeric tokens of a name, in order. Accented and
/// non-Latin letters are transliterated first (`Amélie` becomes `amelie`).
pub fn slug_tokens(name: &str) -> Vec<String> {
    deunicode(name)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

/// Slug with `+` separators, ready to paste into a search URL or command line
pub fn search_slug(name: &str) -> String {
    slugify(name, "+")
}

/// Ordered token groups, most specific first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relaxation {
    tokens: Vec<String>,
}

impl Relaxation {
    /// Start a relaxation from a raw directory name
    pub fn from_name(name: &str) -> Self {
        let slugged = slugify(name, &TOKEN_SEPARATOR.to_string());
        let tokens = slugged
            .split(TOKEN_SEPARATOR)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        Self { tokens }
    }

    /// A single-group relaxation from a free-text query typed by the user
    pub fn from_query(query: &str) -> Self {
        let query = query.trim();
        let tokens = if query.is_empty() {
            Vec::new()
        } else {
            vec![query.to_string()]
        };
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Current query: remaining tokens joined by spaces
    pub fn query(&self) -> String {
        self.tokens.join(" ")
    }

    /// Drop the rightmost token; returns false once nothing is left
    pub fn relax(&mut self) -> bool {
        self.tokens.pop();
        !self.tokens.is_empty()
    }
}

impl Iterator for Relaxation {
    type Item = Vec<String>;

    /// Yields the current group, then relaxes
    fn next(&mut self) -> Option<Self::Item> {
        if self.tokens.is_empty() {
            return None;
        }
        let group = self.tokens.clone();
        self.tokens.pop();
        Some(group)
    }
}
