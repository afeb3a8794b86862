//! Progressive-relaxation search with human confirmation

use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{parse_compact_id, CandidateRecord, MetadataService};
use crate::chooser::Chooser;
use crate::naming::Relaxation;

/// Transient state of one resolution attempt
#[derive(Debug, Clone)]
pub struct SearchState {
    /// Token groups still to try, most specific first
    pub groups: Relaxation,
    /// Candidates returned by the most recent search
    pub candidates: Vec<CandidateRecord>,
    /// Line picked by the user, if any
    pub chosen: Option<String>,
    /// Whether the single free-text retry has been spent
    pub fallback_used: bool,
    /// Searches issued so far
    pub searches: usize,
}

impl SearchState {
    pub fn new(name: &str) -> Self {
        Self {
            groups: Relaxation::from_name(name),
            candidates: Vec::new(),
            chosen: None,
            fallback_used: false,
            searches: 0,
        }
    }

    /// Candidate matching the chosen line's id
    pub fn chosen_record(&self) -> Option<&CandidateRecord> {
        let id = parse_compact_id(self.chosen.as_deref()?)?;
        self.candidates.iter().find(|candidate| candidate.id == id)
    }
}

/// Resolves a movie directory name to a confirmed metadata record
pub struct MetadataResolver<'a> {
    service: &'a dyn MetadataService,
    chooser: &'a dyn Chooser,
    verbose: bool,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(service: &'a dyn MetadataService, chooser: &'a dyn Chooser, verbose: bool) -> Self {
        Self {
            service,
            chooser,
            verbose,
        }
    }

    /// Search for the directory, relaxing the query until the user picks a title.
    ///
    /// Once the name's tokens are exhausted the user may type one free-text
    /// query; if that yields no pick either, there is no result.
    pub async fn resolve(&self, movie_dir: &Path) -> Result<Option<CandidateRecord>> {
        let name = movie_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut state = SearchState::new(&name);

        if state.groups.is_empty() && !self.ask_for_query(&mut state).await? {
            return Ok(None);
        }

        while !state.groups.is_empty() {
            let query = state.groups.query();
            info!("🔍 Searching IMDb with: {}", query);
            state.searches += 1;

            state.candidates = match self.service.search(&query).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("IMDb search failed for '{}': {}", query, e);
                    Vec::new()
                }
            };

            if !state.candidates.is_empty() {
                let lines: Vec<String> = state
                    .candidates
                    .iter()
                    .map(|candidate| candidate.compact_line(&self.service.detail_url(&candidate.id)))
                    .collect();
                if !self.verbose {
                    println!("\nSelect IMDb title for the directory: '{}'", movie_dir.display());
                }

                state.chosen = self.chooser.choose(&lines).await?;
                if state.chosen.is_some() {
                    break;
                }
            }

            // Nothing good was offered; drop the last token and search again
            if !state.groups.relax() && !self.ask_for_query(&mut state).await? {
                break;
            }
        }

        let record = state.chosen_record().cloned();
        match &record {
            Some(record) => debug!("Chosen IMDb title {} after {} searches", record.id, state.searches),
            None => info!("No IMDb title chosen for '{}'", name),
        }
        Ok(record)
    }

    /// Spend the single free-text retry; false when it was already spent or left blank
    async fn ask_for_query(&self, state: &mut SearchState) -> Result<bool> {
        if state.fallback_used {
            return Ok(false);
        }
        state.fallback_used = true;

        match self.chooser.prompt("Type a IMDb query").await? {
            Some(query) => {
                state.groups = Relaxation::from_query(&query);
                Ok(!state.groups.is_empty())
            }
            None => Ok(false),
        }
    }

    /// Full write-up of a confirmed record; the only place ratings are fetched
    pub async fn write_up(&self, record: &CandidateRecord) -> String {
        if self.verbose {
            info!("🎬 Loading movie {} from IMDb", record.id);
        }
        let mut confirmed = record.clone();
        match self.service.details(&record.id).await {
            Ok(details) => confirmed.rating = details.rating,
            Err(e) => warn!("Could not load details for {}: {}", record.id, e),
        }
        confirmed.write_up(&self.service.detail_url(&record.id))
    }

    pub fn detail_url(&self, record: &CandidateRecord) -> String {
        self.service.detail_url(&record.id)
    }
}
