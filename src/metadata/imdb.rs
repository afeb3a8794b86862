//! IMDb client: suggestion endpoint for search, title page for details

use super::{CandidateRecord, MetadataService};
use crate::config::MetadataConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    d: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    id: String,
    #[serde(rename = "l")]
    label: Option<String>,
    #[serde(rename = "y")]
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct TitleJsonLd {
    name: Option<String>,
    #[serde(rename = "datePublished")]
    date_published: Option<String>,
    #[serde(rename = "aggregateRating")]
    aggregate_rating: Option<AggregateRating>,
}

#[derive(Debug, Deserialize)]
struct AggregateRating {
    #[serde(rename = "ratingValue")]
    rating_value: Option<serde_json::Value>,
}

/// IMDb metadata service
#[derive(Clone)]
pub struct ImdbClient {
    client: Client,
    config: MetadataConfig,
}

impl ImdbClient {
    pub fn new(config: MetadataConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    fn suggestion_url(&self, query: &str) -> String {
        let query = query.trim().to_lowercase();
        let bucket = query
            .chars()
            .next()
            .filter(|c| c.is_ascii_alphanumeric())
            .unwrap_or('x');
        format!(
            "{}/{}/{}.json",
            self.config.suggestion_endpoint.trim_end_matches('/'),
            bucket,
            urlencoding::encode(&query)
        )
    }
}

/// Map a suggestion payload to title candidates, keeping the service's ranking
pub fn parse_suggestions(json: &str) -> Result<Vec<CandidateRecord>> {
    let response: SuggestionResponse = serde_json::from_str(json)?;
    Ok(response
        .d
        .into_iter()
        .filter_map(|suggestion| {
            let id = suggestion.id.strip_prefix("tt")?.to_string();
            let title = suggestion.label?;
            Some(CandidateRecord {
                id,
                title,
                year: suggestion.year,
                rating: None,
            })
        })
        .collect())
}

/// Read title, year and rating from the JSON-LD block of a title page
pub fn parse_title_page(html: &str, id: &str) -> Result<CandidateRecord> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#)
        .map_err(|e| anyhow!("invalid selector: {:?}", e))?;

    let json_ld = document
        .select(&selector)
        .filter_map(|script| serde_json::from_str::<TitleJsonLd>(&script.inner_html()).ok())
        .find(|json_ld| json_ld.name.is_some())
        .ok_or_else(|| anyhow!("No structured data on title page for {}", id))?;

    let title = json_ld.name.unwrap_or_default();
    let year = json_ld
        .date_published
        .as_deref()
        .and_then(|date| date.get(..4))
        .and_then(|year| year.parse().ok());
    let rating = json_ld
        .aggregate_rating
        .and_then(|aggregate| aggregate.rating_value)
        .and_then(|value| match value {
            serde_json::Value::Number(number) => number.as_f64().map(|n| n as f32),
            serde_json::Value::String(text) => text.parse().ok(),
            _ => None,
        });

    Ok(CandidateRecord {
        id: id.to_string(),
        title,
        year,
        rating,
    })
}

#[async_trait]
impl MetadataService for ImdbClient {
    async fn search(&self, query: &str) -> Result<Vec<CandidateRecord>> {
        let url = self.suggestion_url(query);
        debug!("Querying IMDb suggestions: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("HTTP error {}: {}", response.status(), url));
        }

        let candidates = parse_suggestions(&response.text().await?)?;
        debug!("IMDb returned {} titles for '{}'", candidates.len(), query);
        Ok(candidates)
    }

    async fn details(&self, id: &str) -> Result<CandidateRecord> {
        let url = format!("{}/", self.detail_url(id));
        debug!("Fetching title page: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("HTTP error {}: {}", response.status(), url));
        }

        parse_title_page(&response.text().await?, id)
    }

    fn detail_url(&self, id: &str) -> String {
        format!("{}{}", self.config.title_url, id)
    }

    fn search_url(&self, slug: &str) -> String {
        format!("{}{}", self.config.search_url, slug)
    }
}
