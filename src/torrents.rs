//! Transmission RPC client, used to find the directories of current torrents

use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TransmissionConfig;
use crate::library::NameFilter;

const SESSION_HEADER: &str = "X-Transmission-Session-Id";

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: String,
    #[serde(default)]
    arguments: Option<TorrentList>,
}

#[derive(Debug, Deserialize)]
struct TorrentList {
    #[serde(default)]
    torrents: Vec<Torrent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Torrent {
    pub name: String,
    #[serde(rename = "downloadDir")]
    pub download_dir: String,
    #[serde(default)]
    pub files: Vec<TorrentFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TorrentFile {
    /// Path relative to the download directory
    pub name: String,
}

/// Local directory of a torrent: the first (sorted) parent of its files, under `prefix`
pub fn torrent_dir(torrent: &Torrent, prefix: &Path) -> Option<PathBuf> {
    let download_dir = prefix.join(torrent.download_dir.trim_start_matches('/'));
    torrent
        .files
        .iter()
        .filter_map(|file| download_dir.join(&file.name).parent().map(Path::to_path_buf))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .next()
}

pub struct TransmissionClient {
    client: Client,
    rpc_url: String,
    download_prefix: PathBuf,
    session_id: Mutex<Option<String>>,
}

impl TransmissionClient {
    pub fn new(config: &TransmissionConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            download_prefix: config.download_prefix.clone(),
            session_id: Mutex::new(None),
        })
    }

    fn current_session(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|guard| guard.clone())
    }

    fn remember_session(&self, id: String) {
        if let Ok(mut guard) = self.session_id.lock() {
            *guard = Some(id);
        }
    }

    /// All torrents known to Transmission, with their files
    pub async fn torrents(&self) -> Result<Vec<Torrent>> {
        let body = json!({
            "method": "torrent-get",
            "arguments": { "fields": ["name", "downloadDir", "files"] }
        });

        // The first call may be refused with 409 and a fresh session id
        for _ in 0..2 {
            let mut request = self.client.post(&self.rpc_url).json(&body);
            if let Some(session) = self.current_session() {
                request = request.header(SESSION_HEADER, session);
            }

            let response = request.send().await?;
            if response.status() == StatusCode::CONFLICT {
                let session = response
                    .headers()
                    .get(SESSION_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| anyhow!("Transmission refused the request without a session id"))?;
                debug!("New Transmission session id: {}", session);
                self.remember_session(session.to_string());
                continue;
            }
            if !response.status().is_success() {
                return Err(anyhow!("Transmission RPC error {}: {}", response.status(), self.rpc_url));
            }

            return parse_torrent_get(&response.text().await?);
        }

        Err(anyhow!("Transmission session handshake failed: {}", self.rpc_url))
    }

    /// Local directories of current torrents whose directory name passes the filter
    pub async fn torrent_dirs(&self, filter: &NameFilter) -> Result<Vec<PathBuf>> {
        let torrents = self.torrents().await?;
        info!("🧲 {} torrents in Transmission", torrents.len());

        Ok(torrents
            .iter()
            .filter_map(|torrent| {
                let dir = torrent_dir(torrent, &self.download_prefix);
                if dir.is_none() {
                    debug!("Torrent without files yet: {}", torrent.name);
                }
                dir
            })
            .filter(|dir| {
                dir.file_name()
                    .map(|name| filter.matches(&name.to_string_lossy()))
                    .unwrap_or(false)
            })
            .collect())
    }
}

/// Torrents of a `torrent-get` response body
pub fn parse_torrent_get(json: &str) -> Result<Vec<Torrent>> {
    let response: RpcResponse = serde_json::from_str(json)?;
    if response.result != "success" {
        return Err(anyhow!("Transmission RPC failed: {}", response.result));
    }
    Ok(response.arguments.map(|list| list.torrents).unwrap_or_default())
}
