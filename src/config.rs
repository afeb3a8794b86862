use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the movie curator
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Library layout on the mounted media server
    pub library: LibraryConfig,

    /// Sidecar marker file names
    pub markers: MarkerConfig,

    /// File classification extension sets
    pub classification: ClassificationConfig,

    /// Metadata service settings
    pub metadata: MetadataConfig,

    /// External commands invoked or suggested by the curator
    pub commands: CommandConfig,

    /// Transmission RPC settings for torrent-sourced directories
    pub transmission: TransmissionConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Movie roots, in the order their listings are interleaved
    pub roots: Vec<PathBuf>,

    /// Download inbox that must be empty before validating
    pub inbox: PathBuf,

    /// Command suggested when the first root is not mounted
    pub mount_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Report file written into directories without a movie
    pub missing_file: String,

    /// Extension of the metadata sidecar written beside the movie file
    pub metadata_extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Extensions known to be movies (lowercase, no dot)
    pub movie_extensions: Vec<String>,

    /// Broader set of video extensions used by the `videos` listing
    pub video_extensions: Vec<String>,

    /// Extensions that are never movies, even when the content is binary
    pub ignore_extensions: Vec<String>,

    /// Sniff MIME types instead of trusting extensions alone
    pub use_content_sniffing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Prefix of a title detail URL; the numeric id is appended
    pub title_url: String,

    /// Prefix of a site search URL; the "+" slug is appended
    pub search_url: String,

    /// Suggestion endpoint used for free-text search
    pub suggestion_endpoint: String,

    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Torrent search command line written into missing reports
    pub torrent_search: String,

    /// Subtitle fetcher, invoked with the movie directory as its only argument
    pub subtitles: String,

    /// Interactive chooser binary
    pub chooser: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionConfig {
    /// RPC endpoint of the Transmission daemon
    pub rpc_url: String,

    /// Local prefix under which the daemon's download dirs are mounted
    pub download_prefix: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is not set
    pub level: String,
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn lowercase_all(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_lowercase()).collect()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let root = expand_home(Path::new("~/data"));
        Self {
            roots: vec![root.join("movies"), root.join("odd-movies")],
            inbox: root.join("completed"),
            mount_hint: Some("sshfs osmc@styx:/data/ ~/data".to_string()),
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            missing_file: "missing.txt".to_string(),
            metadata_extension: "nfo".to_string(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        let mut ignore_extensions = lowercase_all(&[
            "sub", "jpg", "jpeg", "nfo", "png", "part", "srt", "dts", "ac3", "swf", "pdf", "rar",
            "ogv", "sqlite", "gif", "zip", "gz",
        ]);
        // Multi-volume archives: .r00 .. .r49
        ignore_extensions.extend((0..50).map(|index| format!("r{:02}", index)));

        Self {
            movie_extensions: lowercase_all(&["avi", "mp4", "mpg", "mkv", "wmv", "mov"]),
            video_extensions: lowercase_all(&[
                "asf", "avi", "divx", "f4v", "flc", "flv", "m4v", "mkv", "mov", "mp4", "mpa",
                "mpeg", "mpg", "ogv", "wmv",
            ]),
            ignore_extensions,
            use_content_sniffing: false,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            title_url: "https://www.imdb.com/title/tt".to_string(),
            search_url: "https://www.imdb.com/find?q=".to_string(),
            suggestion_endpoint: "https://v2.sg.media-imdb.com/suggestion".to_string(),
            request_timeout_seconds: 30,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            torrent_search: "torrent-search -a -i on1337x ".to_string(),
            subtitles: "subtitles.sh".to_string(),
            chooser: "fzf".to_string(),
        }
    }
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:9091/transmission/rpc".to_string(),
            download_prefix: expand_home(Path::new("~")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        // Try to load from various locations
        let config_paths = [
            "movie-curator.toml",
            "config/movie-curator.toml",
            "~/.config/movie-curator/config.toml",
        ];

        for path in &config_paths {
            let path = expand_home(Path::new(path));
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        // Try environment variables
        if Self::env_overrides_present() {
            return Self::from_env();
        }

        Err(anyhow!("No configuration file found"))
    }

    /// Load configuration from an explicit file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
        config.apply_env();
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    fn env_overrides_present() -> bool {
        [
            "MOVIE_CURATOR_ROOT_DIR",
            "MOVIE_CURATOR_LOG_LEVEL",
            "MOVIE_CURATOR_TRANSMISSION_URL",
        ]
        .iter()
        .any(|name| std::env::var_os(name).is_some())
    }

    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("MOVIE_CURATOR_ROOT_DIR") {
            let root = expand_home(Path::new(&root));
            self.library.roots = vec![root.join("movies"), root.join("odd-movies")];
            self.library.inbox = root.join("completed");
        }

        if let Ok(log_level) = std::env::var("MOVIE_CURATOR_LOG_LEVEL") {
            self.logging.level = log_level;
        }

        if let Ok(rpc_url) = std::env::var("MOVIE_CURATOR_TRANSMISSION_URL") {
            self.transmission.rpc_url = rpc_url;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.library.roots.is_empty() {
            return Err(anyhow!("at least one library root is required"));
        }

        if self.markers.missing_file.is_empty() || self.markers.missing_file.contains('/') {
            return Err(anyhow!("missing_file must be a plain file name"));
        }

        if self.markers.metadata_extension.is_empty() || self.markers.metadata_extension.starts_with('.') {
            return Err(anyhow!("metadata_extension must be a bare extension such as \"nfo\""));
        }

        let ignored = &self.classification.ignore_extensions;
        if let Some(ext) = self
            .classification
            .movie_extensions
            .iter()
            .find(|ext| ignored.contains(ext))
        {
            return Err(anyhow!("extension {} is both a movie and an ignored extension", ext));
        }

        url::Url::parse(&self.metadata.title_url)
            .map_err(|e| anyhow!("invalid title_url {}: {}", self.metadata.title_url, e))?;
        url::Url::parse(&self.metadata.suggestion_endpoint)
            .map_err(|e| anyhow!("invalid suggestion_endpoint {}: {}", self.metadata.suggestion_endpoint, e))?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Movie Curator Configuration:\n\
            - Roots: {}\n\
            - Inbox: {}\n\
            - Missing marker: {}\n\
            - Metadata marker extension: {}\n\
            - Movie extensions: {}\n\
            - Content sniffing: {}",
            self.library
                .roots
                .iter()
                .map(|root| root.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            self.library.inbox.display(),
            self.markers.missing_file,
            self.markers.metadata_extension,
            self.classification.movie_extensions.join(", "),
            self.classification.use_content_sniffing,
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.config.library.roots = roots;
        self
    }

    pub fn with_inbox(mut self, inbox: PathBuf) -> Self {
        self.config.library.inbox = inbox;
        self
    }

    pub fn with_content_sniffing(mut self, enable: bool) -> Self {
        self.config.classification.use_content_sniffing = enable;
        self
    }

    pub fn with_torrent_search(mut self, command: &str) -> Self {
        self.config.commands.torrent_search = command.to_string();
        self
    }

    pub fn with_subtitles_command(mut self, command: &str) -> Self {
        self.config.commands.subtitles = command.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
