use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;

const ENV_PREFIX: &str = "MEDIACRAWL_";

/// Runtime settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search_endpoint: Option<String>,
    pub search_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub tmdb_api_key: String,
    pub tmdb_language: String,
    pub image_endpoint: Option<String>,
    pub image_api_key: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub cover_batch_size: usize,
    pub cover_batch_delay_ms: u64,
    pub cover_url_ttl_secs: u64,
    pub default_year: i32,
    pub http_timeout_secs: u64,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_endpoint: None,
            search_api_key: None,
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            tmdb_api_key: "demo".to_string(),
            tmdb_language: "zh-CN".to_string(),
            image_endpoint: None,
            image_api_key: None,
            storage_dir: None,
            cover_batch_size: 3,
            cover_batch_delay_ms: 1000,
            cover_url_ttl_secs: 7 * 24 * 60 * 60,
            default_year: 2024,
            http_timeout_secs: 30,
            seed: None,
        }
    }
}

impl Settings {
    /// File settings (explicit path, else the user config dir if present), then env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        settings.apply_env_with(|k| std::env::var(k).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml(&text, path)
    }

    fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
    }

    /// Apply `MEDIACRAWL_*` (and `TMDB_API_KEY`) overrides read through `lookup`.
    /// Unparseable numeric values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("SEARCH_ENDPOINT") { self.search_endpoint = Some(v); }
        if let Some(v) = var("SEARCH_API_KEY") { self.search_api_key = Some(v); }
        if let Some(v) = var("TMDB_BASE_URL") { self.tmdb_base_url = v; }
        if let Some(v) = lookup("TMDB_API_KEY").filter(|v| !v.trim().is_empty()) { self.tmdb_api_key = v; }
        if let Some(v) = var("IMAGE_ENDPOINT") { self.image_endpoint = Some(v); }
        if let Some(v) = var("IMAGE_API_KEY") { self.image_api_key = Some(v); }
        if let Some(v) = var("STORAGE_DIR") { self.storage_dir = Some(PathBuf::from(v)); }
        self.cover_batch_size = var("COVER_BATCH_SIZE").and_then(|s| s.parse().ok()).unwrap_or(self.cover_batch_size);
        self.cover_batch_delay_ms = var("COVER_BATCH_DELAY_MS").and_then(|s| s.parse().ok()).unwrap_or(self.cover_batch_delay_ms);
        self.cover_url_ttl_secs = var("COVER_URL_TTL_SECS").and_then(|s| s.parse().ok()).unwrap_or(self.cover_url_ttl_secs);
        self.default_year = var("DEFAULT_YEAR").and_then(|s| s.parse().ok()).unwrap_or(self.default_year);
        self.http_timeout_secs = var("HTTP_TIMEOUT_SECS").and_then(|s| s.parse().ok()).unwrap_or(self.http_timeout_secs);
        if let Some(seed) = var("SEED").and_then(|s| s.parse().ok()) { self.seed = Some(seed); }
    }

    pub fn http_timeout(&self) -> Duration { Duration::from_secs(self.http_timeout_secs) }
    pub fn cover_batch_delay(&self) -> Duration { Duration::from_millis(self.cover_batch_delay_ms) }
    pub fn cover_url_ttl(&self) -> Duration { Duration::from_secs(self.cover_url_ttl_secs) }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "mediacrawl", "mediacrawl").map(|p| p.config_dir().join("config.toml"))
}
