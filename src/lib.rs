pub mod aggregator;
pub mod config;
pub mod covers;
pub mod error;
pub mod mapping;
pub mod normalize;
pub mod random;
pub mod sources;
pub mod storage;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::covers::{CoverGenerator, ImageGenerator};
    pub use crate::error::{ConfigError, DegradedReason};
    pub use crate::random::RandomSource;
    pub use crate::sources::{SearchProvider, SourceKind};
    pub use crate::storage::ObjectStorage;
    pub use crate::types::{CompletionStatus, ContentType, CrawlOutcome, CrawlRequest, MediaRecord, Provenance, RawSearchItem, SearchResponse};
    pub use crate::{Capabilities, MediaCrawler};
}

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregator::Aggregator;
use crate::config::Settings;
use crate::covers::{CoverGenerator, HttpImageGenerator, ImageGenerator};
use crate::random::RandomSource;
use crate::sources::{HttpSearchClient, MovieDbClient, SearchProvider, SourceKind};
use crate::storage::{FsObjectStorage, ObjectStorage};
use crate::types::{ContentType, CrawlOutcome, CrawlRequest, MediaRecord};

/// Externally provided capabilities. Anything left `None` is treated as unavailable.
#[derive(Default)]
pub struct Capabilities {
    pub search: Option<Arc<dyn SearchProvider>>,
    pub images: Option<Arc<dyn ImageGenerator>>,
    pub storage: Option<Arc<dyn ObjectStorage>>,
    /// Shared random source; built from `Settings::seed` when absent.
    pub rng: Option<Arc<RandomSource>>,
}

/// Async library entry point. Owns the dispatcher and the cover generator.
pub struct MediaCrawler {
    aggregator: Aggregator,
    covers: CoverGenerator,
}

impl MediaCrawler {
    /// Build with injected capabilities; the movie database client comes from `settings`.
    pub fn new(settings: &Settings, caps: Capabilities) -> Result<Self> {
        let rng = caps.rng.unwrap_or_else(|| Arc::new(RandomSource::from_optional_seed(settings.seed)));
        let timeout = settings.http_timeout();
        let movie_db = MovieDbClient::new(&settings.tmdb_base_url, &settings.tmdb_api_key, &settings.tmdb_language, timeout)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building image download client")?;
        if caps.search.is_none() {
            warn!("no search capability configured, crawls will use fallback records");
        }
        Ok(Self {
            aggregator: Aggregator::new(caps.search, movie_db, rng, settings.default_year),
            covers: CoverGenerator::new(
                caps.images,
                caps.storage,
                client,
                settings.cover_batch_size,
                settings.cover_batch_delay(),
                settings.cover_url_ttl(),
            ),
        })
    }

    /// Build HTTP capabilities for every endpoint configured in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = settings.http_timeout();
        let mut caps = Capabilities::default();
        if let Some(endpoint) = settings.search_endpoint.as_deref() {
            let client = HttpSearchClient::new(endpoint, settings.search_api_key.as_deref(), timeout)?;
            caps.search = Some(Arc::new(client));
        }
        if let Some(endpoint) = settings.image_endpoint.as_deref() {
            let client = HttpImageGenerator::new(endpoint, settings.image_api_key.as_deref(), timeout)?;
            caps.images = Some(Arc::new(client));
            match FsObjectStorage::from_dir(settings.storage_dir.as_deref()) {
                Ok(store) => {
                    info!(root = %store.root().display(), "object storage ready");
                    caps.storage = Some(Arc::new(store));
                }
                Err(e) => warn!(error = %format!("{e:#}"), "object storage unavailable"),
            }
        }
        Self::new(settings, caps)
    }

    pub fn has_search(&self) -> bool { self.aggregator.has_search() }

    pub async fn crawl_from_web(&self, request: &CrawlRequest) -> CrawlOutcome { self.aggregator.crawl_from_web(request).await }
    pub async fn crawl_multi_source(&self, request: &CrawlRequest) -> CrawlOutcome { self.aggregator.crawl_multi_source(request).await }
    pub async fn crawl_all(&self, count_per_type: usize) -> BTreeMap<ContentType, Vec<MediaRecord>> { self.aggregator.crawl_all(count_per_type).await }

    pub async fn generate_cover_for_item(&self, record: &MediaRecord) -> String { self.covers.generate_cover_for_item(record).await }
    pub async fn generate_covers_for_items(&self, records: Vec<MediaRecord>) -> Vec<MediaRecord> { self.covers.generate_covers_for_items(records).await }

    pub fn default_sources(&self, content_type: ContentType) -> Vec<SourceKind> { sources::default_sources(content_type) }
}
