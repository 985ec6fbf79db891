//! Generated cover images.
//!
//! Covers are best-effort: every failure ends in the placeholder path and a
//! warning, never an error for the caller.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::storage::ObjectStorage;
use crate::types::{ContentType, MediaRecord, PLACEHOLDER_IMAGE};

pub const COVER_SIZE: &str = "768x1024";
const COVER_CONTENT_TYPE: &str = "image/png";

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// URLs of the generated images for `prompt`.
    async fn generate(&self, prompt: &str, size: &str, watermark: bool) -> Result<Vec<String>>;
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default, alias = "imageUrls")]
    image_urls: Vec<String>,
}

pub struct HttpImageGenerator {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpImageGenerator {
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building image generation HTTP client")?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string).filter(|k| !k.is_empty()),
            client,
        })
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, prompt: &str, size: &str, watermark: bool) -> Result<Vec<String>> {
        let body = serde_json::json!({ "prompt": prompt, "size": size, "watermark": watermark });
        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("image generation request to {}", self.endpoint))?
            .error_for_status()
            .context("image endpoint returned an error status")?;
        let data: GenerateResponse = resp.json().await.context("parsing image generation response")?;
        Ok(data.image_urls)
    }
}

/// Prompt for a record's cover, styled per content type.
pub fn cover_prompt(record: &MediaRecord) -> String {
    let genres = record.genre_tags.join("、");
    let style = match record.content_type {
        ContentType::Novel => "book cover, minimalist design, elegant typography, literary atmosphere",
        ContentType::Anime => "anime poster, vibrant colors, dynamic characters, Japanese animation style",
        ContentType::TvSeries => "TV series poster, cinematic lighting, dramatic composition, main cast",
        ContentType::VarietyShow => "variety show poster, bright and lively, colorful stage, cheerful hosts",
        ContentType::ShortDrama => "short drama poster, romantic mood, close-up of leads, modern city",
        ContentType::Movie => "movie poster, cinematic, high contrast, theatrical release style",
    };
    format!("{style}, title \"{}\", genre {genres}, high quality, portrait orientation", record.title)
}

pub struct CoverGenerator {
    images: Option<Arc<dyn ImageGenerator>>,
    storage: Option<Arc<dyn ObjectStorage>>,
    client: reqwest::Client,
    batch_size: usize,
    batch_delay: Duration,
    url_ttl: Duration,
}

impl CoverGenerator {
    pub fn new(
        images: Option<Arc<dyn ImageGenerator>>,
        storage: Option<Arc<dyn ObjectStorage>>,
        client: reqwest::Client,
        batch_size: usize,
        batch_delay: Duration,
        url_ttl: Duration,
    ) -> Self {
        Self { images, storage, client, batch_size: batch_size.max(1), batch_delay, url_ttl }
    }

    pub fn is_available(&self) -> bool { self.images.is_some() && self.storage.is_some() }

    /// Generated cover URL for `record`, or the placeholder path on any failure.
    pub async fn generate_cover_for_item(&self, record: &MediaRecord) -> String {
        match self.try_generate(record).await {
            Ok(url) => {
                info!(title = %record.title, "cover generated");
                url
            }
            Err(e) => {
                warn!(title = %record.title, error = %format!("{e:#}"), "using placeholder cover");
                PLACEHOLDER_IMAGE.to_string()
            }
        }
    }

    async fn try_generate(&self, record: &MediaRecord) -> Result<String> {
        let (Some(images), Some(storage)) = (&self.images, &self.storage) else {
            bail!("image generation or storage not configured");
        };
        let prompt = cover_prompt(record);
        debug!(prompt = %prompt, "requesting cover");
        let urls = images.generate(&prompt, COVER_SIZE, false).await?;
        let Some(first) = urls.first() else {
            bail!("image generator returned no images");
        };
        let bytes = self
            .client
            .get(first)
            .send()
            .await
            .with_context(|| format!("downloading generated image {first}"))?
            .error_for_status()
            .context("image download returned an error status")?
            .bytes()
            .await
            .context("reading generated image body")?;
        let key = format!("covers/{}.png", uuid::Uuid::new_v4());
        let key = storage.upload_file(bytes.to_vec(), &key, COVER_CONTENT_TYPE).await?;
        storage.presigned_url(&key, self.url_ttl).await
    }

    /// Replace every record's cover, a batch at a time. Keeps input order.
    pub async fn generate_covers_for_items(&self, records: Vec<MediaRecord>) -> Vec<MediaRecord> {
        let total = records.len().div_ceil(self.batch_size);
        let mut out = Vec::with_capacity(records.len());
        for (i, chunk) in records.chunks(self.batch_size).enumerate() {
            info!(batch = i + 1, total, size = chunk.len(), "generating cover batch");
            let covers = futures::future::join_all(chunk.iter().map(|r| self.generate_cover_for_item(r))).await;
            out.extend(chunk.iter().cloned().zip(covers).map(|(mut r, cover)| {
                r.cover_image_ref = cover;
                r
            }));
            if i + 1 < total && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }
        out
    }
}
