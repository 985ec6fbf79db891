use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::error::DegradedReason;
use crate::types::ContentType;

const SOURCE: &str = "tmdb";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverResponse {
    #[serde(default)]
    pub results: Vec<MovieDbResult>,
}

/// One entry of a `/discover` page. Movies carry `title`/`release_date`,
/// TV shows `name`/`first_air_date`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieDbResult {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub origin_country: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Discover endpoint media segment and genre filter for a content type.
pub fn discover_target(content_type: ContentType) -> Option<(&'static str, Option<u32>)> {
    match content_type {
        ContentType::Anime => Some(("tv", Some(16))),
        ContentType::TvSeries => Some(("tv", Some(18))),
        ContentType::Movie => Some(("movie", None)),
        _ => None,
    }
}

pub struct MovieDbClient {
    base_url: String,
    api_key: String,
    language: String,
    client: reqwest::Client,
}

impl MovieDbClient {
    pub fn new(base_url: &str, api_key: &str, language: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building movie database HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: language.to_string(),
            client,
        })
    }

    pub(crate) fn discover_url(&self, media: &str, genre: Option<u32>) -> anyhow::Result<Url> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
            ("page", "1".to_string()),
        ];
        if let Some(g) = genre {
            params.push(("with_genres", g.to_string()));
        }
        Url::parse_with_params(&format!("{}/discover/{}", self.base_url, media), &params)
            .with_context(|| format!("invalid movie database base url: {}", self.base_url))
    }

    /// First page of `/discover` results for the type, at most `count` entries.
    pub async fn discover(&self, content_type: ContentType, count: usize) -> Result<(&'static str, Vec<MovieDbResult>), DegradedReason> {
        let Some((media, genre)) = discover_target(content_type) else {
            return Err(DegradedReason::UnsupportedType {
                provider: SOURCE.to_string(),
                content_type: content_type.to_string(),
            });
        };
        let url = self.discover_url(media, genre).map_err(|e| DegradedReason::query_failed(SOURCE, &e))?;
        info!(%content_type, media, count, "movie database discover");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DegradedReason::query_failed(SOURCE, &anyhow::Error::new(e)))?;
        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "movie database request rejected");
            return Err(DegradedReason::MovieDbStatus(status.as_u16()));
        }
        let mut page: DiscoverResponse = resp
            .json()
            .await
            .map_err(|e| DegradedReason::query_failed(SOURCE, &anyhow::Error::new(e)))?;
        page.results.truncate(count);
        Ok((media, page.results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MovieDbClient {
        MovieDbClient::new("https://api.themoviedb.org/3/", "demo", "zh-CN", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn discover_url_carries_genre_and_language() {
        let url = client().discover_url("tv", Some(16)).unwrap();
        assert_eq!(url.path(), "/3/discover/tv");
        let q: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(q.contains(&("with_genres".into(), "16".into())));
        assert!(q.contains(&("language".into(), "zh-CN".into())));
        assert!(q.contains(&("api_key".into(), "demo".into())));
    }

    #[test]
    fn movie_discover_has_no_genre_filter() {
        let url = client().discover_url("movie", None).unwrap();
        assert!(url.query_pairs().all(|(k, _)| k != "with_genres"));
    }

    #[tokio::test]
    async fn unsupported_types_are_reported() {
        let err = client().discover(ContentType::Novel, 5).await.unwrap_err();
        assert!(matches!(err, DegradedReason::UnsupportedType { .. }));
    }

    #[test]
    fn parses_discover_payload() {
        let json = r#"{"page":1,"results":[
            {"id":1429,"name":"进击的巨人","overview":"人类与巨人","vote_average":8.7,
             "poster_path":"/a.jpg","genre_ids":[16,10759],"first_air_date":"2013-04-07","origin_country":["JP"]}
        ]}"#;
        let page: DiscoverResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].name.as_deref(), Some("进击的巨人"));
        assert!(page.results[0].title.is_none());
    }
}
