use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, DegradedReason};
use crate::sources::SourceKind;

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholders/default.jpg";
pub const NO_DESCRIPTION: &str = "暂无描述";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Novel,
    Anime,
    TvSeries,
    VarietyShow,
    ShortDrama,
    Movie,
}

impl ContentType {
    /// The five catalog types crawled by `crawl_all`.
    pub const CORE: [ContentType; 5] = [
        ContentType::Novel,
        ContentType::Anime,
        ContentType::TvSeries,
        ContentType::VarietyShow,
        ContentType::ShortDrama,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ContentType::Novel => "novel",
            ContentType::Anime => "anime",
            ContentType::TvSeries => "tv-series",
            ContentType::VarietyShow => "variety-show",
            ContentType::ShortDrama => "short-drama",
            ContentType::Movie => "movie",
        }
    }

    /// Display label used in search queries and catalog UIs.
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Novel => "小说",
            ContentType::Anime => "动漫",
            ContentType::TvSeries => "电视剧",
            ContentType::VarietyShow => "综艺",
            ContentType::ShortDrama => "短剧",
            ContentType::Movie => "电影",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.slug()) }
}

impl FromStr for ContentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let all = ContentType::CORE.iter().chain(std::iter::once(&ContentType::Movie));
        for ct in all {
            if t.eq_ignore_ascii_case(ct.slug()) || t == ct.label() {
                return Ok(*ct);
            }
        }
        match t.to_ascii_lowercase().as_str() {
            "tv" | "tv_series" | "series" => Ok(ContentType::TvSeries),
            "variety" | "variety_show" => Ok(ContentType::VarietyShow),
            "short" | "short_drama" => Ok(ContentType::ShortDrama),
            _ => Err(ConfigError::UnknownContentType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionStatus {
    Complete,
    Ongoing,
    /// Accepted on input only; no source produces it.
    Updating,
}

impl CompletionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CompletionStatus::Complete => "完结",
            CompletionStatus::Ongoing => "连载中",
            CompletionStatus::Updating => "更新中",
        }
    }
}

/// Which fields of a record were guessed rather than read from source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub rating_guessed: bool,
    pub genres_guessed: bool,
    pub tags_guessed: bool,
    pub synthetic: bool,
}

impl Provenance {
    pub fn synthetic() -> Self {
        Self { rating_guessed: true, genres_guessed: true, tags_guessed: true, synthetic: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub content_type: ContentType,
    pub country: String,
    pub release_year: i32,
    pub rating_score: f32,
    pub cover_image_ref: String,
    pub short_description: String,
    pub genre_tags: Vec<String>,
    pub free_tags: Vec<String>,
    pub completion_status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub data_source_label: String,
    #[serde(default)]
    pub provenance: Provenance,
}

impl MediaRecord {
    /// Key used for per-batch deduplication.
    pub fn title_key(&self) -> String { self.title.trim().to_lowercase() }
}

/// One item as returned by a search capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
}

impl RawSearchItem {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>, url: impl Into<String>) -> Self {
        Self { title: title.into(), snippet: snippet.into(), url: url.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, alias = "web_items")]
    pub items: Vec<RawSearchItem>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub content_type: ContentType,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<SourceKind>>,
}

fn default_count() -> usize { 10 }

impl CrawlRequest {
    pub fn new(content_type: ContentType, count: usize) -> Self {
        Self { content_type, count, keyword: None, sources: None }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        let k = keyword.into();
        self.keyword = Some(k).filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceKind>) -> Self {
        self.sources = Some(sources).filter(|s| !s.is_empty());
        self
    }

    pub(crate) fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub success: bool,
    pub data: Vec<MediaRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_reasons", skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<DegradedReason>,
}

impl CrawlOutcome {
    pub(crate) fn from_records(data: Vec<MediaRecord>, source: String, degraded: Vec<DegradedReason>) -> Self {
        if data.is_empty() {
            let error = degraded.last().map(|r| r.to_string()).unwrap_or_else(|| "no records produced".to_string());
            return Self { success: false, data, source: Some(source), error: Some(error), degraded };
        }
        Self { success: true, data, source: Some(source), error: None, degraded }
    }
}

fn serialize_reasons<S: serde::Serializer>(reasons: &[DegradedReason], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(reasons.iter().map(|r| r.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_parses_slug_and_label() {
        assert_eq!("anime".parse::<ContentType>().unwrap(), ContentType::Anime);
        assert_eq!("电视剧".parse::<ContentType>().unwrap(), ContentType::TvSeries);
        assert_eq!(" Short-Drama ".parse::<ContentType>().unwrap(), ContentType::ShortDrama);
        assert!("podcast".parse::<ContentType>().is_err());
    }

    #[test]
    fn content_type_serializes_kebab_case() {
        let json = serde_json::to_string(&ContentType::VarietyShow).unwrap();
        assert_eq!(json, "\"variety-show\"");
    }

    #[test]
    fn updating_status_is_accepted_on_input() {
        let status: CompletionStatus = serde_json::from_str("\"updating\"").unwrap();
        assert_eq!(status, CompletionStatus::Updating);
        assert_eq!(status.label(), "更新中");
    }

    #[test]
    fn empty_outcome_is_not_success() {
        let out = CrawlOutcome::from_records(Vec::new(), "web_search".into(), Vec::new());
        assert!(!out.success);
        assert!(out.error.is_some());
    }

    #[test]
    fn blank_keyword_is_dropped() {
        let req = CrawlRequest::new(ContentType::Novel, 3).with_keyword("   ");
        assert!(req.keyword.is_none());
    }
}
