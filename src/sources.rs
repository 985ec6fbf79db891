pub mod fallback;
pub mod search;
pub mod tmdb;

pub use fallback::FallbackGenerator;
pub use search::{HttpSearchClient, SearchProvider};
pub use tmdb::MovieDbClient;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::types::ContentType;

/// A data provider the dispatcher can pull records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "web_search")]
    WebSearch,
    #[serde(rename = "tmdb")]
    MovieDb,
    #[serde(rename = "douban")]
    AltSearch,
    #[serde(rename = "fallback", alias = "custom")]
    Fallback,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::WebSearch => "web_search",
            SourceKind::MovieDb => "tmdb",
            SourceKind::AltSearch => "douban",
            SourceKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web_search" | "web" | "search" => Ok(SourceKind::WebSearch),
            "tmdb" | "movie_db" | "moviedb" => Ok(SourceKind::MovieDb),
            "douban" | "alt" | "alt_search" => Ok(SourceKind::AltSearch),
            "fallback" | "custom" => Ok(SourceKind::Fallback),
            _ => Err(ConfigError::UnknownSource(s.to_string())),
        }
    }
}

/// Sources queried for a content type when the caller does not pick any.
pub fn default_sources(content_type: ContentType) -> Vec<SourceKind> {
    use SourceKind::*;
    match content_type {
        ContentType::Novel => vec![WebSearch, AltSearch],
        ContentType::Anime => vec![WebSearch, MovieDb],
        ContentType::TvSeries => vec![WebSearch, MovieDb, AltSearch],
        ContentType::VarietyShow => vec![WebSearch, AltSearch],
        ContentType::ShortDrama => vec![WebSearch],
        ContentType::Movie => vec![WebSearch, MovieDb],
    }
}

/// Sub-genre queries that tend to surface individual works rather than review articles.
pub fn search_keywords(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Novel => &["言情小说", "玄幻小说", "穿越小说", "网络小说", "都市小说", "仙侠小说", "历史小说"],
        ContentType::Anime => &["日本动漫", "国漫", "动漫番剧", "热血动漫", "恋爱动漫", "治愈动漫", "科幻动漫"],
        ContentType::TvSeries => &["国产电视剧", "美剧", "韩剧", "日剧", "英剧", "都市剧", "古装剧"],
        ContentType::VarietyShow => &["综艺节目", "真人秀", "音乐综艺", "脱口秀", "竞技综艺", "搞笑综艺"],
        ContentType::ShortDrama => &["甜宠短剧", "总裁短剧", "穿越短剧", "重生短剧", "都市短剧"],
        ContentType::Movie => &["国产电影", "科幻电影", "动画电影", "悬疑电影", "喜剧电影"],
    }
}
