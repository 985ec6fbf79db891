use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::DegradedReason;
use crate::mapping::record_from_movie_db;
use crate::normalize::{dedupe_by_title, Normalizer};
use crate::random::RandomSource;
use crate::sources::{default_sources, search_keywords, FallbackGenerator, MovieDbClient, SearchProvider, SourceKind};
use crate::types::{ContentType, CrawlOutcome, CrawlRequest, MediaRecord};

const ALT_SITE: &str = "douban.com";
const ALT_TAG: &str = "豆瓣";

/// Aggregator owns the capabilities and dispatches crawl requests across them.
///
/// Every public operation returns an outcome; source failures are logged,
/// recorded as [`DegradedReason`]s and replaced by the next tier.
pub struct Aggregator {
    search: Option<Arc<dyn SearchProvider>>,
    movie_db: MovieDbClient,
    normalizer: Normalizer,
    fallback: FallbackGenerator,
}

impl Aggregator {
    pub fn new(search: Option<Arc<dyn SearchProvider>>, movie_db: MovieDbClient, rng: Arc<RandomSource>, default_year: i32) -> Self {
        Self {
            search,
            movie_db,
            normalizer: Normalizer::new(rng.clone(), default_year),
            fallback: FallbackGenerator::new(rng, default_year),
        }
    }

    pub fn has_search(&self) -> bool { self.search.is_some() }

    /// Single web search, falling back to generated records.
    pub async fn crawl_from_web(&self, request: &CrawlRequest) -> CrawlOutcome {
        let ct = request.content_type;
        let keyword = request.keyword();
        if request.count == 0 {
            return CrawlOutcome::from_records(Vec::new(), SourceKind::WebSearch.name().to_string(), Vec::new());
        }
        let mut degraded = Vec::new();
        match self.crawl_web_items(ct, request.count, keyword).await {
            Ok(records) if !records.is_empty() => {
                info!(content_type = %ct, count = records.len(), "web crawl complete");
                return CrawlOutcome::from_records(records, SourceKind::WebSearch.name().to_string(), degraded);
            }
            Ok(_) => degraded.push(DegradedReason::no_results(SourceKind::WebSearch.name())),
            Err(reason) => degraded.push(reason),
        }
        warn!(content_type = %ct, reason = %degraded[0], "web crawl degraded to fallback");
        let records = self.fallback.generate(ct, request.count, keyword);
        CrawlOutcome::from_records(records, SourceKind::Fallback.name().to_string(), degraded)
    }

    /// Query each requested source in turn and merge the results.
    pub async fn crawl_multi_source(&self, request: &CrawlRequest) -> CrawlOutcome {
        let ct = request.content_type;
        let keyword = request.keyword();
        let sources = request.sources.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| default_sources(ct));
        let per_source = request.count.div_ceil(sources.len());
        let mut source_label = sources.iter().map(SourceKind::name).collect::<Vec<_>>().join(",");
        let mut degraded = Vec::new();
        let mut merged = Vec::new();

        for source in &sources {
            info!(source = %source, content_type = %ct, count = per_source, "crawling source");
            match self.crawl_source(*source, ct, per_source, keyword, &mut degraded).await {
                Ok(records) if records.is_empty() => {
                    debug!(source = %source, "source returned nothing");
                    degraded.push(DegradedReason::no_results(source.name()));
                }
                Ok(records) => {
                    info!(source = %source, count = records.len(), "source complete");
                    merged.extend(records);
                }
                Err(reason) => {
                    warn!(source = %source, %reason, "source failed");
                    degraded.push(reason);
                }
            }
        }

        let mut records = dedupe_by_title(merged);
        records.truncate(request.count);
        if records.is_empty() && request.count > 0 {
            warn!(content_type = %ct, "all sources empty, using fallback");
            records = self.fallback.generate(ct, request.count, keyword);
            source_label.push_str(",fallback");
        }
        CrawlOutcome::from_records(records, source_label, degraded)
    }

    /// Multi-source crawl of every core content type, one after another.
    pub async fn crawl_all(&self, count_per_type: usize) -> BTreeMap<ContentType, Vec<MediaRecord>> {
        let mut out = BTreeMap::new();
        for ct in ContentType::CORE {
            let outcome = self.crawl_multi_source(&CrawlRequest::new(ct, count_per_type)).await;
            if !outcome.success {
                warn!(content_type = %ct, error = ?outcome.error, "type crawl produced nothing");
            }
            out.insert(ct, if outcome.success { outcome.data } else { Vec::new() });
        }
        out
    }

    async fn crawl_source(
        &self,
        source: SourceKind,
        ct: ContentType,
        count: usize,
        keyword: Option<&str>,
        degraded: &mut Vec<DegradedReason>,
    ) -> Result<Vec<MediaRecord>, DegradedReason> {
        match source {
            SourceKind::WebSearch => self.crawl_web_items(ct, count, keyword).await,
            SourceKind::MovieDb => match self.crawl_movie_db(ct, count).await {
                Ok(records) => Ok(records),
                Err(reason) => {
                    warn!(content_type = %ct, %reason, "movie database unavailable, using web search");
                    degraded.push(reason);
                    self.crawl_web_items(ct, count, keyword).await
                }
            },
            SourceKind::AltSearch => self.crawl_alt_search(ct, count, keyword).await,
            SourceKind::Fallback => Ok(self.fallback.generate(ct, count, keyword)),
        }
    }

    async fn crawl_web_items(&self, ct: ContentType, count: usize, keyword: Option<&str>) -> Result<Vec<MediaRecord>, DegradedReason> {
        let search = self.search.as_ref().ok_or(DegradedReason::SearchUnavailable)?;
        let query = match keyword {
            Some(k) => format!("{k} {}", ct.label()),
            None => ct.label().to_string(),
        };
        let resp = search
            .search(&query, count, true)
            .await
            .map_err(|e| DegradedReason::query_failed(SourceKind::WebSearch.name(), &e))?;
        debug!(query = %query, items = resp.items.len(), "normalizing search items");
        let mut records = dedupe_by_title(self.normalizer.normalize_all(&resp.items, ct, SourceKind::WebSearch.name()));
        records.truncate(count);
        Ok(records)
    }

    async fn crawl_movie_db(&self, ct: ContentType, count: usize) -> Result<Vec<MediaRecord>, DegradedReason> {
        let (media, results) = self.movie_db.discover(ct, count).await?;
        let year = self.normalizer.default_year();
        Ok(results.iter().filter_map(|r| record_from_movie_db(r, ct, media, year)).collect())
    }

    async fn crawl_alt_search(&self, ct: ContentType, count: usize, keyword: Option<&str>) -> Result<Vec<MediaRecord>, DegradedReason> {
        let search = self.search.as_ref().ok_or(DegradedReason::SearchUnavailable)?;
        let queries: Vec<&str> = match keyword {
            Some(k) => vec![k],
            None => search_keywords(ct).iter().take(2).copied().collect(),
        };
        let per_query = count.div_ceil(2);
        let label = SourceKind::AltSearch.name();
        let mut records = Vec::new();
        let mut last_err = None;
        for kw in queries {
            let query = format!("site:{ALT_SITE} {kw}");
            match search.search(&query, per_query, false).await {
                Ok(resp) => records.extend(self.normalizer.normalize_all(&resp.items, ct, label).into_iter().map(with_alt_tag)),
                Err(e) => {
                    warn!(query = %query, error = %format!("{e:#}"), "alt search query failed");
                    last_err = Some(DegradedReason::query_failed(label, &e));
                }
            }
        }
        match last_err {
            Some(reason) if records.is_empty() => Err(reason),
            _ => {
                let mut records = dedupe_by_title(records);
                records.truncate(count);
                Ok(records)
            }
        }
    }
}

fn with_alt_tag(mut record: MediaRecord) -> MediaRecord {
    record.free_tags.retain(|t| t != ALT_TAG);
    record.free_tags.insert(0, ALT_TAG.to_string());
    record.free_tags.truncate(3);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::types::{RawSearchItem, SearchResponse};

    struct CannedSearch {
        items: Vec<RawSearchItem>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchProvider for CannedSearch {
        async fn search(&self, query: &str, _count: usize, _want_summary: bool) -> Result<SearchResponse> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(SearchResponse { items: self.items.clone(), summary: None })
        }
    }

    fn aggregator(search: Option<Arc<dyn SearchProvider>>) -> Aggregator {
        let movie_db = MovieDbClient::new("http://127.0.0.1:1", "demo", "zh-CN", Duration::from_millis(200)).unwrap();
        Aggregator::new(search, movie_db, Arc::new(RandomSource::seeded(11)), 2024)
    }

    #[test]
    fn alt_tag_leads_and_caps() {
        let mut rec = FallbackGenerator::new(Arc::new(RandomSource::seeded(1)), 2024)
            .generate(ContentType::Novel, 1, Some("仙侠"))
            .remove(0);
        rec.free_tags = vec!["热门".into(), "豆瓣".into(), "推荐".into(), "新作".into()];
        let rec = with_alt_tag(rec);
        assert_eq!(rec.free_tags, vec!["豆瓣".to_string(), "热门".to_string(), "推荐".to_string()]);
    }

    #[tokio::test]
    async fn web_query_includes_keyword_and_label() {
        let search = Arc::new(CannedSearch {
            items: vec![RawSearchItem::new("《长安十二时辰》", "2019年 古装悬疑 评分8.2", "https://example.com/a")],
            queries: Mutex::new(Vec::new()),
        });
        let agg = aggregator(Some(search.clone()));
        let out = agg.crawl_from_web(&CrawlRequest::new(ContentType::TvSeries, 3).with_keyword("长安")).await;
        assert!(out.success);
        assert_eq!(out.source.as_deref(), Some("web_search"));
        assert_eq!(search.queries.lock().unwrap()[0], "长安 电视剧");
    }

    #[tokio::test]
    async fn zero_count_is_unsuccessful() {
        let out = aggregator(None).crawl_from_web(&CrawlRequest::new(ContentType::Novel, 0)).await;
        assert!(!out.success);
        assert!(out.data.is_empty());
    }

    #[tokio::test]
    async fn alt_search_uses_site_queries() {
        let search = Arc::new(CannedSearch {
            items: vec![RawSearchItem::new("诛仙", "仙侠小说 2010年 已完结", "https://book.douban.com/subject/1")],
            queries: Mutex::new(Vec::new()),
        });
        let agg = aggregator(Some(search.clone()));
        let out = agg
            .crawl_multi_source(&CrawlRequest::new(ContentType::Novel, 4).with_sources(vec![SourceKind::AltSearch]))
            .await;
        assert!(out.success);
        assert_eq!(out.data[0].data_source_label, "douban");
        assert_eq!(out.data[0].free_tags[0], "豆瓣");
        let queries = search.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries.iter().all(|q| q.starts_with("site:douban.com ")));
    }
}
