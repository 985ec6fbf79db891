//! Text heuristics that turn a raw search hit into a [`MediaRecord`].
//!
//! Everything here is best-effort: a miss on any single field falls back to a
//! default instead of rejecting the item. Items are only rejected when they
//! look like list/review pages rather than individual works.

use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::mapping::record_id;
use crate::random::RandomSource;
use crate::types::{
    CompletionStatus, ContentType, MediaRecord, Provenance, RawSearchItem, NO_DESCRIPTION, PLACEHOLDER_IMAGE,
};

const MAX_TITLE_CHARS: usize = 50;
const MAX_DESCRIPTION_CHARS: usize = 100;
const MIN_VALID_TITLE_CHARS: usize = 2;
const MAX_VALID_TITLE_CHARS: usize = 100;

const REJECTED_PATH_FRAGMENTS: &[&str] = &[
    "/review", "/comment", "/list", "/rank", "/topic", "/news", "/article", "/blog", "/tag", "/category",
];

const COUNTRIES: &[&str] = &["中国", "日本", "美国", "韩国", "英国", "法国", "德国"];
const DEFAULT_COUNTRY: &str = "中国";

const TAG_KEYWORDS: &[&str] = &["爆款", "经典", "完结", "热门", "VIP", "独家", "最新"];
const FILLER_TAGS: &[&str] = &["热门", "推荐", "新作"];

static REVIEW_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:推荐|排名|榜单|(?i:top)\s*\d+|盘点|评分)").expect("review prefix regex should compile")
});
static REVIEW_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"排行榜|解析").expect("review keyword regex should compile"));

static NOISE_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)推荐|排名|榜单|top\s*\d+|盘点|评分|豆瓣|知乎|b站|优酷|爱奇艺|腾讯|芒果")
        .expect("noise token regex should compile")
});
static EPISODE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"第\s*[0-9一二三四五六七八九十百零两]+\s*[季期集]").expect("episode marker regex should compile")
});
static NUMERIC_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("numeric marker regex should compile"));
static TYPE_FULL_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(小说|动漫|电视剧|综艺|短剧|电影)全集").expect("full-set regex should compile")
});
static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([^()]*\)|（[^（）]*）|\[[^\[\]]*\]|【[^【】]*】").expect("annotation regex should compile")
});
static TITLE_QUOTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[《》]").expect("quote regex should compile"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-_|]+").expect("separator regex should compile"));
static SEGMENT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,，\-—|_]").expect("segment regex should compile"));

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"20[1-2][0-9]|19[8-9][0-9]").expect("year regex should compile"));
static RATING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d\.\d+").expect("rating regex should compile"));

pub fn genre_vocabulary(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Novel => &["玄幻", "言情", "科幻", "悬疑", "历史"],
        ContentType::Anime => &["热血", "恋爱", "科幻", "悬疑", "治愈"],
        ContentType::TvSeries => &["剧情", "科幻", "悬疑", "喜剧", "历史"],
        ContentType::VarietyShow => &["真人秀", "音乐", "脱口秀", "竞技", "访谈"],
        ContentType::ShortDrama => &["甜宠", "总裁", "穿越", "重生", "悬疑"],
        ContentType::Movie => &["动作", "喜剧", "爱情", "科幻", "剧情"],
    }
}

/// False for URLs whose path looks like a review, listing, or news page.
pub fn is_valid_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    !REJECTED_PATH_FRAGMENTS.iter().any(|frag| lower.contains(frag))
}

pub fn is_review_title(title: &str) -> bool {
    let t = title.trim().trim_start_matches(['【', '《', '[', '(', '（', '「']).trim_start();
    REVIEW_PREFIX.is_match(t) || REVIEW_ANYWHERE.is_match(t)
}

fn collapse(s: &str) -> String { SEPARATORS.replace_all(s, " ").trim().to_string() }

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}

fn strip_pass(s: &str) -> String {
    let s = NOISE_TOKENS.replace_all(s, "");
    let s = EPISODE_MARKER.replace_all(&s, "");
    let s = NUMERIC_MARKER.replace_all(&s, "");
    let s = TYPE_FULL_SET.replace_all(&s, "$1");
    let s = ANNOTATION.replace_all(&s, "");
    let s = TITLE_QUOTES.replace_all(&s, " ");
    collapse(&s)
}

// Removing one token can splice together another ("推推荐荐"), so run to a fixpoint.
fn strip_to_fixpoint(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = strip_pass(&current);
        if next == current { return current; }
        current = next;
    }
}

/// Strip marketing noise and annotations from a search-result title.
///
/// Applying it to its own output returns the same string.
pub fn clean_title(raw: &str) -> String {
    let cleaned = truncate_chars(&strip_to_fixpoint(raw), MAX_TITLE_CHARS);
    if cleaned.chars().count() >= MIN_VALID_TITLE_CHARS {
        return cleaned;
    }
    let first = SEGMENT_SPLIT
        .split(raw)
        .map(str::trim)
        .find(|seg| !seg.is_empty())
        .unwrap_or("");
    let segment = truncate_chars(&strip_to_fixpoint(first), MAX_TITLE_CHARS);
    // A segment that is still too short would be re-split on the next call.
    if segment.chars().count() >= MIN_VALID_TITLE_CHARS { segment } else { cleaned }
}

pub fn is_valid_title(cleaned: &str, content_type: ContentType) -> bool {
    let n = cleaned.chars().count();
    if !(MIN_VALID_TITLE_CHARS..=MAX_VALID_TITLE_CHARS).contains(&n) { return false; }
    cleaned != content_type.label() && !cleaned.eq_ignore_ascii_case(content_type.slug())
}

pub fn extract_country(text: &str) -> String {
    COUNTRIES
        .iter()
        .find(|c| text.contains(*c))
        .copied()
        .unwrap_or(DEFAULT_COUNTRY)
        .to_string()
}

pub fn extract_year(text: &str) -> Option<i32> { YEAR.find(text).and_then(|m| m.as_str().parse().ok()) }

pub fn extract_rating(text: &str) -> Option<f32> {
    RATING
        .find(text)
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .map(clamp_rating)
}

pub fn clamp_rating(r: f32) -> f32 {
    if r.is_nan() { return 0.0; }
    r.clamp(0.0, 10.0)
}

/// Plausible rating in [7.0, 9.5) at one decimal place.
pub fn guess_rating(rng: &RandomSource) -> f32 { 7.0 + (rng.unit() * 25.0).floor() as f32 / 10.0 }

pub fn extract_status(text: &str) -> CompletionStatus {
    if text.contains("连载") || text.contains("更新") {
        CompletionStatus::Ongoing
    } else {
        CompletionStatus::Complete
    }
}

pub fn extract_description(text: &str) -> String {
    let d = truncate_chars(text.trim(), MAX_DESCRIPTION_CHARS);
    if d.is_empty() { NO_DESCRIPTION.to_string() } else { d }
}

/// Genres named in the text, or a random pick from the type vocabulary.
/// The flag is true when the pick was random.
pub fn extract_genres(text: &str, content_type: ContentType, rng: &RandomSource) -> (Vec<String>, bool) {
    let vocab = genre_vocabulary(content_type);
    let found: Vec<String> = vocab.iter().filter(|g| text.contains(*g)).take(2).map(|g| g.to_string()).collect();
    if !found.is_empty() {
        return (found, false);
    }
    (rng.choose_some(vocab, 1, 2).into_iter().map(String::from).collect(), true)
}

pub fn extract_tags(text: &str, rng: &RandomSource) -> (Vec<String>, bool) {
    let found: Vec<String> = TAG_KEYWORDS.iter().filter(|k| text.contains(*k)).take(3).map(|k| k.to_string()).collect();
    if !found.is_empty() {
        return (found, false);
    }
    (rng.choose_some(FILLER_TAGS, 2, 2).into_iter().map(String::from).collect(), true)
}

/// Drop records whose trimmed, lowercased title was already seen. Keeps order.
pub fn dedupe_by_title(records: Vec<MediaRecord>) -> Vec<MediaRecord> {
    let mut seen = HashSet::new();
    records.into_iter().filter(|r| seen.insert(r.title_key())).collect()
}

pub struct Normalizer {
    rng: Arc<RandomSource>,
    default_year: i32,
}

impl Normalizer {
    pub fn new(rng: Arc<RandomSource>, default_year: i32) -> Self { Self { rng, default_year } }

    pub fn default_year(&self) -> i32 { self.default_year }

    /// Build a record from one search hit, or `None` if the hit is not an individual work.
    pub fn normalize(&self, item: &RawSearchItem, content_type: ContentType, source_label: &str) -> Option<MediaRecord> {
        let url = item.url.trim();
        if !url.is_empty() && !is_valid_url(url) {
            debug!(url, "rejecting non-item url");
            return None;
        }
        if is_review_title(&item.title) {
            debug!(title = %item.title, "rejecting review/list title");
            return None;
        }
        let title = clean_title(&item.title);
        if !is_valid_title(&title, content_type) || is_review_title(&title) {
            debug!(raw = %item.title, cleaned = %title, "rejecting title after cleaning");
            return None;
        }

        let text = item.snippet.as_str();
        let (rating_score, rating_guessed) = match extract_rating(text) {
            Some(r) => (r, false),
            None => (guess_rating(&self.rng), true),
        };
        let (genre_tags, genres_guessed) = extract_genres(text, content_type, &self.rng);
        let (free_tags, tags_guessed) = extract_tags(text, &self.rng);

        Some(MediaRecord {
            id: record_id(&self.rng),
            title,
            content_type,
            country: extract_country(text),
            release_year: extract_year(text).unwrap_or(self.default_year),
            rating_score,
            cover_image_ref: PLACEHOLDER_IMAGE.to_string(),
            short_description: extract_description(text),
            genre_tags,
            free_tags,
            completion_status: extract_status(text),
            source_url: Some(url.to_string()).filter(|u| !u.is_empty()),
            data_source_label: source_label.to_string(),
            provenance: Provenance { rating_guessed, genres_guessed, tags_guessed, synthetic: false },
        })
    }

    pub fn normalize_all(&self, items: &[RawSearchItem], content_type: ContentType, source_label: &str) -> Vec<MediaRecord> {
        items.iter().filter_map(|i| self.normalize(i, content_type, source_label)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer { Normalizer::new(Arc::new(RandomSource::seeded(3)), 2024) }

    #[test]
    fn extracts_fields_from_snippet() {
        let text = "经典 2015年评分9.3连载";
        assert_eq!(extract_country(text), "中国");
        assert_eq!(extract_year(text), Some(2015));
        assert_eq!(extract_rating(text), Some(9.3));
        assert_eq!(extract_status(text), CompletionStatus::Ongoing);
    }

    #[test]
    fn status_rules() {
        assert_eq!(extract_status("全集已完结"), CompletionStatus::Complete);
        assert_eq!(extract_status("每周更新"), CompletionStatus::Ongoing);
        assert_eq!(extract_status("一部作品"), CompletionStatus::Complete);
    }

    #[test]
    fn country_picks_first_listed_match() {
        assert_eq!(extract_country("日本动画，美国发行"), "日本");
        assert_eq!(extract_country("no country here"), "中国");
    }

    #[test]
    fn year_range_is_bounded() {
        assert_eq!(extract_year("1975年首播"), None);
        assert_eq!(extract_year("1988年首播"), Some(1988));
        assert_eq!(extract_year("2031年"), None);
    }

    #[test]
    fn rating_is_clamped_and_guessed_in_range() {
        assert_eq!(clamp_rating(12.5), 10.0);
        assert_eq!(clamp_rating(-1.0), 0.0);
        let rng = RandomSource::seeded(11);
        for _ in 0..200 {
            let r = guess_rating(&rng);
            assert!((7.0..9.5).contains(&r), "guessed {r}");
        }
    }

    #[test]
    fn rejects_listing_urls() {
        assert!(!is_valid_url("https://movie.example.com/review/123"));
        assert!(!is_valid_url("https://example.com/Top/RANK/1"));
        assert!(is_valid_url("https://book.douban.com/subject/2567698/"));
    }

    #[test]
    fn rejects_review_titles() {
        assert!(is_review_title("推荐10部好看的小说"));
        assert!(is_review_title("Top 10 动漫"));
        assert!(is_review_title("2024年电视剧排行榜"));
        assert!(is_review_title("《三体》深度解析"));
        assert!(is_review_title("【盘点】年度综艺"));
        assert!(!is_review_title("三体"));
    }

    #[test]
    fn cleans_marketing_and_annotations() {
        assert_eq!(clean_title("《三体》- 豆瓣读书"), "三体 读书");
        assert_eq!(clean_title("庆余年 第2季 (2024) [1]"), "庆余年");
        assert_eq!(clean_title("斗罗大陆_腾讯视频|第3集"), "斗罗大陆 视频");
        assert_eq!(clean_title("甄嬛传  电视剧全集"), "甄嬛传 电视剧");
    }

    #[test]
    fn cleaning_truncates_to_fifty_chars() {
        let long = "长".repeat(80);
        assert_eq!(clean_title(&long).chars().count(), 50);
    }

    #[test]
    fn cleaning_falls_back_to_first_segment() {
        assert_eq!(clean_title("推荐-榜单"), "推荐");
    }

    #[test]
    fn short_cleanings_fall_back_to_a_stripped_segment() {
        assert_eq!(clean_title("【三体 豆瓣,热门】"), "【三体");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let samples = [
            "《三体》- 豆瓣读书",
            "推推荐荐 斗破苍穹",
            "Top-5 进击的巨人 ((特别版))",
            "庆余年 第二季 【独播】 | 腾讯视频",
            "   霸道总裁爱上我   ",
            &"字".repeat(70),
            "【三体 豆瓣,热门】",
            "【热门】,推荐",
            "、",
        ];
        for s in samples {
            let once = clean_title(s);
            assert_eq!(clean_title(&once), once, "input {s:?}");
        }
    }

    #[test]
    fn bare_type_label_is_invalid() {
        assert!(!is_valid_title("小说", ContentType::Novel));
        assert!(!is_valid_title("x", ContentType::Novel));
        assert!(is_valid_title("小说家", ContentType::Novel));
    }

    #[test]
    fn normalize_rejects_label_title_and_review_url() {
        let n = normalizer();
        let label = RawSearchItem::new("小说", "好看", "https://a.example/book/1");
        assert!(n.normalize(&label, ContentType::Novel, "web_search").is_none());
        let review = RawSearchItem::new("三体", "好看", "https://a.example/review/123");
        assert!(n.normalize(&review, ContentType::Novel, "web_search").is_none());
    }

    #[test]
    fn normalize_builds_record_with_provenance() {
        let n = normalizer();
        let item = RawSearchItem::new("三体 - 豆瓣", "中国科幻经典 2018年 评分9.4 完结", "https://book.example/subject/1");
        let rec = n.normalize(&item, ContentType::Novel, "web_search").unwrap();
        assert_eq!(rec.title, "三体");
        assert_eq!(rec.release_year, 2018);
        assert_eq!(rec.rating_score, 9.4);
        assert_eq!(rec.genre_tags, vec!["科幻".to_string()]);
        assert_eq!(rec.free_tags, vec!["经典".to_string(), "完结".to_string()]);
        assert!(!rec.provenance.rating_guessed);
        assert!(!rec.provenance.genres_guessed);
        assert_eq!(rec.source_url.as_deref(), Some("https://book.example/subject/1"));
        assert_eq!(rec.cover_image_ref, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn normalize_guesses_missing_values() {
        let n = normalizer();
        let rec = n.normalize(&RawSearchItem::new("某部作品", "", ""), ContentType::Anime, "web_search").unwrap();
        assert!(rec.provenance.rating_guessed && rec.provenance.genres_guessed && rec.provenance.tags_guessed);
        assert_eq!(rec.release_year, 2024);
        assert_eq!(rec.short_description, NO_DESCRIPTION);
        assert!(rec.source_url.is_none());
        assert!((1..=2).contains(&rec.genre_tags.len()));
        assert!(rec.genre_tags.iter().all(|g| genre_vocabulary(ContentType::Anime).contains(&g.as_str())));
    }

    #[test]
    fn dedupe_is_case_insensitive_and_order_preserving() {
        let n = normalizer();
        let items = [
            RawSearchItem::new("Naruto", "", ""),
            RawSearchItem::new("海贼王", "", ""),
            RawSearchItem::new(" naruto ", "", ""),
        ];
        let recs = dedupe_by_title(n.normalize_all(&items, ContentType::Anime, "web_search"));
        let titles: Vec<_> = recs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Naruto", "海贼王"]);
    }
}
