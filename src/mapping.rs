use crate::normalize::{clamp_rating, extract_description};
use crate::random::RandomSource;
use crate::sources::tmdb::MovieDbResult;
use crate::sources::SourceKind;
use crate::types::{CompletionStatus, ContentType, MediaRecord, Provenance, PLACEHOLDER_IMAGE};

const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
const TMDB_SITE: &str = "https://www.themoviedb.org";
const TMDB_DEFAULT_COUNTRY: &str = "美国";

/// Opaque record id: epoch millis followed by nine base36 chars.
pub fn record_id(rng: &RandomSource) -> String { format!("{}{}", current_epoch_millis(), rng.base36(9)) }

pub fn genre_name(id: u32) -> &'static str {
    match id {
        12 => "冒险",
        14 => "奇幻",
        16 => "动画",
        18 => "剧情",
        27 => "恐怖",
        28 => "动作",
        35 => "喜剧",
        36 => "历史",
        53 => "惊悚",
        80 => "犯罪",
        99 => "纪录",
        878 => "科幻",
        9648 => "悬疑",
        10749 => "爱情",
        10751 => "家庭",
        10752 => "战争",
        10759 => "动作冒险",
        10762 => "儿童",
        10763 => "新闻",
        10764 => "真人秀",
        10765 => "科幻奇幻",
        10766 => "肥皂剧",
        10767 => "谈话",
        10768 => "战争政治",
        37 => "西部",
        _ => "其他",
    }
}

fn country_name(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "CN" | "HK" | "TW" => Some("中国"),
        "JP" => Some("日本"),
        "US" => Some("美国"),
        "KR" => Some("韩国"),
        "GB" => Some("英国"),
        "FR" => Some("法国"),
        "DE" => Some("德国"),
        _ => None,
    }
}

fn year_prefix(date: Option<&str>) -> Option<i32> { date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok()) }

/// Convert one `/discover` entry; `None` when the entry has no usable title.
pub fn record_from_movie_db(
    r: &MovieDbResult,
    content_type: ContentType,
    media: &str,
    default_year: i32,
) -> Option<MediaRecord> {
    let title = r.title.as_deref().or(r.name.as_deref()).map(str::trim).filter(|t| !t.is_empty())?;
    let country = r
        .origin_country
        .iter()
        .find_map(|c| country_name(c))
        .unwrap_or(TMDB_DEFAULT_COUNTRY);
    let date = r.release_date.as_deref().or(r.first_air_date.as_deref()).filter(|d| !d.is_empty());
    let mut genres: Vec<String> = r.genre_ids.iter().take(2).map(|id| genre_name(*id).to_string()).collect();
    genres.dedup();
    let completion_status = match r.status.as_deref() {
        Some("Ended") | Some("Released") => CompletionStatus::Complete,
        _ => CompletionStatus::Ongoing,
    };
    Some(MediaRecord {
        id: r.id.to_string(),
        title: title.chars().take(50).collect(),
        content_type,
        country: country.to_string(),
        release_year: year_prefix(date).unwrap_or(default_year),
        rating_score: clamp_rating(r.vote_average.unwrap_or(0.0)),
        cover_image_ref: r
            .poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{TMDB_IMAGE_BASE_URL}{p}"))
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        short_description: extract_description(r.overview.as_deref().unwrap_or("")),
        genre_tags: if genres.is_empty() { vec![genre_name(0).to_string()] } else { genres },
        free_tags: vec!["TMDb".to_string()],
        completion_status,
        source_url: Some(format!("{TMDB_SITE}/{media}/{}", r.id)),
        data_source_label: SourceKind::MovieDb.name().to_string(),
        provenance: Provenance::default(),
    })
}

pub(crate) fn current_epoch_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

pub(crate) fn current_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MovieDbResult {
        MovieDbResult {
            id: 1429,
            name: Some("进击的巨人".into()),
            overview: Some("人类与巨人的战争".into()),
            vote_average: Some(8.7),
            poster_path: Some("/poster.jpg".into()),
            genre_ids: vec![16, 10759, 18],
            first_air_date: Some("2013-04-07".into()),
            origin_country: vec!["JP".into()],
            ..Default::default()
        }
    }

    #[test]
    fn maps_tv_result() {
        let rec = record_from_movie_db(&sample(), ContentType::Anime, "tv", 2024).unwrap();
        assert_eq!(rec.id, "1429");
        assert_eq!(rec.title, "进击的巨人");
        assert_eq!(rec.country, "日本");
        assert_eq!(rec.release_year, 2013);
        assert_eq!(rec.genre_tags, vec!["动画".to_string(), "动作冒险".to_string()]);
        assert_eq!(rec.cover_image_ref, "https://image.tmdb.org/t/p/w500/poster.jpg");
        assert_eq!(rec.source_url.as_deref(), Some("https://www.themoviedb.org/tv/1429"));
        assert_eq!(rec.completion_status, CompletionStatus::Ongoing);
        assert_eq!(rec.data_source_label, "tmdb");
    }

    #[test]
    fn fills_defaults_for_sparse_result() {
        let r = MovieDbResult { id: 7, title: Some("Film".into()), vote_average: Some(11.0), status: Some("Released".into()), ..Default::default() };
        let rec = record_from_movie_db(&r, ContentType::Movie, "movie", 2024).unwrap();
        assert_eq!(rec.country, "美国");
        assert_eq!(rec.release_year, 2024);
        assert_eq!(rec.rating_score, 10.0);
        assert_eq!(rec.cover_image_ref, PLACEHOLDER_IMAGE);
        assert_eq!(rec.short_description, "暂无描述");
        assert_eq!(rec.genre_tags, vec!["其他".to_string()]);
        assert_eq!(rec.completion_status, CompletionStatus::Complete);
    }

    #[test]
    fn untitled_result_is_skipped() {
        let r = MovieDbResult { id: 1, name: Some("  ".into()), ..Default::default() };
        assert!(record_from_movie_db(&r, ContentType::Anime, "tv", 2024).is_none());
    }

    #[test]
    fn record_ids_are_unique_per_draw() {
        let rng = RandomSource::seeded(9);
        let a = record_id(&rng);
        let b = record_id(&rng);
        assert_ne!(a, b);
        assert!(a.len() > 9);
    }
}
