//! Synthetic records for when no live source produced anything.

use std::sync::Arc;

use crate::mapping::record_id;
use crate::normalize::{extract_description, genre_vocabulary, guess_rating};
use crate::random::RandomSource;
use crate::sources::SourceKind;
use crate::types::{CompletionStatus, ContentType, MediaRecord, Provenance, PLACEHOLDER_IMAGE};

const MAX_TITLE_CHARS: usize = 50;

const KEYWORD_SUFFIXES: &[&str] = &[" 第1部", " 完结版", " 精编版", " 番外篇", " 典藏版", " 全本", " 续篇", " 新编"];

struct Sample {
    title: &'static str,
    country: &'static str,
    year: i32,
    rating: f32,
    genres: &'static [&'static str],
    description: &'static str,
    status: CompletionStatus,
}

const fn sample(
    title: &'static str,
    country: &'static str,
    year: i32,
    rating: f32,
    genres: &'static [&'static str],
    description: &'static str,
    status: CompletionStatus,
) -> Sample {
    Sample { title, country, year, rating, genres, description, status }
}

use crate::types::CompletionStatus::{Complete, Ongoing};

const NOVELS: &[Sample] = &[
    sample("三体", "中国", 2008, 9.3, &["科幻"], "人类文明与三体文明的首次接触", Complete),
    sample("诡秘之主", "中国", 2018, 9.1, &["玄幻", "悬疑"], "蒸汽与机械时代的神秘学史诗", Complete),
    sample("庆余年", "中国", 2007, 8.8, &["历史"], "带着现代记忆的少年在庆国的权谋人生", Complete),
    sample("盗墓笔记", "中国", 2007, 8.5, &["悬疑"], "吴邪与铁三角的古墓探险", Complete),
    sample("斗破苍穹", "中国", 2009, 8.2, &["玄幻"], "少年萧炎逆境崛起的修炼之路", Complete),
];

const ANIME: &[Sample] = &[
    sample("进击的巨人", "日本", 2013, 9.2, &["热血", "悬疑"], "人类在巨人威胁下的生存抗争", Complete),
    sample("紫罗兰永恒花园", "日本", 2018, 9.0, &["治愈"], "自动手记人偶学习爱的意义", Complete),
    sample("鬼灭之刃", "日本", 2019, 8.9, &["热血"], "少年为拯救化鬼的妹妹踏上斩鬼之路", Ongoing),
    sample("间谍过家家", "日本", 2022, 8.9, &["恋爱"], "间谍、杀手与超能力者组成的临时家庭", Ongoing),
    sample("斗罗大陆", "中国", 2018, 8.0, &["热血"], "唐三在斗罗大陆的武魂修炼之旅", Ongoing),
];

const TV_SERIES: &[Sample] = &[
    sample("琅琊榜", "中国", 2015, 9.4, &["历史", "剧情"], "麒麟才子梅长苏的复仇与昭雪", Complete),
    sample("请回答1988", "韩国", 2015, 9.7, &["剧情", "喜剧"], "双门洞五户人家的青春与亲情", Complete),
    sample("权力的游戏", "美国", 2011, 9.0, &["剧情", "历史"], "七大王国的权力争斗与冰火之歌", Complete),
    sample("漫长的季节", "中国", 2023, 9.4, &["悬疑"], "东北小城跨越多年的悬案", Complete),
    sample("黑镜", "英国", 2011, 8.7, &["科幻", "悬疑"], "科技阴影下的人性寓言", Complete),
];

const VARIETY_SHOWS: &[Sample] = &[
    sample("乐队的夏天", "中国", 2019, 8.9, &["音乐"], "乐队竞演的夏日音乐节", Complete),
    sample("十三邀", "中国", 2016, 8.8, &["访谈"], "与各领域人物的深度对谈", Ongoing),
    sample("脱口秀大会", "中国", 2017, 8.3, &["脱口秀", "竞技"], "脱口秀演员的舞台比拼", Ongoing),
    sample("向往的生活", "中国", 2017, 8.0, &["真人秀"], "田园里的慢节奏生活", Ongoing),
    sample("奔跑吧兄弟", "中国", 2014, 7.8, &["真人秀", "竞技"], "嘉宾团队协作完成任务的户外真人秀", Ongoing),
];

const SHORT_DRAMAS: &[Sample] = &[
    sample("闪婚后傅先生马甲藏不住了", "中国", 2023, 7.2, &["甜宠", "总裁"], "闪婚对象竟是隐藏身份的集团总裁", Complete),
    sample("我在八零年代当后妈", "中国", 2023, 7.4, &["穿越"], "穿越到八十年代的继母逆袭", Complete),
    sample("重生之都市修仙", "中国", 2024, 7.0, &["重生"], "仙尊重生回到都市少年时代", Ongoing),
    sample("招惹", "中国", 2024, 7.6, &["甜宠", "悬疑"], "律师与刑警之间的暧昧拉扯", Complete),
];

const MOVIES: &[Sample] = &[
    sample("霸王别姬", "中国", 1993, 9.6, &["剧情", "爱情"], "两位京剧伶人半个世纪的悲欢离合", Complete),
    sample("千与千寻", "日本", 2001, 9.4, &["剧情"], "少女千寻在神灵世界的成长", Complete),
    sample("盗梦空间", "美国", 2010, 9.4, &["科幻", "动作"], "潜入梦境窃取思想的盗梦者", Complete),
    sample("流浪地球", "中国", 2019, 7.9, &["科幻"], "推动地球逃离太阳系的宏大冒险", Complete),
];

fn samples(content_type: ContentType) -> &'static [Sample] {
    match content_type {
        ContentType::Novel => NOVELS,
        ContentType::Anime => ANIME,
        ContentType::TvSeries => TV_SERIES,
        ContentType::VarietyShow => VARIETY_SHOWS,
        ContentType::ShortDrama => SHORT_DRAMAS,
        ContentType::Movie => MOVIES,
    }
}

/// Suffix for the `index`-th keyword variant. Distinct for every index.
pub fn keyword_suffix(index: usize) -> String {
    match KEYWORD_SUFFIXES.get(index) {
        Some(s) => s.to_string(),
        None => format!(" 第{}部", index - KEYWORD_SUFFIXES.len() + 2),
    }
}

pub struct FallbackGenerator {
    rng: Arc<RandomSource>,
    default_year: i32,
}

impl FallbackGenerator {
    pub fn new(rng: Arc<RandomSource>, default_year: i32) -> Self { Self { rng, default_year } }

    /// `count` keyword variants when a keyword is given, otherwise up to `count`
    /// entries from the built-in table. Never empty unless `count` is zero.
    pub fn generate(&self, content_type: ContentType, count: usize, keyword: Option<&str>) -> Vec<MediaRecord> {
        match keyword.map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => (0..count).map(|i| self.keyword_record(content_type, k, i)).collect(),
            None => samples(content_type).iter().take(count).map(|s| self.sample_record(content_type, s)).collect(),
        }
    }

    fn sample_record(&self, content_type: ContentType, s: &Sample) -> MediaRecord {
        MediaRecord {
            id: record_id(&self.rng),
            title: s.title.to_string(),
            content_type,
            country: s.country.to_string(),
            release_year: s.year,
            rating_score: s.rating,
            cover_image_ref: PLACEHOLDER_IMAGE.to_string(),
            short_description: s.description.to_string(),
            genre_tags: s.genres.iter().map(|g| g.to_string()).collect(),
            free_tags: vec!["经典".to_string(), "示例".to_string()],
            completion_status: s.status,
            source_url: None,
            data_source_label: SourceKind::Fallback.name().to_string(),
            provenance: Provenance { synthetic: true, ..Provenance::default() },
        }
    }

    fn keyword_record(&self, content_type: ContentType, keyword: &str, index: usize) -> MediaRecord {
        let status = if self.rng.index(2) == 0 { CompletionStatus::Complete } else { CompletionStatus::Ongoing };
        let suffix = keyword_suffix(index);
        let prefix: String = keyword.chars().take(MAX_TITLE_CHARS.saturating_sub(suffix.chars().count())).collect();
        MediaRecord {
            id: record_id(&self.rng),
            title: format!("{prefix}{suffix}"),
            content_type,
            country: "中国".to_string(),
            release_year: self.default_year,
            rating_score: guess_rating(&self.rng),
            cover_image_ref: PLACEHOLDER_IMAGE.to_string(),
            short_description: extract_description(&format!("与「{keyword}」相关的{}示例内容", content_type.label())),
            genre_tags: self.rng.choose_some(genre_vocabulary(content_type), 1, 2).into_iter().map(String::from).collect(),
            free_tags: vec![keyword.chars().take(10).collect(), "示例".to_string()],
            completion_status: status,
            source_url: None,
            data_source_label: SourceKind::Fallback.name().to_string(),
            provenance: Provenance::synthetic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn generator() -> FallbackGenerator { FallbackGenerator::new(Arc::new(RandomSource::seeded(5)), 2024) }

    #[test]
    fn keyword_variants_are_exact_and_distinct() {
        let recs = generator().generate(ContentType::ShortDrama, 5, Some("霸道总裁"));
        assert_eq!(recs.len(), 5);
        assert!(recs.iter().all(|r| r.title.starts_with("霸道总裁")));
        let titles: HashSet<_> = recs.iter().map(|r| r.title.clone()).collect();
        assert_eq!(titles.len(), 5);
        assert!(recs.iter().all(|r| r.provenance.synthetic));
    }

    #[test]
    fn suffixes_stay_distinct_past_the_rotation() {
        let suffixes: HashSet<_> = (0..40).map(keyword_suffix).collect();
        assert_eq!(suffixes.len(), 40);
    }

    #[test]
    fn table_records_without_keyword() {
        let recs = generator().generate(ContentType::Anime, 3, None);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].title, "进击的巨人");
        assert_eq!(recs[0].data_source_label, "fallback");
    }

    #[test]
    fn every_type_has_samples() {
        let g = generator();
        for ct in ContentType::CORE.iter().chain([ContentType::Movie].iter()) {
            assert!(!g.generate(*ct, 10, None).is_empty(), "{ct}");
        }
        assert!(g.generate(ContentType::Novel, 0, None).is_empty());
    }

    #[test]
    fn long_keywords_are_cut_to_fit_the_title() {
        let keyword = "长".repeat(60);
        let recs = generator().generate(ContentType::Novel, 12, Some(&keyword));
        assert_eq!(recs.len(), 12);
        for r in &recs {
            assert!(r.title.chars().count() <= 50, "{}", r.title);
            assert!(r.title.starts_with("长长长长长"));
            assert!(r.short_description.chars().count() <= 100);
        }
        let titles: HashSet<_> = recs.iter().map(|r| r.title.clone()).collect();
        assert_eq!(titles.len(), 12);
    }

    #[test]
    fn keyword_prefix_is_kept_even_when_it_reads_like_a_ranking() {
        let recs = generator().generate(ContentType::Novel, 2, Some("推荐"));
        assert_eq!(recs[0].title, "推荐 第1部");
        assert_eq!(recs[1].title, "推荐 完结版");
    }

    #[test]
    fn ratings_stay_in_range() {
        for r in generator().generate(ContentType::Novel, 30, Some("仙侠")) {
            assert!((0.0..=10.0).contains(&r.rating_score));
        }
    }
}
