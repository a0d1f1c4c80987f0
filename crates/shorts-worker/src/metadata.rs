//! Title, description and hashtag synthesis.
//!
//! Output is randomized on purpose; only its shape is stable.

use chrono::{Datelike, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;

use shorts_models::PublishMetadata;

/// Platform title limit, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Platform description limit, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

pub const MIN_HASHTAGS: usize = 3;
pub const MAX_HASHTAGS: usize = 5;

/// Phrase pools the synthesizer draws from.
#[derive(Debug, Clone)]
pub struct MetadataPools {
    pub hooks: Vec<String>,
    pub keywords: Vec<String>,
    /// Substrings that mark a file-name token as a usable keyword
    pub filename_markers: Vec<String>,
    pub cta_endings: Vec<String>,
    pub hashtags: Vec<String>,
    /// Appended to every title
    pub platform_tag: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for MetadataPools {
    fn default() -> Self {
        Self {
            hooks: owned(&[
                "🚀 The secret few people know about",
                "❌ The biggest mistake that kills your",
                "🔥 The honest truth about",
                "💡 How to actually start with",
                "🧠 The mindset behind real",
                "⏳ 60 seconds that change how you see",
            ]),
            keywords: owned(&[
                "success",
                "motivation",
                "entrepreneurship",
                "money",
                "self-improvement",
                "discipline",
                "habits",
                "mindset",
            ]),
            filename_markers: owned(&[
                "success",
                "motivation",
                "discipline",
                "money",
                "habit",
                "mindset",
                "entrepreneur",
                "نجاح",
                "تحفيز",
                "مال",
                "ريادة",
            ]),
            cta_endings: owned(&[
                "Comment \"ready\" if you are starting today!",
                "Pick one tip and tell me in the comments why it fits you.",
                "Follow for a new idea every day.",
                "Save this and watch it again tomorrow morning.",
            ]),
            hashtags: owned(&[
                "#Shorts",
                "#success",
                "#motivation",
                "#selfimprovement",
                "#entrepreneur",
                "#mindset",
                "#discipline",
                "#goals",
            ]),
            platform_tag: "#Shorts".to_string(),
        }
    }
}

impl MetadataPools {
    /// Default pools with the configured overrides applied.
    pub fn with_overrides(hashtags: Option<Vec<String>>, keywords: Option<Vec<String>>) -> Self {
        let mut pools = Self::default();
        if let Some(hashtags) = hashtags {
            pools.hashtags = hashtags;
        }
        if let Some(keywords) = keywords {
            pools.keywords = keywords;
        }
        pools
    }
}

/// Builds [`PublishMetadata`] for a source file.
#[derive(Debug, Clone)]
pub struct MetadataSynthesizer {
    pools: MetadataPools,
    year: i32,
}

impl MetadataSynthesizer {
    pub fn new(pools: MetadataPools) -> Self {
        Self {
            pools,
            year: Utc::now().year(),
        }
    }

    /// Pin the year tag, for reproducible titles.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn pools(&self) -> &MetadataPools {
        &self.pools
    }

    /// First file-name token of at least three characters that contains a
    /// curated marker.
    pub fn keyword_from_filename(&self, file_name: &str) -> Option<String> {
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        };

        stem.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
            .filter(|token| token.chars().count() >= 3)
            .find(|token| {
                let lower = token.to_lowercase();
                self.pools
                    .filename_markers
                    .iter()
                    .any(|marker| lower.contains(&marker.to_lowercase()))
            })
            .map(str::to_string)
    }

    /// Keyword from the file name, else a random pool entry.
    pub fn choose_keyword<R: Rng + ?Sized>(&self, rng: &mut R, file_name: &str) -> String {
        self.keyword_from_filename(file_name)
            .or_else(|| self.pools.keywords.choose(rng).cloned())
            .unwrap_or_default()
    }

    /// Between three and five distinct hashtags, fewer only if the pool is smaller.
    pub fn choose_hashtags<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let count = rng.random_range(MIN_HASHTAGS..=MAX_HASHTAGS);
        self.pools
            .hashtags
            .choose_multiple(rng, count)
            .cloned()
            .collect()
    }

    pub fn title<R: Rng + ?Sized>(&self, rng: &mut R, keyword: &str) -> String {
        let hook = self.pools.hooks.choose(rng).map(String::as_str).unwrap_or("");
        let title = format!("{} {} {} {}", hook, keyword, self.year, self.pools.platform_tag);
        truncate_chars(title.trim(), MAX_TITLE_CHARS)
    }

    pub fn description<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        keyword: &str,
        hashtags: &[String],
    ) -> String {
        let cta = self
            .pools
            .cta_endings
            .choose(rng)
            .map(String::as_str)
            .unwrap_or("");
        let description = format!(
            "💡 {keyword} in under a minute.\n\
             🚀 One practical step you can take today to improve your {keyword}.\n\n\
             ✅ {cta}\n\n\
             {tags}",
            keyword = keyword,
            cta = cta,
            tags = hashtags.join(" "),
        );
        truncate_chars(&description, MAX_DESCRIPTION_CHARS)
    }

    /// Title, description and hashtags for one publish attempt.
    ///
    /// The same hashtag set goes into the description and the upload tags.
    pub fn synthesize<R: Rng + ?Sized>(&self, rng: &mut R, file_name: &str) -> PublishMetadata {
        let keyword = self.choose_keyword(rng, file_name);
        let hashtags = self.choose_hashtags(rng);
        PublishMetadata {
            title: self.title(rng, &keyword),
            description: self.description(rng, &keyword, &hashtags),
            hashtags,
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn synthesizer() -> MetadataSynthesizer {
        MetadataSynthesizer::new(MetadataPools::default()).with_year(2026)
    }

    #[test]
    fn test_keyword_from_filename() {
        let s = synthesizer();
        assert_eq!(s.keyword_from_filename("my_Success-story.mp4").as_deref(), Some("Success"));
        assert_eq!(s.keyword_from_filename("daily habits 01.mov").as_deref(), Some("habits"));
        assert_eq!(s.keyword_from_filename("سر_النجاح.mp4").as_deref(), Some("النجاح"));
        assert_eq!(s.keyword_from_filename("IMG_0042.mp4"), None);
    }

    #[test]
    fn test_hashtags_are_unique_and_bounded() {
        let s = synthesizer();
        let pool: HashSet<&String> = s.pools().hashtags.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen_counts = HashSet::new();

        for _ in 0..500 {
            let tags = s.choose_hashtags(&mut rng);
            assert!((MIN_HASHTAGS..=MAX_HASHTAGS).contains(&tags.len()));
            let unique: HashSet<&String> = tags.iter().collect();
            assert_eq!(unique.len(), tags.len());
            assert!(tags.iter().all(|t| pool.contains(t)));
            seen_counts.insert(tags.len());
        }
        assert_eq!(seen_counts.len(), 3);
    }

    #[test]
    fn test_hashtags_with_minimum_pool() {
        let pools = MetadataPools::with_overrides(
            Some(owned(&["#a", "#b", "#c", "#d", "#e"])),
            None,
        );
        let s = MetadataSynthesizer::new(pools);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..100 {
            let tags = s.choose_hashtags(&mut rng);
            assert!((3..=5).contains(&tags.len()));
        }
    }

    #[test]
    fn test_title_uses_filename_keyword_year_and_tag() {
        let s = synthesizer();
        let mut rng = StdRng::seed_from_u64(3);
        let meta = s.synthesize(&mut rng, "discipline_tips.mp4");

        assert!(meta.title.contains("discipline"));
        assert!(meta.title.contains("2026"));
        assert!(meta.title.ends_with("#Shorts"));
        assert!(meta.title.chars().count() <= MAX_TITLE_CHARS);
    }

    #[test]
    fn test_falls_back_to_pool_keyword() {
        let s = synthesizer();
        let mut rng = StdRng::seed_from_u64(11);
        let meta = s.synthesize(&mut rng, "IMG_0042.mp4");

        assert!(s.pools().keywords.iter().any(|k| meta.title.contains(k.as_str())));
    }

    #[test]
    fn test_description_ends_with_the_chosen_hashtags() {
        let s = synthesizer();
        let mut rng = StdRng::seed_from_u64(5);
        let meta = s.synthesize(&mut rng, "money_moves.mp4");

        assert!(meta.description.contains("money"));
        assert!(meta.description.ends_with(&meta.hashtag_line()));
        assert!(s.pools().cta_endings.iter().any(|c| meta.description.contains(c.as_str())));
    }

    #[test]
    fn test_long_title_is_truncated_on_char_boundary() {
        let mut pools = MetadataPools::default();
        pools.hooks = vec!["é".repeat(150)];
        let s = MetadataSynthesizer::new(pools);
        let mut rng = StdRng::seed_from_u64(0);

        let title = s.title(&mut rng, "success");
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }
}
