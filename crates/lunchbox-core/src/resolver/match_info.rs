//! Match-info builder and progressive-trim candidate generation (spec §4.D).

use super::constants::{
    PROGRESSIVE_TRIM_MIN_SLUG_LEN, PROGRESSIVE_TRIM_MIN_WORDS,
};
use super::slugify::{
    slugify, slugify_with_tokens, split_title, strip_edition_and_version_suffixes,
    strip_leading_article, strip_metadata_brackets, title_has_leading_article,
};
use super::types::{GameMatchInfo, MediaType, Slug};

/// Build the [`GameMatchInfo`] record every strategy consumes.
///
/// Constructs `canonical_slug` as the literal concatenation of
/// `main_title_slug` and `secondary_title_slug` when a secondary title is
/// present, guaranteeing the length invariant (spec §3.2 invariant 3) by
/// construction rather than by incidental agreement between two
/// independent slugification passes.
pub fn generate_match_info(media_type: MediaType, title: &str) -> GameMatchInfo {
    let has_leading_article = title_has_leading_article(media_type, title);
    let stripped = strip_leading_article(media_type, title);
    let (main, secondary, has_secondary_title) = split_title(&stripped);

    let (main_title_slug, main_tokens) = slugify_with_tokens(media_type, &main);
    let (secondary_title_slug, secondary_tokens) = if has_secondary_title {
        slugify_with_tokens(media_type, &secondary)
    } else {
        (Slug::default(), Vec::new())
    };

    let canonical_slug = if has_secondary_title {
        Slug::new(format!("{main_title_slug}{secondary_title_slug}"))
    } else {
        main_title_slug.clone()
    };

    GameMatchInfo {
        original_input: title.to_string(),
        canonical_slug,
        main_title_slug,
        secondary_title_slug,
        has_secondary_title,
        has_leading_article,
        slug_word_count: main_tokens.len() + secondary_tokens.len(),
    }
}

/// A progressive-trim candidate: a slug produced by dropping trailing words,
/// marked for use as either an exact-match or prefix-match probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimCandidate {
    pub slug: Slug,
    pub word_count: usize,
    pub is_exact: bool,
    pub is_prefix: bool,
}

/// Generate progressive-trim candidates (spec §4.D).
///
/// Strips metadata brackets and edition/version suffixes once up front,
/// then emits one exact and one prefix candidate per trim depth, stopping
/// early once slugs fall below the minimum length (all further trims would
/// only be shorter).
pub fn generate_progressive_trim_candidates(
    media_type: MediaType,
    title: &str,
    max_depth: usize,
) -> Vec<TrimCandidate> {
    let no_brackets = strip_metadata_brackets(title);
    let no_suffix = strip_edition_and_version_suffixes(&no_brackets);
    let words: Vec<&str> = no_suffix.split_whitespace().collect();

    if words.len() < PROGRESSIVE_TRIM_MIN_WORDS {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    let mut seen_slugs = std::collections::HashSet::new();
    let max_trim = (words.len() - 1).min(max_depth);

    for trim in 0..=max_trim {
        let kept = words.len() - trim;
        let joined = words[..kept].join(" ");
        let slug = slugify(media_type, &joined);

        if slug.char_len() < PROGRESSIVE_TRIM_MIN_SLUG_LEN {
            break;
        }
        if !seen_slugs.insert(slug.clone()) {
            continue;
        }

        candidates.push(TrimCandidate {
            slug: slug.clone(),
            word_count: kept,
            is_exact: true,
            is_prefix: false,
        });
        candidates.push(TrimCandidate {
            slug,
            word_count: kept,
            is_exact: false,
            is_prefix: true,
        });
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_secondary_title_matches_canonical() {
        let info = generate_match_info(MediaType::Game, "Super Mario World");
        assert!(!info.has_secondary_title);
        assert_eq!(info.secondary_title_slug, Slug::default());
        assert_eq!(info.canonical_slug, info.main_title_slug);
    }

    #[test]
    fn secondary_title_concatenation_invariant_holds() {
        let info = generate_match_info(
            MediaType::Game,
            "The Legend of Zelda: Ocarina of Time",
        );
        assert!(info.has_secondary_title);
        assert_eq!(
            info.canonical_slug.char_len(),
            info.main_title_slug.char_len() + info.secondary_title_slug.char_len()
        );
        assert_eq!(info.main_title_slug.as_str(), "legendofzelda");
        assert_eq!(info.secondary_title_slug.as_str(), "ocarinaoftime");
    }

    #[test]
    fn progressive_trim_requires_at_least_three_words() {
        let candidates =
            generate_progressive_trim_candidates(MediaType::Game, "Mario World", 3);
        assert!(candidates.is_empty());
    }

    #[test]
    fn progressive_trim_emits_exact_before_prefix_per_depth() {
        let candidates = generate_progressive_trim_candidates(
            MediaType::Game,
            "Super Mario World Special Edition",
            3,
        );
        assert!(!candidates.is_empty());
        // first pair (trim=0) should be exact then prefix for the same slug
        assert!(candidates[0].is_exact);
        assert!(candidates[1].is_prefix);
        assert_eq!(candidates[0].slug, candidates[1].slug);
    }

    #[test]
    fn progressive_trim_stops_once_slug_too_short() {
        let candidates =
            generate_progressive_trim_candidates(MediaType::Game, "A B C D E", 10);
        for c in &candidates {
            assert!(c.slug.char_len() >= PROGRESSIVE_TRIM_MIN_SLUG_LEN);
        }
    }
}
