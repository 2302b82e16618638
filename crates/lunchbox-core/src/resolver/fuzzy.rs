//! Fuzzy matching primitives: Jaro-Winkler similarity, Damerau-Levenshtein
//! distance, token-signature equality, and fixed-size re-ranking (spec §4.C).
//!
//! All functions here are total — empty or degenerate inputs return sane
//! defaults rather than panicking, per spec §7 ("fuzzy primitives never panic").

use super::slugify::slugify_with_tokens;
use super::types::{MediaType, Slug, TokenSignature};

const WINKLER_PREFIX_WEIGHT: f64 = 0.1;
const WINKLER_PREFIX_CAP: usize = 4;

/// Jaro similarity with the Winkler common-prefix bonus, clamped to `[0.0, 1.0]`.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let jaro = jaro_similarity(a, b);
    if jaro <= 0.0 {
        return 0.0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let prefix_len = a_chars
        .iter()
        .zip(b_chars.iter())
        .take(WINKLER_PREFIX_CAP)
        .take_while(|(x, y)| x == y)
        .count();

    (jaro + prefix_len as f64 * WINKLER_PREFIX_WEIGHT * (1.0 - jaro)).clamp(0.0, 1.0)
}

fn jaro_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 && b_len == 0 {
        return 1.0;
    }
    if a_len == 0 || b_len == 0 {
        return 0.0;
    }

    let match_distance = (a_len.max(b_len) / 2).saturating_sub(1);

    let mut a_matches = vec![false; a_len];
    let mut b_matches = vec![false; b_len];
    let mut matches = 0usize;

    for i in 0..a_len {
        let lo = i.saturating_sub(match_distance);
        let hi = (i + match_distance + 1).min(b_len);
        for j in lo..hi {
            if b_matches[j] || a_chars[i] != b_chars[j] {
                continue;
            }
            a_matches[i] = true;
            b_matches[j] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut k = 0usize;
    for i in 0..a_len {
        if !a_matches[i] {
            continue;
        }
        while !b_matches[k] {
            k += 1;
        }
        if a_chars[i] != b_chars[k] {
            transpositions += 1;
        }
        k += 1;
    }
    let transpositions = transpositions / 2;

    let m = matches as f64;
    (m / a_len as f64 + m / b_len as f64 + (m - transpositions as f64) / m) / 3.0
}

/// Damerau-Levenshtein distance (optimal string alignment variant, with
/// adjacent-transposition support).
pub fn damerau_levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut d = vec![vec![0usize; b_len + 1]; a_len + 1];
    for i in 0..=a_len {
        d[i][0] = i;
    }
    for j in 0..=b_len {
        d[0][j] = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            let deletion = d[i - 1][j] + 1;
            let insertion = d[i][j - 1] + 1;
            let substitution = d[i - 1][j - 1] + cost;
            let mut best = deletion.min(insertion).min(substitution);

            if i > 1
                && j > 1
                && a_chars[i - 1] == b_chars[j - 2]
                && a_chars[i - 2] == b_chars[j - 1]
            {
                best = best.min(d[i - 2][j - 2] + cost);
            }

            d[i][j] = best;
        }
    }

    d[a_len][b_len]
}

/// A fuzzy match result: the candidate slug and its Jaro-Winkler similarity
/// to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub slug: Slug,
    pub similarity: f64,
}

/// Find candidates within `max_len_diff` characters of `query` whose
/// Jaro-Winkler similarity is at least `min_similarity`. Exact matches are
/// skipped. The result is sorted by similarity descending, stable on ties
/// (input order preserved).
pub fn find_fuzzy_matches(
    query: &Slug,
    candidates: &[Slug],
    max_len_diff: usize,
    min_similarity: f64,
) -> Vec<FuzzyMatch> {
    if query.is_empty() || candidates.is_empty() {
        return Vec::new();
    }

    let query_len = query.char_len();
    let mut results: Vec<FuzzyMatch> = candidates
        .iter()
        .filter(|candidate| candidate.as_str() != query.as_str())
        .filter(|candidate| {
            query_len.abs_diff(candidate.char_len()) <= max_len_diff
        })
        .filter_map(|candidate| {
            let similarity = jaro_winkler(query.as_str(), candidate.as_str()).clamp(0.0, 1.0);
            if similarity >= min_similarity {
                Some(FuzzyMatch {
                    slug: candidate.clone(),
                    similarity,
                })
            } else {
                None
            }
        })
        .collect();

    results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    results
}

/// A match re-ranked by Damerau-Levenshtein distance.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceRankedMatch {
    pub slug: Slug,
    pub distance: usize,
}

/// Restrict `matches` to the first `top_n` entries, recompute
/// Damerau-Levenshtein distance against `query`, and sort ascending
/// (lower distance is better). Ties preserve incoming order.
pub fn damerau_tie_breaker(
    query: &Slug,
    matches: &[FuzzyMatch],
    top_n: usize,
) -> Vec<DistanceRankedMatch> {
    if matches.len() <= 1 {
        return matches
            .iter()
            .map(|m| DistanceRankedMatch {
                slug: m.slug.clone(),
                distance: damerau_levenshtein(query.as_str(), m.slug.as_str()),
            })
            .collect();
    }

    let restricted = if top_n > 0 && matches.len() > top_n {
        &matches[..top_n]
    } else {
        matches
    };

    let mut ranked: Vec<DistanceRankedMatch> = restricted
        .iter()
        .map(|m| DistanceRankedMatch {
            slug: m.slug.clone(),
            distance: damerau_levenshtein(query.as_str(), m.slug.as_str()),
        })
        .collect();

    ranked.sort_by_key(|m| m.distance);
    ranked
}

/// Compute the order-independent token signature for `title`: its tokens,
/// alphabetically sorted and joined with `_`.
pub fn token_signature(media_type: MediaType, title: &str) -> TokenSignature {
    let (_, mut tokens) = slugify_with_tokens(media_type, title);
    tokens.sort();
    TokenSignature::new(tokens.join("_"))
}

/// A candidate for token-signature matching: the corpus's display name
/// (which retains word boundaries, unlike its slug) paired with the slug to
/// return on a signature match.
#[derive(Debug, Clone, Copy)]
pub struct SignatureCandidate<'a> {
    pub name: &'a str,
    pub slug: &'a Slug,
}

/// Return the slugs of every candidate whose token signature exactly
/// equals the query's.
pub fn find_token_signature_matches(
    media_type: MediaType,
    query_title: &str,
    candidates: &[SignatureCandidate<'_>],
) -> Vec<Slug> {
    let query_signature = token_signature(media_type, query_title);
    if query_signature.is_empty() {
        return Vec::new();
    }

    candidates
        .iter()
        .filter(|c| token_signature(media_type, c.name) == query_signature)
        .map(|c| c.slug.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaro_winkler_identical_strings_is_one() {
        assert_eq!(jaro_winkler("chronotrigger", "chronotrigger"), 1.0);
    }

    #[test]
    fn jaro_winkler_bounds_are_respected() {
        let sim = jaro_winkler("cronotigger", "chronotrigger");
        assert!((0.0..=1.0).contains(&sim));
        assert!(sim > 0.8);
    }

    #[test]
    fn jaro_winkler_empty_strings() {
        assert_eq!(jaro_winkler("", ""), 1.0);
        assert_eq!(jaro_winkler("a", ""), 0.0);
    }

    #[test]
    fn damerau_levenshtein_handles_transposition() {
        // "ab" -> "ba" is a single adjacent transposition.
        assert_eq!(damerau_levenshtein("ab", "ba"), 1);
    }

    #[test]
    fn damerau_levenshtein_identical_is_zero() {
        assert_eq!(damerau_levenshtein("same", "same"), 0);
    }

    #[test]
    fn find_fuzzy_matches_skips_exact_and_applies_threshold() {
        let query = Slug::new("chronotrigger");
        let candidates = vec![
            Slug::new("chronotrigger"),      // exact, skipped
            Slug::new("cronotigger"),        // close, length diff 2
            Slug::new("somethingtotallyoff"), // too different in length
        ];
        let matches = find_fuzzy_matches(&query, &candidates, 2, 0.85);
        assert!(matches.iter().all(|m| m.slug.as_str() != "chronotrigger"));
        assert!(matches.iter().all(|m| m.similarity >= 0.85));
        for w in matches.windows(2) {
            assert!(w[0].similarity >= w[1].similarity);
        }
    }

    #[test]
    fn find_fuzzy_matches_length_prefilter() {
        let query = Slug::new("abcde");
        let candidates = vec![Slug::new("abcdefghij")]; // length diff 5 > max_len_diff 2
        let matches = find_fuzzy_matches(&query, &candidates, 2, 0.0);
        assert!(matches.is_empty());
    }

    #[test]
    fn find_fuzzy_matches_empty_inputs() {
        assert!(find_fuzzy_matches(&Slug::default(), &[Slug::new("x")], 2, 0.5).is_empty());
        assert!(find_fuzzy_matches(&Slug::new("x"), &[], 2, 0.5).is_empty());
    }

    #[test]
    fn damerau_tie_breaker_provenance_and_size() {
        let query = Slug::new("chronotrigger");
        let matches = vec![
            FuzzyMatch { slug: Slug::new("cronotigger"), similarity: 0.9 },
            FuzzyMatch { slug: Slug::new("chronotrigga"), similarity: 0.88 },
            FuzzyMatch { slug: Slug::new("chronotrigr"), similarity: 0.87 },
        ];
        let ranked = damerau_tie_breaker(&query, &matches, 2);
        assert!(ranked.len() <= 2);
        let input_slugs: Vec<&str> = matches.iter().map(|m| m.slug.as_str()).collect();
        for r in &ranked {
            assert!(input_slugs.contains(&r.slug.as_str()));
        }
        for w in ranked.windows(2) {
            assert!(w[0].distance <= w[1].distance);
        }
    }

    #[test]
    fn damerau_tie_breaker_singleton_unchanged() {
        let query = Slug::new("chronotrigger");
        let matches = vec![FuzzyMatch { slug: Slug::new("chronotrigger"), similarity: 1.0 }];
        let ranked = damerau_tie_breaker(&query, &matches, 5);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn token_signature_is_order_independent() {
        let sig_a = token_signature(MediaType::Game, "Mario World Super");
        let sig_b = token_signature(MediaType::Game, "Super Mario World");
        assert_eq!(sig_a, sig_b);
    }

    #[test]
    fn find_token_signature_matches_exact_equality() {
        let slug = Slug::new("supermarioworld");
        let candidates = vec![SignatureCandidate { name: "Super Mario World", slug: &slug }];
        let matches =
            find_token_signature_matches(MediaType::Game, "Mario World Super", &candidates);
        assert_eq!(matches, vec![Slug::new("supermarioworld")]);
    }
}
