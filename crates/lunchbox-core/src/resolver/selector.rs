//! Candidate selection: variant/re-release exclusion, region/language
//! preference, file-type priority, and quality tiebreak, plus tag-aware
//! confidence scoring (spec §4.F).

use super::accessor::ResolverConfig;
use super::types::{MediaTitle, SearchResult, TagFilter, TagOperator};

const VARIANT_UNFINISHED_VALUES: &[&str] =
    &["demo", "beta", "proto", "alpha", "sample", "preview", "prerelease"];
const VARIANT_UNLICENSED_VALUES: &[&str] = &["hack", "translation", "bootleg", "clone"];

const VARIANT_TAG_TYPES: &[&str] = &["unfinished", "unlicensed", "dump"];

/// Outcome of the candidate selector: either a single chosen candidate with
/// its confidence, or a rejection (confidence 0.0, no candidate).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    pub candidate: Option<SearchResult>,
    pub confidence: f64,
}

impl SelectionOutcome {
    fn reject() -> Self {
        SelectionOutcome { candidate: None, confidence: 0.0 }
    }

    fn accept(candidate: SearchResult, confidence: f64) -> Self {
        SelectionOutcome { candidate: Some(candidate), confidence }
    }
}

/// A candidate is a "variant" if it carries any unfinished/unlicensed/bad-dump
/// tag (spec §4.F.3). Version-suffixed values (`beta2`, `demo-kiosk`) match
/// by prefix.
pub fn is_variant(media: &MediaTitle) -> bool {
    media.tags.iter().any(|tag| {
        let value_lower = tag.value.to_ascii_lowercase();
        if tag.tag_type.eq_ignore_ascii_case("unfinished") {
            VARIANT_UNFINISHED_VALUES.iter().any(|v| value_lower.starts_with(v))
        } else if tag.tag_type.eq_ignore_ascii_case("unlicensed") {
            VARIANT_UNLICENSED_VALUES.iter().any(|v| value_lower.starts_with(v))
        } else if tag.tag_type.eq_ignore_ascii_case("dump") {
            value_lower == "bad"
        } else {
            false
        }
    })
}

fn is_rerelease(media: &MediaTitle) -> bool {
    media
        .tags
        .iter()
        .any(|t| t.tag_type.eq_ignore_ascii_case("rerelease") || t.tag_type.eq_ignore_ascii_case("reboxed"))
}

fn user_targets_variant(filters: &[TagFilter]) -> bool {
    filters
        .iter()
        .any(|f| VARIANT_TAG_TYPES.iter().any(|t| f.tag_type.eq_ignore_ascii_case(t)))
}

fn conflict_weight(tag_type: &str) -> f64 {
    if tag_type.eq_ignore_ascii_case("year") {
        0.05
    } else {
        0.2
    }
}

/// Tag-aware confidence multiplier (spec §4.F.2).
pub fn tag_confidence(media: &MediaTitle, filters: &[TagFilter]) -> f64 {
    if filters.is_empty() {
        return 1.0;
    }
    if media.tags.is_empty() {
        return 0.65;
    }

    let and_filters: Vec<&TagFilter> = filters.iter().filter(|f| f.operator == TagOperator::And).collect();
    let not_filters: Vec<&TagFilter> = filters.iter().filter(|f| f.operator == TagOperator::Not).collect();
    let or_filters: Vec<&TagFilter> = filters.iter().filter(|f| f.operator == TagOperator::Or).collect();

    let n = and_filters.len() + not_filters.len() + usize::from(!or_filters.is_empty());
    if n == 0 {
        return 1.0;
    }

    let mut matches = 0.0_f64;
    let mut penalty = 0.0_f64;

    for f in &and_filters {
        if media.has_tag(&f.tag_type, &f.value) {
            matches += 1.0;
        } else {
            penalty += conflict_weight(&f.tag_type);
        }
    }

    for f in &not_filters {
        if media.has_tag(&f.tag_type, &f.value) {
            penalty += conflict_weight(&f.tag_type);
        } else {
            matches += 1.0;
        }
    }

    if !or_filters.is_empty() {
        let satisfied = or_filters.iter().any(|f| media.has_tag(&f.tag_type, &f.value));
        if satisfied {
            matches += 1.0;
        } else {
            let all_year = or_filters.iter().all(|f| f.tag_type.eq_ignore_ascii_case("year"));
            penalty += if all_year { 0.05 } else { 0.2 };
        }
    }

    (matches / n as f64 - penalty).clamp(0.0, 1.0)
}

pub(crate) fn passes_filter_set(media: &MediaTitle, filters: &[TagFilter]) -> bool {
    let and_ok = filters
        .iter()
        .filter(|f| f.operator == TagOperator::And)
        .all(|f| media.has_tag(&f.tag_type, &f.value));
    let not_ok = filters
        .iter()
        .filter(|f| f.operator == TagOperator::Not)
        .all(|f| !media.has_tag(&f.tag_type, &f.value));
    let or_filters: Vec<&TagFilter> = filters.iter().filter(|f| f.operator == TagOperator::Or).collect();
    let or_ok = or_filters.is_empty() || or_filters.iter().any(|f| media.has_tag(&f.tag_type, &f.value));
    and_ok && not_ok && or_ok
}

fn finalize(candidate: &SearchResult, match_quality: f64, filters: &[TagFilter]) -> SelectionOutcome {
    let confidence = match_quality * tag_confidence(&candidate.media, filters);
    SelectionOutcome::accept(candidate.clone(), confidence)
}

fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[..idx],
        _ => filename,
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    match filename.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < filename.len() => Some(&filename[idx + 1..]),
        _ => None,
    }
}

fn has_duplicate_suffix(filename: &str) -> u8 {
    let stem = strip_extension(filename).trim_end();
    if stem.ends_with("- Copy") || stem.ends_with(" copy") {
        return 1;
    }
    if let Some(open) = stem.rfind('(') {
        if stem.ends_with(')') {
            let inside = &stem[open + 1..stem.len() - 1];
            if !inside.is_empty() && inside.chars().all(|c| c.is_ascii_digit()) {
                return 1;
            }
        }
    }
    0
}

fn character_density(filename: &str) -> usize {
    let stem = strip_extension(filename);
    let double_underscore_runs = stem.matches("__").count();
    let distinct_separators = usize::from(stem.contains('-')) + usize::from(stem.contains('_'));
    double_underscore_runs + distinct_separators
}

/// Four-axis quality score (spec §4.F step 8). Lexicographically smaller is
/// better.
fn quality_score(result: &SearchResult) -> (u8, usize, usize, usize) {
    let filename = result.file_name();
    (
        has_duplicate_suffix(filename),
        result.path_depth(),
        character_density(filename),
        filename.chars().count(),
    )
}

fn region_or_language_partition<'a>(
    candidates: &[&'a SearchResult],
    tag_type: &str,
    preferred: &[String],
) -> Vec<&'a SearchResult> {
    let preferred_lower: Vec<String> = preferred.iter().map(|s| s.to_ascii_lowercase()).collect();
    let mut preferred_bucket = Vec::new();
    let mut untagged_bucket = Vec::new();
    let mut other_bucket = Vec::new();

    for candidate in candidates {
        let relevant: Vec<&str> = candidate
            .media
            .tags
            .iter()
            .filter(|t| t.tag_type.eq_ignore_ascii_case(tag_type))
            .map(|t| t.value.as_str())
            .collect();

        if relevant.is_empty() {
            untagged_bucket.push(*candidate);
        } else if relevant
            .iter()
            .any(|v| preferred_lower.contains(&v.to_ascii_lowercase()))
        {
            preferred_bucket.push(*candidate);
        } else {
            other_bucket.push(*candidate);
        }
    }

    if !preferred_bucket.is_empty() {
        preferred_bucket
    } else if !untagged_bucket.is_empty() {
        untagged_bucket
    } else {
        other_bucket
    }
}

/// Run the full candidate-selection pipeline (spec §4.F). `candidates` must
/// be non-empty and belong to a single strategy; `match_quality` is that
/// strategy's base quality (or reported similarity for fuzzy strategies).
pub fn select_candidate(
    candidates: &[SearchResult],
    tag_filters: &[TagFilter],
    config: &ResolverConfig,
    match_quality: f64,
) -> SelectionOutcome {
    if candidates.is_empty() {
        return SelectionOutcome::reject();
    }

    // Stage 1: singleton short-circuit.
    if candidates.len() == 1 {
        let only = &candidates[0];
        if is_variant(&only.media) && !user_targets_variant(tag_filters) {
            return SelectionOutcome::reject();
        }
        return finalize(only, match_quality, tag_filters);
    }

    let mut working: Vec<&SearchResult> = candidates.iter().collect();

    // Stage 2: user tag filter.
    if !tag_filters.is_empty() {
        let reduced: Vec<&SearchResult> = working
            .iter()
            .copied()
            .filter(|c| passes_filter_set(&c.media, tag_filters))
            .collect();
        if reduced.len() == 1 {
            return finalize(reduced[0], match_quality, tag_filters);
        }
        if !reduced.is_empty() {
            working = reduced;
        }
    }

    // Stage 3: variant exclusion.
    if !user_targets_variant(tag_filters) {
        let non_variants: Vec<&SearchResult> = working
            .iter()
            .copied()
            .filter(|c| !is_variant(&c.media))
            .collect();
        if non_variants.is_empty() {
            return SelectionOutcome::reject();
        }
        if non_variants.len() == 1 {
            return finalize(non_variants[0], match_quality, tag_filters);
        }
        working = non_variants;
    }

    // Stage 4: re-release exclusion.
    let non_rerelease: Vec<&SearchResult> = working
        .iter()
        .copied()
        .filter(|c| !is_rerelease(&c.media))
        .collect();
    if !non_rerelease.is_empty() {
        if non_rerelease.len() == 1 {
            return finalize(non_rerelease[0], match_quality, tag_filters);
        }
        working = non_rerelease;
    }

    // Stage 5: region preference.
    working = region_or_language_partition(&working, "region", &config.preferred_regions);
    if working.len() == 1 {
        return finalize(working[0], match_quality, tag_filters);
    }

    // Stage 6: language preference.
    working = region_or_language_partition(&working, "language", &config.preferred_languages);
    if working.len() == 1 {
        return finalize(working[0], match_quality, tag_filters);
    }

    // Stage 7: file-type priority.
    let scores: Vec<Option<usize>> = working
        .iter()
        .map(|c| extension_of(c.file_name()).and_then(|ext| config.extension_priority(ext)))
        .collect();
    if let Some(best) = scores.iter().flatten().min().copied() {
        let filtered: Vec<&SearchResult> = working
            .iter()
            .zip(scores.iter())
            .filter(|(_, score)| **score == Some(best))
            .map(|(c, _)| *c)
            .collect();
        if !filtered.is_empty() {
            working = filtered;
        }
    }
    if working.len() == 1 {
        return finalize(working[0], match_quality, tag_filters);
    }

    // Stage 8: quality tiebreak — lexicographically minimum score wins.
    let winner = working
        .iter()
        .min_by_key(|c| quality_score(c))
        .expect("working is non-empty at this point");

    finalize(winner, match_quality, tag_filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::types::{Slug, TagInfo};

    fn media(id: &str, tags: Vec<(&str, &str)>) -> MediaTitle {
        MediaTitle {
            id: id.to_string(),
            name: id.to_string(),
            slug: Slug::new(id),
            secondary_slug: Slug::default(),
            slug_length: id.len(),
            slug_word_count: 1,
            tags: tags.into_iter().map(|(t, v)| TagInfo::new(t, v)).collect(),
        }
    }

    fn result(id: &str, path: &str, tags: Vec<(&str, &str)>) -> SearchResult {
        SearchResult {
            media: media(id, tags),
            file_path: path.to_string(),
            system_id: "snes".to_string(),
        }
    }

    #[test]
    fn singleton_variant_without_user_request_is_rejected() {
        let candidates = vec![result("zelda", "/roms/zelda.zip", vec![("unlicensed", "translation")])];
        let outcome = select_candidate(&candidates, &[], &ResolverConfig::default(), 1.0);
        assert!(outcome.candidate.is_none());
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn singleton_variant_with_user_request_is_accepted() {
        let candidates = vec![result("zelda", "/roms/zelda.zip", vec![("unlicensed", "translation")])];
        let filters = vec![TagFilter::new("unlicensed", "translation", TagOperator::And)];
        let outcome = select_candidate(&candidates, &filters, &ResolverConfig::default(), 1.0);
        assert!(outcome.candidate.is_some());
        assert!(outcome.confidence > 0.0);
    }

    #[test]
    fn singleton_non_variant_accepted_with_no_filters() {
        let candidates = vec![result("mario", "/roms/mario.zip", vec![])];
        let outcome = select_candidate(&candidates, &[], &ResolverConfig::default(), 1.0);
        assert_eq!(outcome.confidence, 1.0);
    }

    #[test]
    fn all_variants_rejected() {
        let candidates = vec![
            result("a", "/a.zip", vec![("unfinished", "beta")]),
            result("b", "/b.zip", vec![("unfinished", "demo")]),
        ];
        let outcome = select_candidate(&candidates, &[], &ResolverConfig::default(), 1.0);
        assert!(outcome.candidate.is_none());
    }

    #[test]
    fn region_preference_picks_configured_region() {
        let candidates = vec![
            result("usa", "/usa.zip", vec![("region", "us")]),
            result("jpn", "/jpn.zip", vec![("region", "jp")]),
        ];
        let config = ResolverConfig {
            preferred_regions: vec!["us".to_string()],
            ..Default::default()
        };
        let outcome = select_candidate(&candidates, &[], &config, 1.0);
        assert_eq!(outcome.candidate.unwrap().media.id, "usa");
    }

    #[test]
    fn quality_tiebreak_prefers_clean_shallow_short_name() {
        let candidates = vec![
            result("a", "deep/nested/path/Game (1).zip", vec![]),
            result("a", "Game.zip", vec![]),
        ];
        let outcome = select_candidate(&candidates, &[], &ResolverConfig::default(), 1.0);
        assert_eq!(outcome.candidate.unwrap().file_path, "Game.zip");
    }

    #[test]
    fn tag_confidence_no_filters_is_one() {
        let m = media("x", vec![]);
        assert_eq!(tag_confidence(&m, &[]), 1.0);
    }

    #[test]
    fn tag_confidence_missing_metadata_floor() {
        let m = media("x", vec![]);
        let filters = vec![TagFilter::new("region", "us", TagOperator::And)];
        assert_eq!(tag_confidence(&m, &filters), 0.65);
    }

    #[test]
    fn tag_confidence_full_match_is_one() {
        let m = media("x", vec![("region", "us")]);
        let filters = vec![TagFilter::new("region", "us", TagOperator::And)];
        assert_eq!(tag_confidence(&m, &filters), 1.0);
    }

    #[test]
    fn tag_confidence_conflict_reduces_score() {
        let m = media("x", vec![("region", "jp")]);
        let filters = vec![TagFilter::new("region", "us", TagOperator::And)];
        let conf = tag_confidence(&m, &filters);
        assert!(conf < 1.0);
    }
}
