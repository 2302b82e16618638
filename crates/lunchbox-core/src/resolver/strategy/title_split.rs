use async_trait::async_trait;
use tracing::warn;

use super::{Strategy, StrategyContext, StrategyOutcome};
use crate::resolver::accessor::CorpusAccessor;
use crate::resolver::constants::{strategy_ids, MATCH_QUALITY_MAIN_TITLE, MATCH_QUALITY_SECONDARY_TITLE};
use crate::resolver::error::ResolverError;
use crate::resolver::types::{MediaTitle, SearchResult};

/// A corpus entry's main-title slug, derived from its precomputed slug and
/// secondary slug under the same concatenation invariant the match-info
/// builder guarantees for queries (spec §3.2 invariant 3).
fn candidate_main_title_slug(media: &MediaTitle) -> &str {
    if media.has_secondary_slug() {
        let cut = media.slug.as_str().len().saturating_sub(media.secondary_slug.as_str().len());
        &media.slug.as_str()[..cut]
    } else {
        media.slug.as_str()
    }
}

/// Strategy 3: main-title-only matching (spec §4.E.3). The only strategy
/// whose corpus-call failure is surfaced to the orchestrator rather than
/// treated as empty.
pub struct MainTitleOnlyStrategy;

#[async_trait]
impl Strategy for MainTitleOnlyStrategy {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Option<StrategyOutcome>, ResolverError> {
        let results = ctx
            .accessor
            .search_media_by_slug_prefix(ctx.system_id, &ctx.match_info.main_title_slug, ctx.tag_filters, ctx.cancel)
            .await?;

        if results.is_empty() {
            return Ok(None);
        }

        let mut exact_bucket = Vec::new();
        let mut partial_bucket = Vec::new();

        for candidate in results {
            let candidate_main = candidate_main_title_slug(&candidate.media).to_string();

            let is_exact = ctx.match_info.has_secondary_title
                && !candidate.media.has_secondary_slug()
                && candidate.media.slug.as_str() == ctx.match_info.main_title_slug.as_str();

            let is_partial_a = !ctx.match_info.has_secondary_title
                && candidate.media.has_secondary_slug()
                && candidate_main.starts_with(ctx.match_info.main_title_slug.as_str());

            let is_partial_b = ctx.match_info.has_secondary_title
                && candidate.media.has_secondary_slug()
                && candidate_main.starts_with(ctx.match_info.canonical_slug.as_str());

            if is_exact {
                exact_bucket.push(candidate);
            } else if is_partial_a || is_partial_b {
                partial_bucket.push(candidate);
            }
        }

        let chosen: Vec<SearchResult> = if !exact_bucket.is_empty() { exact_bucket } else { partial_bucket };

        if chosen.is_empty() {
            return Ok(None);
        }
        Ok(Some(StrategyOutcome {
            results: chosen,
            strategy_id: strategy_ids::MAIN_TITLE_ONLY,
            match_quality: MATCH_QUALITY_MAIN_TITLE,
        }))
    }
}

/// Strategy 4: secondary-title-only matching (spec §4.E.4).
pub struct SecondaryTitleExactStrategy;

#[async_trait]
impl Strategy for SecondaryTitleExactStrategy {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Option<StrategyOutcome>, ResolverError> {
        use crate::resolver::constants::MIN_SECONDARY_TITLE_SLUG_LENGTH;

        let slug_to_use = if ctx.match_info.has_secondary_title
            && ctx.match_info.secondary_title_slug.char_len() >= MIN_SECONDARY_TITLE_SLUG_LENGTH
        {
            &ctx.match_info.secondary_title_slug
        } else {
            &ctx.match_info.canonical_slug
        };

        let primary_attempt = ctx
            .accessor
            .search_media_by_slug_exact(ctx.system_id, slug_to_use, ctx.tag_filters, ctx.cancel)
            .await;
        let primary_results = match primary_attempt {
            Ok(results) => results,
            Err(err) => {
                warn!(strategy = strategy_ids::SECONDARY_TITLE_EXACT, error = %err, "corpus call failed, treating as empty");
                Vec::new()
            }
        };
        let filtered: Vec<SearchResult> = primary_results
            .into_iter()
            .filter(|c| !c.media.has_secondary_slug())
            .collect();
        if !filtered.is_empty() {
            return Ok(Some(StrategyOutcome {
                results: filtered,
                strategy_id: strategy_ids::SECONDARY_TITLE_EXACT,
                match_quality: MATCH_QUALITY_SECONDARY_TITLE,
            }));
        }

        let secondary_attempt = ctx
            .accessor
            .search_media_by_secondary_slug(ctx.system_id, slug_to_use, ctx.tag_filters, ctx.cancel)
            .await;
        let secondary_results = match secondary_attempt {
            Ok(results) => results,
            Err(err) => {
                warn!(strategy = strategy_ids::SECONDARY_TITLE_EXACT, error = %err, "corpus call failed, treating as empty");
                Vec::new()
            }
        };
        let filtered: Vec<SearchResult> = secondary_results
            .into_iter()
            .filter(|c| c.media.has_secondary_slug())
            .collect();
        if filtered.is_empty() {
            return Ok(None);
        }
        Ok(Some(StrategyOutcome {
            results: filtered,
            strategy_id: strategy_ids::SECONDARY_TITLE_EXACT,
            match_quality: MATCH_QUALITY_SECONDARY_TITLE,
        }))
    }
}
