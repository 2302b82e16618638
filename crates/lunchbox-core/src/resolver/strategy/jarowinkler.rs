use async_trait::async_trait;
use tracing::warn;

use super::{fuzzy_pool_bounds, Strategy, StrategyContext, StrategyOutcome};
use crate::resolver::accessor::CorpusAccessor;
use crate::resolver::constants::{
    strategy_ids, FUZZY_MATCH_MAX_LENGTH_DIFF, FUZZY_MATCH_MIN_SIMILARITY, FUZZY_TIE_BREAK_TOP_N,
    MIN_SLUG_LENGTH_FOR_FUZZY,
};
use crate::resolver::error::ResolverError;
use crate::resolver::fuzzy::{damerau_tie_breaker, find_fuzzy_matches};
use crate::resolver::types::Slug;

/// Strategy 6: Jaro-Winkler similarity re-ranked by Damerau-Levenshtein
/// distance (spec §4.E.6).
pub struct JaroWinklerDamerauStrategy;

#[async_trait]
impl Strategy for JaroWinklerDamerauStrategy {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Option<StrategyOutcome>, ResolverError> {
        if ctx.match_info.canonical_slug.char_len() < MIN_SLUG_LENGTH_FOR_FUZZY {
            return Ok(None);
        }

        let (min_len, max_len, min_words, max_words) = fuzzy_pool_bounds(ctx.match_info);
        let pool = match ctx
            .accessor
            .get_titles_with_pre_filter(ctx.system_id, min_len, max_len, min_words, max_words, ctx.cancel)
            .await
        {
            Ok(pool) => pool,
            Err(err) => {
                warn!(strategy = strategy_ids::JAROWINKLER_DAMERAU, error = %err, "corpus call failed, treating as empty");
                Vec::new()
            }
        };
        if pool.is_empty() {
            return Ok(None);
        }

        let pool_slugs: Vec<Slug> = pool.iter().map(|m| m.slug.clone()).collect();
        let fuzzy_matches = find_fuzzy_matches(
            &ctx.match_info.canonical_slug,
            &pool_slugs,
            FUZZY_MATCH_MAX_LENGTH_DIFF,
            FUZZY_MATCH_MIN_SIMILARITY,
        );
        if fuzzy_matches.is_empty() {
            return Ok(None);
        }

        let ranked = damerau_tie_breaker(&ctx.match_info.canonical_slug, &fuzzy_matches, FUZZY_TIE_BREAK_TOP_N);

        for ranked_match in &ranked {
            let attempt = ctx
                .accessor
                .search_media_by_slug_exact(ctx.system_id, &ranked_match.slug, ctx.tag_filters, ctx.cancel)
                .await;
            let results = match attempt {
                Ok(results) => results,
                Err(err) => {
                    warn!(strategy = strategy_ids::JAROWINKLER_DAMERAU, error = %err, "corpus call failed, trying next candidate");
                    continue;
                }
            };
            if results.is_empty() {
                continue;
            }

            let similarity = fuzzy_matches
                .iter()
                .find(|m| m.slug == ranked_match.slug)
                .map(|m| m.similarity)
                .unwrap_or(FUZZY_MATCH_MIN_SIMILARITY);

            return Ok(Some(StrategyOutcome {
                results,
                strategy_id: strategy_ids::JAROWINKLER_DAMERAU,
                match_quality: similarity,
            }));
        }

        Ok(None)
    }
}
