use async_trait::async_trait;
use tracing::warn;

use super::{Strategy, StrategyContext, StrategyOutcome};
use crate::resolver::accessor::CorpusAccessor;
use crate::resolver::constants::{strategy_ids, MATCH_QUALITY_PROGRESSIVE_TRIM, PROGRESSIVE_TRIM_MAX_DEPTH};
use crate::resolver::error::ResolverError;
use crate::resolver::match_info::generate_progressive_trim_candidates;
use crate::resolver::types::Slug;

/// Strategy 7: progressive word-trimming (spec §4.E.7). Only the exact-match
/// slugs from each trim depth are queried, in a single batched `slug IN`
/// lookup.
pub struct ProgressiveTrimStrategy;

#[async_trait]
impl Strategy for ProgressiveTrimStrategy {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Option<StrategyOutcome>, ResolverError> {
        let candidates = generate_progressive_trim_candidates(
            ctx.media_type,
            &ctx.match_info.original_input,
            PROGRESSIVE_TRIM_MAX_DEPTH,
        );

        let exact_slugs: Vec<Slug> = candidates.into_iter().filter(|c| c.is_exact).map(|c| c.slug).collect();
        if exact_slugs.is_empty() {
            return Ok(None);
        }

        let results = match ctx
            .accessor
            .search_media_by_slug_in(ctx.system_id, &exact_slugs, ctx.tag_filters, ctx.cancel)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                warn!(strategy = strategy_ids::PROGRESSIVE_TRIM, error = %err, "corpus call failed, treating as empty");
                Vec::new()
            }
        };

        if results.is_empty() {
            return Ok(None);
        }
        Ok(Some(StrategyOutcome {
            results,
            strategy_id: strategy_ids::PROGRESSIVE_TRIM,
            match_quality: MATCH_QUALITY_PROGRESSIVE_TRIM,
        }))
    }
}
