use async_trait::async_trait;
use tracing::warn;

use super::{Strategy, StrategyContext, StrategyOutcome};
use crate::resolver::constants::{strategy_ids, MATCH_QUALITY_EXACT};
use crate::resolver::error::ResolverError;

/// Strategy 1: entries whose slug equals `canonical_slug` (spec §4.E.1).
pub struct ExactMatchStrategy {
    id: &'static str,
}

impl ExactMatchStrategy {
    pub fn base() -> Self {
        ExactMatchStrategy { id: strategy_ids::EXACT_MATCH }
    }

    pub fn no_auto_tags() -> Self {
        ExactMatchStrategy { id: strategy_ids::EXACT_MATCH_NO_AUTO_TAGS }
    }
}

#[async_trait]
impl Strategy for ExactMatchStrategy {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Option<StrategyOutcome>, ResolverError> {
        let results = match ctx
            .accessor
            .search_media_by_slug_exact(ctx.system_id, &ctx.match_info.canonical_slug, ctx.tag_filters, ctx.cancel)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                warn!(strategy = self.id, error = %err, "corpus call failed, treating as empty");
                Vec::new()
            }
        };

        if results.is_empty() {
            return Ok(None);
        }
        Ok(Some(StrategyOutcome { results, strategy_id: self.id, match_quality: MATCH_QUALITY_EXACT }))
    }
}

/// Strategy 2: entries whose slug starts with `canonical_slug` (spec §4.E.2).
pub struct PrefixMatchStrategy {
    id: &'static str,
}

impl PrefixMatchStrategy {
    pub fn base() -> Self {
        PrefixMatchStrategy { id: strategy_ids::PREFIX_MATCH }
    }

    pub fn no_auto_tags() -> Self {
        PrefixMatchStrategy { id: strategy_ids::PREFIX_MATCH_NO_AUTO_TAGS }
    }
}

#[async_trait]
impl Strategy for PrefixMatchStrategy {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Option<StrategyOutcome>, ResolverError> {
        let results = match ctx
            .accessor
            .search_media_by_slug_prefix(ctx.system_id, &ctx.match_info.canonical_slug, ctx.tag_filters, ctx.cancel)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                warn!(strategy = self.id, error = %err, "corpus call failed, treating as empty");
                Vec::new()
            }
        };

        if results.is_empty() {
            return Ok(None);
        }
        Ok(Some(StrategyOutcome { results, strategy_id: self.id, match_quality: MATCH_QUALITY_EXACT }))
    }
}
