use async_trait::async_trait;
use tracing::warn;

use super::{fuzzy_pool_bounds, Strategy, StrategyContext, StrategyOutcome};
use crate::resolver::accessor::CorpusAccessor;
use crate::resolver::constants::{strategy_ids, MIN_SLUG_LENGTH_FOR_FUZZY};
use crate::resolver::error::ResolverError;
use crate::resolver::fuzzy::{find_token_signature_matches, SignatureCandidate};

/// Strategy 5: order-independent token-signature matching (spec §4.E.5).
pub struct TokenSignatureStrategy;

#[async_trait]
impl Strategy for TokenSignatureStrategy {
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
                warn!(strategy = strategy_ids::TOKEN_SIGNATURE, error = %err, "corpus call failed, treating as empty");
                Vec::new()
            }
        };
        if pool.is_empty() {
            return Ok(None);
        }

        let candidates: Vec<SignatureCandidate<'_>> = pool
            .iter()
            .map(|m| SignatureCandidate { name: m.name.as_str(), slug: &m.slug })
            .collect();

        let matching_slugs =
            find_token_signature_matches(ctx.media_type, &ctx.match_info.original_input, &candidates);

        for slug in &matching_slugs {
            let attempt = ctx
                .accessor
                .search_media_by_slug_exact(ctx.system_id, slug, ctx.tag_filters, ctx.cancel)
                .await;
            let results = match attempt {
                Ok(results) => results,
                Err(err) => {
                    warn!(strategy = strategy_ids::TOKEN_SIGNATURE, error = %err, "corpus call failed, trying next candidate");
                    continue;
                }
            };
            if !results.is_empty() {
                return Ok(Some(StrategyOutcome {
                    results,
                    strategy_id: strategy_ids::TOKEN_SIGNATURE,
                    match_quality: 1.0,
                }));
            }
        }

        Ok(None)
    }
}
