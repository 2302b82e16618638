//! The ordered search-strategy pipeline (spec §4.E). Each strategy queries
//! the corpus accessor one (sometimes two) way and returns either a
//! non-empty result set plus its stable identifier and base quality, or
//! `None` to signal "try the next strategy".

mod exact;
mod jarowinkler;
mod signature;
mod title_split;
mod trim;

pub use exact::{ExactMatchStrategy, PrefixMatchStrategy};
pub use jarowinkler::JaroWinklerDamerauStrategy;
pub use signature::TokenSignatureStrategy;
pub use title_split::{MainTitleOnlyStrategy, SecondaryTitleExactStrategy};
pub use trim::ProgressiveTrimStrategy;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::accessor::CorpusAccessor;
use super::error::ResolverError;
use super::types::{GameMatchInfo, MediaType, SearchResult, TagFilter};

/// Everything a strategy needs to run a single attempt.
pub struct StrategyContext<'a> {
    pub accessor: &'a dyn CorpusAccessor,
    pub system_id: &'a str,
    pub match_info: &'a GameMatchInfo,
    pub tag_filters: &'a [TagFilter],
    pub media_type: MediaType,
    pub cancel: &'a CancellationToken,
}

/// A non-empty strategy result: the matched entries, the strategy that
/// produced them, and the base quality to hand the candidate selector.
pub struct StrategyOutcome {
    pub results: Vec<SearchResult>,
    pub strategy_id: &'static str,
    pub match_quality: f64,
}

/// A single search strategy (spec §4.E). Implementations other than
/// [`MainTitleOnlyStrategy`] must treat a corpus-accessor failure as "no
/// results" rather than propagating it — only main-title-only is a required
/// step whose failure aborts resolution (spec §7).
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Option<StrategyOutcome>, ResolverError>;
}

/// Pre-filter bounds for the token-signature and Jaro-Winkler strategies,
/// derived from the query's slug length and token count (spec §4.E step 6).
/// The spec states exact bounds only for the Jaro-Winkler strategy; the
/// token-signature strategy's "pre-filtered candidate pool" is unspecified,
/// so both strategies share this formula (see DESIGN.md).
pub(super) fn fuzzy_pool_bounds(match_info: &GameMatchInfo) -> (usize, usize, usize, usize) {
    let slug_len = match_info.canonical_slug.char_len();
    let word_count = match_info.slug_word_count;
    let min_slug_length = slug_len.saturating_sub(3);
    let max_slug_length = slug_len + 3;
    let min_word_count = word_count.saturating_sub(1).max(1);
    let max_word_count = word_count + 1;
    (min_slug_length, max_slug_length, min_word_count, max_word_count)
}

/// The seven ordered strategies the orchestrator runs on every query (spec
/// §4.G step 3). The two no-auto-tags fallbacks are constructed separately
/// by the orchestrator when they're actually needed.
pub fn default_pipeline() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(ExactMatchStrategy::base()),
        Box::new(PrefixMatchStrategy::base()),
        Box::new(MainTitleOnlyStrategy),
        Box::new(SecondaryTitleExactStrategy),
        Box::new(TokenSignatureStrategy),
        Box::new(JaroWinklerDamerauStrategy),
        Box::new(ProgressiveTrimStrategy),
    ]
}

/// The no-auto-tags fallback pair (spec §4.E step 8), run by the
/// orchestrator only when every strategy above returned nothing and
/// auto-extracted tags were present.
pub fn no_auto_tags_pipeline() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(ExactMatchStrategy::no_auto_tags()),
        Box::new(PrefixMatchStrategy::no_auto_tags()),
    ]
}
