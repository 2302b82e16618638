//! The resolver's single exposed operation (spec §4.G, §6.3).

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::accessor::{CorpusAccessor, ResolverConfig};
use super::constants::{CONFIDENCE_ACCEPTABLE, CONFIDENCE_HIGH, CONFIDENCE_MINIMUM};
use super::error::ResolverError;
use super::match_info::generate_match_info;
use super::selector::select_candidate;
use super::strategy::{default_pipeline, no_auto_tags_pipeline, StrategyContext};
use super::tag_filter::{extract_canonical_tags, merge_tag_filters};
use super::types::{MediaType, SearchResult, TagFilter};

/// The outcome of a [`resolve`] call (spec §6.3). `Error` is reserved for
/// the `ResolverError` path; everything else is returned as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Match {
        result: SearchResult,
        confidence: f64,
        strategy_id: &'static str,
        low_confidence: bool,
    },
    NoMatch,
}

struct BestSoFar {
    result: SearchResult,
    confidence: f64,
    strategy_id: &'static str,
}

/// Resolve `raw_title` against `system_id`'s corpus (spec §4.G).
///
/// Invalid input (empty title, empty system id, unrecognised media type) is
/// not an error: it simply fails to match anything and yields `NoMatch`.
#[instrument(skip(accessor, config, cancel), fields(system_id, raw_title))]
pub async fn resolve(
    system_id: &str,
    raw_title: &str,
    user_tag_filters: &[TagFilter],
    media_type: MediaType,
    config: &ResolverConfig,
    accessor: &dyn CorpusAccessor,
    cancel: &CancellationToken,
) -> Result<Resolution, ResolverError> {
    if cancel.is_cancelled() {
        return Err(ResolverError::Cancelled);
    }

    let (extracted_tags, residue) = extract_canonical_tags(raw_title);
    let tag_filters = merge_tag_filters(&extracted_tags, user_tag_filters);
    let match_info = generate_match_info(media_type, &residue);

    let mut best: Option<BestSoFar> = None;
    let mut any_strategy_returned_results = false;

    for strategy in default_pipeline() {
        if cancel.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }

        let ctx = StrategyContext {
            accessor,
            system_id,
            match_info: &match_info,
            tag_filters: &tag_filters,
            media_type,
            cancel,
        };

        let Some(outcome) = strategy.run(&ctx).await? else {
            continue;
        };
        any_strategy_returned_results = true;

        let selection = select_candidate(&outcome.results, &tag_filters, config, outcome.match_quality);
        let Some(candidate) = selection.candidate else {
            continue;
        };

        if selection.confidence >= CONFIDENCE_HIGH {
            info!(strategy = outcome.strategy_id, confidence = selection.confidence, "high-confidence match");
            return Ok(Resolution::Match {
                result: candidate,
                confidence: selection.confidence,
                strategy_id: outcome.strategy_id,
                low_confidence: false,
            });
        }

        if best.as_ref().map(|b| selection.confidence > b.confidence).unwrap_or(true) {
            best = Some(BestSoFar {
                result: candidate,
                confidence: selection.confidence,
                strategy_id: outcome.strategy_id,
            });
        }
    }

    if !any_strategy_returned_results && !extracted_tags.is_empty() {
        for strategy in no_auto_tags_pipeline() {
            if cancel.is_cancelled() {
                return Err(ResolverError::Cancelled);
            }

            let ctx = StrategyContext {
                accessor,
                system_id,
                match_info: &match_info,
                tag_filters: user_tag_filters,
                media_type,
                cancel,
            };

            let Some(outcome) = strategy.run(&ctx).await? else {
                continue;
            };

            let selection = select_candidate(&outcome.results, user_tag_filters, config, outcome.match_quality);
            let Some(candidate) = selection.candidate else {
                continue;
            };

            if selection.confidence >= CONFIDENCE_HIGH {
                return Ok(Resolution::Match {
                    result: candidate,
                    confidence: selection.confidence,
                    strategy_id: outcome.strategy_id,
                    low_confidence: false,
                });
            }

            if best.as_ref().map(|b| selection.confidence > b.confidence).unwrap_or(true) {
                best = Some(BestSoFar {
                    result: candidate,
                    confidence: selection.confidence,
                    strategy_id: outcome.strategy_id,
                });
            }
        }
    }

    match best {
        Some(b) if b.confidence >= CONFIDENCE_ACCEPTABLE => Ok(Resolution::Match {
            result: b.result,
            confidence: b.confidence,
            strategy_id: b.strategy_id,
            low_confidence: false,
        }),
        Some(b) if b.confidence >= CONFIDENCE_MINIMUM => Ok(Resolution::Match {
            result: b.result,
            confidence: b.confidence,
            strategy_id: b.strategy_id,
            low_confidence: true,
        }),
        _ => Ok(Resolution::NoMatch),
    }
}
