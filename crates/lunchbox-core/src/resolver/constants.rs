//! Stable numeric and string constants for the resolver (spec §6.4, §6.5).
//!
//! These are part of the resolver's observable contract: strategy ids are
//! asserted on in tests and surfaced in diagnostics, and the confidence
//! thresholds gate the final resolution outcome. None of this is tunable at
//! runtime.

/// Confidence at or above which the orchestrator stops searching and returns
/// immediately.
pub const CONFIDENCE_HIGH: f64 = 0.95;
/// Confidence at or above which a result is returned without a low-confidence flag.
pub const CONFIDENCE_ACCEPTABLE: f64 = 0.70;
/// Confidence below which the resolver reports `NoMatch`.
pub const CONFIDENCE_MINIMUM: f64 = 0.60;

pub const MATCH_QUALITY_EXACT: f64 = 1.00;
pub const MATCH_QUALITY_SECONDARY_TITLE: f64 = 0.92;
pub const MATCH_QUALITY_MAIN_TITLE: f64 = 0.90;
pub const MATCH_QUALITY_PROGRESSIVE_TRIM: f64 = 0.85;

/// Minimum canonical-slug length before token-signature or fuzzy strategies run.
pub const MIN_SLUG_LENGTH_FOR_FUZZY: usize = 5;
/// Maximum length difference (in characters) admitted by the fuzzy pre-filter.
pub const FUZZY_MATCH_MAX_LENGTH_DIFF: usize = 2;
/// Minimum Jaro-Winkler similarity admitted by the fuzzy strategy.
pub const FUZZY_MATCH_MIN_SIMILARITY: f64 = 0.85;
/// Candidates are restricted to this many entries before the Damerau tie-break.
pub const FUZZY_TIE_BREAK_TOP_N: usize = 5;
/// Secondary-title slugs shorter than this are not attempted as standalone queries.
pub const MIN_SECONDARY_TITLE_SLUG_LENGTH: usize = 4;

/// Progressive-trim candidates shorter than this many characters are discarded.
pub const PROGRESSIVE_TRIM_MIN_SLUG_LEN: usize = 6;
/// Progressive trim requires at least this many words before it runs at all.
pub const PROGRESSIVE_TRIM_MIN_WORDS: usize = 3;
/// Default maximum trim depth used by the orchestrator's progressive-trim strategy.
pub const PROGRESSIVE_TRIM_MAX_DEPTH: usize = 3;

/// Stable strategy identifiers (spec §6.4). Emitted in diagnostics and
/// asserted on by tests; must never change.
pub mod strategy_ids {
    pub const EXACT_MATCH: &str = "strategy_exact_match";
    pub const PREFIX_MATCH: &str = "strategy_prefix_match";
    pub const MAIN_TITLE_ONLY: &str = "strategy_main_title_only";
    pub const SECONDARY_TITLE_EXACT: &str = "strategy_secondary_title_exact";
    pub const TOKEN_SIGNATURE: &str = "strategy_token_signature";
    pub const JAROWINKLER_DAMERAU: &str = "strategy_jarowinkler_damerau";
    pub const PROGRESSIVE_TRIM: &str = "strategy_progressive_trim";
    pub const EXACT_MATCH_NO_AUTO_TAGS: &str = "strategy_exact_match_no_auto_tags";
    pub const PREFIX_MATCH_NO_AUTO_TAGS: &str = "strategy_prefix_match_no_auto_tags";
}
