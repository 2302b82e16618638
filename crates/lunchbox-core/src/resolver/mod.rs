//! Media title resolver: turns a raw ROM/file title into a confident match
//! against an indexed corpus of known titles.
//!
//! The resolver is a pure, single-threaded computation over whatever the
//! host's [`accessor::CorpusAccessor`] hands back — no database access, no
//! filesystem access, no global state. See [`orchestrator::resolve`] for the
//! single entry point.

pub mod accessor;
pub mod constants;
pub mod error;
pub mod fuzzy;
pub mod match_info;
pub mod orchestrator;
pub mod selector;
pub mod slugify;
pub mod sqlx_corpus;
pub mod strategy;
pub mod tag_filter;
pub mod types;

pub use accessor::{CorpusAccessor, LauncherExtensions, ResolverConfig};
pub use error::ResolverError;
pub use orchestrator::{resolve, Resolution};
pub use sqlx_corpus::SqlxCorpusAccessor;
pub use types::{
    GameMatchInfo, MediaTitle, MediaType, SearchResult, Slug, TagFilter, TagInfo, TagOperator,
    TokenSignature,
};
