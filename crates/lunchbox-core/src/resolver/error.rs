//! Resolver error kinds (spec §7).
//!
//! `NoMatch` and the low-confidence flag are *values*, not errors — they
//! live on [`crate::resolver::orchestrator::Resolution`]. This type only
//! models the two genuinely exceptional outcomes: an unrecoverable accessor
//! failure surfaced by the main-title-only strategy, and cancellation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("corpus accessor failed: {0}")]
    Accessor(#[source] anyhow::Error),

    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolverError {
    pub fn accessor(err: impl Into<anyhow::Error>) -> Self {
        ResolverError::Accessor(err.into())
    }
}
