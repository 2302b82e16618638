//! The corpus accessor contract (spec §6.1) and resolver configuration
//! (spec §6.2) — the two inputs supplied by the host application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::error::ResolverError;
use super::types::{MediaTitle, SearchResult, Slug, TagFilter};

/// Read-only, re-entrant accessor over the indexed corpus. Implementations
/// must be side-effect free and honour `cancel`.
#[async_trait]
pub trait CorpusAccessor: Send + Sync {
    async fn search_media_by_slug_exact(
        &self,
        system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError>;

    async fn search_media_by_slug_prefix(
        &self,
        system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError>;

    async fn search_media_by_secondary_slug(
        &self,
        system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError>;

    async fn search_media_by_slug_in(
        &self,
        system_id: &str,
        slugs: &[Slug],
        tag_filters: &[TagFilter],
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError>;

    async fn get_titles_with_pre_filter(
        &self,
        system_id: &str,
        min_slug_length: usize,
        max_slug_length: usize,
        min_word_count: usize,
        max_word_count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<MediaTitle>, ResolverError>;
}

/// An emulator/launcher's ordered, case-insensitive file-extension priority
/// list (spec §4.F step 7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherExtensions {
    pub name: String,
    /// Ordered best-to-worst; extensions without a leading dot, e.g. `"zip"`.
    pub extensions: Vec<String>,
}

/// Configuration consumed at call time by the candidate selector (spec §6.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    #[serde(default)]
    pub preferred_regions: Vec<String>,
    #[serde(default)]
    pub preferred_languages: Vec<String>,
    #[serde(default)]
    pub launchers: Vec<LauncherExtensions>,
}

impl ResolverConfig {
    /// Best (smallest) priority index of `extension` across any configured
    /// launcher, or `None` if no launcher lists it.
    pub fn extension_priority(&self, extension: &str) -> Option<usize> {
        let ext_lower = extension.to_ascii_lowercase();
        self.launchers
            .iter()
            .filter_map(|launcher| {
                launcher
                    .extensions
                    .iter()
                    .position(|e| e.eq_ignore_ascii_case(&ext_lower))
            })
            .min()
    }
}
