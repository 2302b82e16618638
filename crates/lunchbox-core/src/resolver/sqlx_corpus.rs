//! [`CorpusAccessor`] backed by the games database (spec §6.1).
//!
//! Assumes the games database carries the resolver-specific columns the
//! spec treats as out of scope to compute here (`games.slug`,
//! `games.secondary_slug`, `games.slug_length`, `games.slug_word_count`,
//! populated by an out-of-band indexing pass) plus a `game_tags` table
//! (`game_id`, `tag_type`, `value`) denormalising [`TagInfo`]. Tag-filter
//! semantics are applied client-side after hydration rather than pushed
//! into SQL — the AND/NOT/OR combination doesn't map cleanly onto a single
//! predicate over a denormalised tag table (see DESIGN.md).

use sqlx::sqlite::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::accessor::CorpusAccessor;
use super::error::ResolverError;
use super::selector::passes_filter_set;
use super::types::{MediaTitle, SearchResult, Slug, TagFilter, TagInfo};

/// Queries the shared games database directly. Read-only: never issues an
/// `INSERT`/`UPDATE`/`DELETE`.
pub struct SqlxCorpusAccessor {
    pool: SqlitePool,
}

impl SqlxCorpusAccessor {
    pub fn new(pool: SqlitePool) -> Self {
        SqlxCorpusAccessor { pool }
    }

    async fn tags_for(&self, game_ids: &[String]) -> Result<Vec<(String, String, String)>, sqlx::Error> {
        if game_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = std::iter::repeat("?").take(game_ids.len()).collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT game_id, tag_type, value FROM game_tags WHERE game_id IN ({placeholders})"
        );
        let mut query = sqlx::query_as(&sql);
        for id in game_ids {
            query = query.bind(id);
        }
        query.fetch_all(&self.pool).await
    }

    /// Run `sql` (already scoped to `system_id` via a `platforms` join),
    /// hydrate tags, and apply `tag_filters` client-side.
    async fn rows_to_results(
        &self,
        rows: Vec<(String, String, String, String, String, i64)>,
        system_id: &str,
        tag_filters: &[TagFilter],
    ) -> Result<Vec<SearchResult>, ResolverError> {
        let game_ids: Vec<String> = rows.iter().map(|r| r.0.clone()).collect();
        let tag_rows = self.tags_for(&game_ids).await.map_err(ResolverError::accessor)?;

        let media_titles: Vec<SearchResult> = rows
            .into_iter()
            .map(|(game_id, title, slug, secondary_slug, file_path, slug_length)| {
                let tags = tag_rows
                    .iter()
                    .filter(|(id, _, _)| *id == game_id)
                    .map(|(_, tag_type, value)| TagInfo::new(tag_type.clone(), value.clone()))
                    .collect::<Vec<_>>();
                let slug_word_count = 0; // not separately tracked per-row; see get_titles_with_pre_filter
                let media = MediaTitle {
                    id: game_id,
                    name: title,
                    slug: Slug::new(slug),
                    secondary_slug: Slug::new(secondary_slug),
                    slug_length: slug_length.max(0) as usize,
                    slug_word_count,
                    tags,
                };
                SearchResult { media, file_path, system_id: system_id.to_string() }
            })
            .filter(|result| passes_filter_set(&result.media, tag_filters))
            .collect();

        Ok(media_titles)
    }
}

#[async_trait::async_trait]
impl CorpusAccessor for SqlxCorpusAccessor {
    async fn search_media_by_slug_exact(
        &self,
        system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError> {
        if cancel.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }
        let rows: Vec<(String, String, String, String, String, i64)> = sqlx::query_as(
            "SELECT g.id, g.title, g.slug, COALESCE(g.secondary_slug, ''), r.file_path, g.slug_length \
             FROM games g \
             JOIN platforms p ON g.platform_id = p.id \
             JOIN roms r ON r.game_id = g.id \
             WHERE p.name = ? AND g.slug = ?",
        )
        .bind(system_id)
        .bind(slug.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(ResolverError::accessor)?;

        self.rows_to_results(rows, system_id, tag_filters).await
    }

    async fn search_media_by_slug_prefix(
        &self,
        system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError> {
        if cancel.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }
        let pattern = format!("{}%", slug.as_str());
        let rows: Vec<(String, String, String, String, String, i64)> = sqlx::query_as(
            "SELECT g.id, g.title, g.slug, COALESCE(g.secondary_slug, ''), r.file_path, g.slug_length \
             FROM games g \
             JOIN platforms p ON g.platform_id = p.id \
             JOIN roms r ON r.game_id = g.id \
             WHERE p.name = ? AND g.slug LIKE ?",
        )
        .bind(system_id)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(ResolverError::accessor)?;

        self.rows_to_results(rows, system_id, tag_filters).await
    }

    async fn search_media_by_secondary_slug(
        &self,
        system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError> {
        if cancel.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }
        let rows: Vec<(String, String, String, String, String, i64)> = sqlx::query_as(
            "SELECT g.id, g.title, g.slug, COALESCE(g.secondary_slug, ''), r.file_path, g.slug_length \
             FROM games g \
             JOIN platforms p ON g.platform_id = p.id \
             JOIN roms r ON r.game_id = g.id \
             WHERE p.name = ? AND g.secondary_slug = ?",
        )
        .bind(system_id)
        .bind(slug.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(ResolverError::accessor)?;

        self.rows_to_results(rows, system_id, tag_filters).await
    }

    async fn search_media_by_slug_in(
        &self,
        system_id: &str,
        slugs: &[Slug],
        tag_filters: &[TagFilter],
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError> {
        if cancel.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = std::iter::repeat("?").take(slugs.len()).collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT g.id, g.title, g.slug, COALESCE(g.secondary_slug, ''), r.file_path, g.slug_length \
             FROM games g \
             JOIN platforms p ON g.platform_id = p.id \
             JOIN roms r ON r.game_id = g.id \
             WHERE p.name = ? AND g.slug IN ({placeholders})"
        );
        let mut query = sqlx::query_as(&sql).bind(system_id);
        for slug in slugs {
            query = query.bind(slug.as_str().to_string());
        }
        let rows: Vec<(String, String, String, String, String, i64)> =
            query.fetch_all(&self.pool).await.map_err(ResolverError::accessor)?;

        self.rows_to_results(rows, system_id, tag_filters).await
    }

    async fn get_titles_with_pre_filter(
        &self,
        system_id: &str,
        min_slug_length: usize,
        max_slug_length: usize,
        min_word_count: usize,
        max_word_count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<MediaTitle>, ResolverError> {
        if cancel.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }
        let rows: Vec<(String, String, String, String, i64, i64)> = sqlx::query_as(
            "SELECT g.id, g.title, g.slug, COALESCE(g.secondary_slug, ''), g.slug_length, g.slug_word_count \
             FROM games g \
             JOIN platforms p ON g.platform_id = p.id \
             WHERE p.name = ? AND g.slug_length BETWEEN ? AND ? AND g.slug_word_count BETWEEN ? AND ?",
        )
        .bind(system_id)
        .bind(min_slug_length as i64)
        .bind(max_slug_length as i64)
        .bind(min_word_count as i64)
        .bind(max_word_count as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(ResolverError::accessor)?;

        if rows.len() > 5000 {
            warn!(system_id, pool_size = rows.len(), "token-signature/fuzzy pre-filter pool is large");
        }

        Ok(rows
            .into_iter()
            .map(|(id, name, slug, secondary_slug, slug_length, slug_word_count)| MediaTitle {
                id,
                name,
                slug: Slug::new(slug),
                secondary_slug: Slug::new(secondary_slug),
                slug_length: slug_length.max(0) as usize,
                slug_word_count: slug_word_count.max(0) as usize,
                tags: Vec::new(),
            })
            .collect())
    }
}
