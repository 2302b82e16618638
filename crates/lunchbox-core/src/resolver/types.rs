//! Core value types shared across the resolver (spec §3).

use std::fmt;
use std::ops::Deref;

/// A canonical slug: `[a-z0-9]` plus internal `_` only where tokens are
/// joined by the progressive-trim generator. The unit of equality for every
/// lexical strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Self {
        Slug(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for Slug {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Slug {
    fn from(value: String) -> Self {
        Slug(value)
    }
}

impl From<&str> for Slug {
    fn from(value: &str) -> Self {
        Slug(value.to_string())
    }
}

/// The alphabetically-sorted, underscore-joined token signature of a title.
/// Order-independent by construction (§4.C).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TokenSignature(String);

impl TokenSignature {
    pub fn new(value: impl Into<String>) -> Self {
        TokenSignature(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for TokenSignature {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which parsing profile the slugifier should use: leading-article list,
/// stopword list, and edition-suffix list all vary by media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaType {
    #[default]
    Game,
    Movie,
    Application,
    Unknown,
}

/// A tag attached to a corpus entry: `unfinished:beta`, `region:us`,
/// `rerelease:true`, etc. Free-form `tag_type`/`value` — not the fixed
/// `TagCategory` enum used by [`crate::tags`] for bracket-annotation display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub tag_type: String,
    pub value: String,
}

impl TagInfo {
    pub fn new(tag_type: impl Into<String>, value: impl Into<String>) -> Self {
        TagInfo {
            tag_type: tag_type.into(),
            value: value.into(),
        }
    }

    fn normalized_type(&self) -> String {
        self.tag_type.to_ascii_lowercase()
    }

    fn normalized_value(&self) -> String {
        self.value.to_ascii_lowercase()
    }

    /// True if `self` has the given type and the given value is a prefix of
    /// `self`'s value (case-insensitive). Used for variant-value matching
    /// like `beta2` / `proto1` / `demo-kiosk` (§4.F.3).
    pub fn type_and_prefix_match(&self, tag_type: &str, value_prefix: &str) -> bool {
        self.normalized_type() == tag_type.to_ascii_lowercase()
            && self.normalized_value().starts_with(&value_prefix.to_ascii_lowercase())
    }

    pub fn type_and_value_match(&self, tag_type: &str, value: &str) -> bool {
        self.normalized_type() == tag_type.to_ascii_lowercase()
            && self.normalized_value() == value.to_ascii_lowercase()
    }
}

/// Operator attached to a [`TagFilter`] (§3.1, §4.F.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagOperator {
    #[default]
    And,
    Or,
    Not,
}

/// A single tag constraint supplied either by the user or extracted from the
/// canonical `(operator? type:value)` syntax inside a query title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub tag_type: String,
    pub value: String,
    pub operator: TagOperator,
}

impl TagFilter {
    pub fn new(tag_type: impl Into<String>, value: impl Into<String>, operator: TagOperator) -> Self {
        TagFilter {
            tag_type: tag_type.into(),
            value: value.into(),
            operator,
        }
    }

    pub fn matches(&self, tag: &TagInfo) -> bool {
        tag.type_and_value_match(&self.tag_type, &self.value)
    }
}

/// A media entry as supplied by the corpus (spec §3.1). Slug, secondary
/// slug, length, and word count are precomputed by an out-of-scope indexing
/// pipeline; the resolver only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTitle {
    pub id: String,
    pub name: String,
    pub slug: Slug,
    /// Empty slug when the title has no secondary title.
    pub secondary_slug: Slug,
    pub slug_length: usize,
    pub slug_word_count: usize,
    pub tags: Vec<TagInfo>,
}

impl MediaTitle {
    pub fn has_secondary_slug(&self) -> bool {
        !self.secondary_slug.is_empty()
    }

    pub fn has_tag(&self, tag_type: &str, value: &str) -> bool {
        self.tags.iter().any(|t| t.type_and_value_match(tag_type, value))
    }

    pub fn has_tag_prefix(&self, tag_type: &str, value_prefix: &str) -> bool {
        self.tags.iter().any(|t| t.type_and_prefix_match(tag_type, value_prefix))
    }
}

/// A [`MediaTitle`]-shaped record with filesystem path and system id — what
/// strategies and the candidate selector actually operate on (spec §3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub media: MediaTitle,
    pub file_path: String,
    pub system_id: String,
}

impl SearchResult {
    pub fn file_name(&self) -> &str {
        self.file_path.rsplit(['/', '\\']).next().unwrap_or(&self.file_path)
    }

    pub fn path_depth(&self) -> usize {
        self.file_path.chars().filter(|&c| c == '/' || c == '\\').count()
    }
}

/// Derived, per-query record consumed by every strategy (spec §3.1, component D).
///
/// Invariants: if `has_secondary_title` is false then `main_title_slug ==
/// canonical_slug` and `secondary_title_slug` is empty; if true then
/// `canonical_slug`'s character length equals the sum of the two parts'
/// lengths (concatenation, no delimiter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMatchInfo {
    pub original_input: String,
    pub canonical_slug: Slug,
    pub main_title_slug: Slug,
    pub secondary_title_slug: Slug,
    pub has_secondary_title: bool,
    pub has_leading_article: bool,
    /// Token count behind `canonical_slug` (main title tokens plus secondary
    /// title tokens), comparable to [`MediaTitle::slug_word_count`] for the
    /// fuzzy strategies' pre-filter bounds.
    pub slug_word_count: usize,
}
