//! End-to-end resolver scenarios against an in-memory fake corpus.

use async_trait::async_trait;
use lunchbox_core::resolver::{
    resolve, CorpusAccessor, MediaTitle, MediaType, Resolution, ResolverConfig, ResolverError,
    SearchResult, Slug, TagFilter, TagInfo, TagOperator,
};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct FakeEntry {
    media: MediaTitle,
    file_path: String,
}

struct FakeCorpusAccessor {
    system_id: String,
    entries: Vec<FakeEntry>,
}

impl FakeCorpusAccessor {
    fn new(system_id: &str, entries: Vec<FakeEntry>) -> Self {
        FakeCorpusAccessor { system_id: system_id.to_string(), entries }
    }

    fn matches_filters(media: &MediaTitle, filters: &[TagFilter]) -> bool {
        let and_ok = filters
            .iter()
            .filter(|f| f.operator == TagOperator::And)
            .all(|f| media.has_tag(&f.tag_type, &f.value));
        let not_ok = filters
            .iter()
            .filter(|f| f.operator == TagOperator::Not)
            .all(|f| !media.has_tag(&f.tag_type, &f.value));
        let or_filters: Vec<&TagFilter> = filters.iter().filter(|f| f.operator == TagOperator::Or).collect();
        let or_ok = or_filters.is_empty() || or_filters.iter().any(|f| media.has_tag(&f.tag_type, &f.value));
        and_ok && not_ok && or_ok
    }

    fn to_results(&self, filters: &[TagFilter], pred: impl Fn(&MediaTitle) -> bool) -> Vec<SearchResult> {
        self.entries
            .iter()
            .filter(|e| pred(&e.media))
            .filter(|e| Self::matches_filters(&e.media, filters))
            .map(|e| SearchResult {
                media: e.media.clone(),
                file_path: e.file_path.clone(),
                system_id: self.system_id.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl CorpusAccessor for FakeCorpusAccessor {
    async fn search_media_by_slug_exact(
        &self,
        _system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        _cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError> {
        Ok(self.to_results(tag_filters, |m| m.slug.as_str() == slug.as_str()))
    }

    async fn search_media_by_slug_prefix(
        &self,
        _system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        _cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError> {
        Ok(self.to_results(tag_filters, |m| m.slug.as_str().starts_with(slug.as_str())))
    }

    async fn search_media_by_secondary_slug(
        &self,
        _system_id: &str,
        slug: &Slug,
        tag_filters: &[TagFilter],
        _cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError> {
        Ok(self.to_results(tag_filters, |m| m.secondary_slug.as_str() == slug.as_str()))
    }

    async fn search_media_by_slug_in(
        &self,
        _system_id: &str,
        slugs: &[Slug],
        tag_filters: &[TagFilter],
        _cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ResolverError> {
        Ok(self.to_results(tag_filters, |m| slugs.iter().any(|s| s.as_str() == m.slug.as_str())))
    }

    async fn get_titles_with_pre_filter(
        &self,
        _system_id: &str,
        min_slug_length: usize,
        max_slug_length: usize,
        min_word_count: usize,
        max_word_count: usize,
        _cancel: &CancellationToken,
    ) -> Result<Vec<MediaTitle>, ResolverError> {
        Ok(self
            .entries
            .iter()
            .map(|e| e.media.clone())
            .filter(|m| {
                (min_slug_length..=max_slug_length).contains(&m.slug_length)
                    && (min_word_count..=max_word_count).contains(&m.slug_word_count)
            })
            .collect())
    }
}

fn media(id: &str, name: &str, slug: &str, secondary_slug: &str, word_count: usize, tags: Vec<(&str, &str)>) -> MediaTitle {
    MediaTitle {
        id: id.to_string(),
        name: name.to_string(),
        slug: Slug::new(slug),
        secondary_slug: Slug::new(secondary_slug),
        slug_length: slug.len(),
        slug_word_count: word_count,
        tags: tags.into_iter().map(|(t, v)| TagInfo::new(t, v)).collect(),
    }
}

fn entry(media: MediaTitle, file_path: &str) -> FakeEntry {
    FakeEntry { media, file_path: file_path.to_string() }
}

#[tokio::test]
async fn scenario_1_exact_match() {
    let corpus = FakeCorpusAccessor::new(
        "snes",
        vec![entry(
            media("1", "Super Mario World", "supermarioworld", "", 3, vec![]),
            "Super Mario World.zip",
        )],
    );
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let resolution = resolve("snes", "Super Mario World", &[], MediaType::Game, &config, &corpus, &cancel)
        .await
        .unwrap();

    match resolution {
        Resolution::Match { confidence, strategy_id, .. } => {
            assert_eq!(strategy_id, "strategy_exact_match");
            assert_eq!(confidence, 1.0);
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_2_jarowinkler_damerau_typo() {
    let corpus = FakeCorpusAccessor::new(
        "snes",
        vec![entry(
            media("1", "Chrono Trigger", "chronotrigger", "", 2, vec![]),
            "Chrono Trigger.zip",
        )],
    );
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let resolution = resolve("snes", "crono tigger", &[], MediaType::Game, &config, &corpus, &cancel)
        .await
        .unwrap();

    match resolution {
        Resolution::Match { confidence, strategy_id, .. } => {
            assert_eq!(strategy_id, "strategy_jarowinkler_damerau");
            assert!((0.85..0.95).contains(&confidence), "confidence was {confidence}");
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_3_token_signature_reordered_words() {
    let corpus = FakeCorpusAccessor::new(
        "snes",
        vec![entry(
            media("1", "Super Mario World", "supermarioworld", "", 3, vec![]),
            "Super Mario World.zip",
        )],
    );
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let resolution = resolve("snes", "Mario World Super", &[], MediaType::Game, &config, &corpus, &cancel)
        .await
        .unwrap();

    match resolution {
        Resolution::Match { confidence, strategy_id, .. } => {
            assert_eq!(strategy_id, "strategy_token_signature");
            assert!(confidence >= 0.95, "confidence was {confidence}");
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_4_secondary_title_exact() {
    let corpus = FakeCorpusAccessor::new(
        "n64",
        vec![entry(
            media("1", "Ocarina of Time", "ocarinaoftime", "", 3, vec![]),
            "Ocarina of Time.zip",
        )],
    );
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let resolution = resolve(
        "n64",
        "The Legend of Zelda: Ocarina of Time",
        &[],
        MediaType::Game,
        &config,
        &corpus,
        &cancel,
    )
    .await
    .unwrap();

    match resolution {
        Resolution::Match { confidence, strategy_id, .. } => {
            assert_eq!(strategy_id, "strategy_secondary_title_exact");
            assert!(confidence >= 0.90, "confidence was {confidence}");
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

// Scenario 5 in spec.md's concrete-scenario table names
// `"Super Mario World Special Edition"` as a case resolved via
// `strategy_progressive_trim`, but spec §4.A step 3 has `slugify` itself
// strip recognised edition suffixes (including "special edition") while
// building the canonical slug. That strips the query down to
// `supermarioworld` before any strategy runs, so `strategy_exact_match`
// matches the corpus entry directly and the orchestrator returns at
// `ConfidenceHigh` before progressive trim is ever attempted. The scenario's
// own example title can't reach the strategy the table names (see
// DESIGN.md). This test asserts the actual, algorithmically-mandated
// outcome for that title.
#[tokio::test]
async fn scenario_5_edition_suffix_short_circuits_to_exact_match() {
    let corpus = FakeCorpusAccessor::new(
        "snes",
        vec![entry(
            media("1", "Super Mario World", "supermarioworld", "", 3, vec![]),
            "Super Mario World.zip",
        )],
    );
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let resolution = resolve(
        "snes",
        "Super Mario World Special Edition",
        &[],
        MediaType::Game,
        &config,
        &corpus,
        &cancel,
    )
    .await
    .unwrap();

    match resolution {
        Resolution::Match { confidence, strategy_id, .. } => {
            assert_eq!(strategy_id, "strategy_exact_match");
            assert_eq!(confidence, 1.0);
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

// Exercises `strategy_progressive_trim` itself, using trailing words that
// aren't in the edition-suffix list so `slugify` doesn't collapse the query
// to an exact match first — the case scenario 5 was presumably meant to
// cover.
#[tokio::test]
async fn scenario_5_progressive_trim_recovers_untrimmed_trailing_words() {
    let corpus = FakeCorpusAccessor::new(
        "snes",
        vec![entry(
            media("1", "Super Mario World", "supermarioworld", "", 3, vec![]),
            "Super Mario World.zip",
        )],
    );
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let resolution = resolve(
        "snes",
        "Super Mario World Plus Extra",
        &[],
        MediaType::Game,
        &config,
        &corpus,
        &cancel,
    )
    .await
    .unwrap();

    match resolution {
        Resolution::Match { confidence, strategy_id, .. } => {
            assert_eq!(strategy_id, "strategy_progressive_trim");
            assert!(confidence >= 0.60, "confidence was {confidence}");
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

// Scenario 6 in spec.md's concrete-scenario table reads "singleton rule:
// variants allowed in singletons" with an expected confidence of ">0", but
// the algorithmic text for the same rule (§4.F step 1) and the universal
// "Variant singleton rule" property (§8.1) both state that a singleton
// variant candidate is rejected with confidence 0 unless the user's tag
// filters explicitly request a variant. The two are irreconcilable for the
// scenario as given (no user tags); this implementation follows the
// twice-stated algorithmic rule (see DESIGN.md).
#[tokio::test]
async fn scenario_6_singleton_variant_without_request_is_rejected() {
    let corpus = FakeCorpusAccessor::new(
        "snes",
        vec![entry(
            media("1", "Zelda", "zelda", "", 1, vec![("unlicensed", "translation")]),
            "Zelda (T-Eng).zip",
        )],
    );
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let resolution =
        resolve("snes", "Zelda", &[], MediaType::Game, &config, &corpus, &cancel).await.unwrap();

    assert_eq!(resolution, Resolution::NoMatch);
}

#[tokio::test]
async fn scenario_6_singleton_variant_with_explicit_request_is_allowed() {
    let corpus = FakeCorpusAccessor::new(
        "snes",
        vec![entry(
            media("1", "Zelda", "zelda", "", 1, vec![("unlicensed", "translation")]),
            "Zelda (T-Eng).zip",
        )],
    );
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let user_tags = vec![TagFilter::new("unlicensed", "translation", TagOperator::And)];
    let resolution = resolve("snes", "Zelda", &user_tags, MediaType::Game, &config, &corpus, &cancel)
        .await
        .unwrap();

    match resolution {
        Resolution::Match { confidence, .. } => assert!(confidence > 0.0),
        other => panic!("expected a match, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_7_region_preference() {
    let corpus = FakeCorpusAccessor::new(
        "snes",
        vec![
            entry(media("usa", "Game (USA)", "game", "", 1, vec![("region", "us")]), "Game (USA).zip"),
            entry(media("jpn", "Game (Japan)", "game", "", 1, vec![("region", "jp")]), "Game (Japan).zip"),
        ],
    );
    let config = ResolverConfig { preferred_regions: vec!["us".to_string()], ..Default::default() };
    let cancel = CancellationToken::new();
    let resolution =
        resolve("snes", "Game (USA)", &[], MediaType::Game, &config, &corpus, &cancel).await.unwrap();

    match resolution {
        Resolution::Match { result, confidence, .. } => {
            assert_eq!(result.media.id, "usa");
            assert!(confidence >= 0.70, "confidence was {confidence}");
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[tokio::test]
async fn no_match_on_empty_corpus() {
    let corpus = FakeCorpusAccessor::new("snes", vec![]);
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    let resolution =
        resolve("snes", "Totally Unknown Game", &[], MediaType::Game, &config, &corpus, &cancel)
            .await
            .unwrap();

    assert_eq!(resolution, Resolution::NoMatch);
}

#[tokio::test]
async fn cancellation_is_observed_before_starting() {
    let corpus = FakeCorpusAccessor::new("snes", vec![]);
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = resolve("snes", "Anything", &[], MediaType::Game, &config, &corpus, &cancel).await;
    assert!(matches!(result, Err(ResolverError::Cancelled)));
}
