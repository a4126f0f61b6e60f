//! mpbio engine, the orchestrator for every pipeline stage.
//!
//! [`BioEngine`] owns the configuration, the data sources and the resolution
//! cache. Each stage is exposed on its own (`resolve`, `aggregate`,
//! `plan_topic`, `search_records`) and [`BioEngine::generate`] chains them
//! into a full biography run with cancellation checkpoints.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, Utc};
use uuid::Uuid;

use mpbio_utils::HttpClient;

use crate::cancel::{CancellationToken, Checkpoint};
use crate::citations::{narrative_body, reconcile};
use crate::config::GlobalConfig;
use crate::draft::BiographyDraft;
use crate::errors::BioError;
use crate::evidence::{EvidenceAggregator, EvidenceBundle};
use crate::narrative::{Exemplar, NarrativeBuilder};
use crate::query_expansion::TopicSearchPlanner;
use crate::resolver::{EntityResolver, Resolution, ResolutionCache};
use crate::search::{RecordSearchEngine, SearchReport};
use crate::sources::{
    AnthropicClient, ArchiveSource, EncyclopediaSource, HansardArchive, MembersApi, PositionSource,
    RosterSource, TextGenerator, Wikipedia,
};
use crate::types::{DateWindow, ResolvedIdentity, SearchQueryPlan};

/// Sub-directory of the config dir where drafts are saved by default.
pub const DRAFTS_DIR_NAME: &str = "drafts";

// ============================================================================
// Sources
// ============================================================================

/// The external collaborators an engine talks to.
pub struct Sources {
    pub roster: Box<dyn RosterSource>,
    pub positions: Box<dyn PositionSource>,
    pub encyclopedia: Box<dyn EncyclopediaSource>,
    pub archive: Box<dyn ArchiveSource>,
    pub generator: Box<dyn TextGenerator>,
}

impl Sources {
    /// HTTP adapters for the public APIs named in `config`.
    pub fn http(config: &GlobalConfig) -> anyhow::Result<Self> {
        let http = HttpClient::new(config.http_settings()).context("Failed to build HTTP client")?;
        let members = MembersApi::new(http.clone(), config.roster.clone());
        let generator = AnthropicClient::new(&http, config.generator.clone())
            .context("Failed to build generator client")?;

        Ok(Self {
            roster: Box::new(members.clone()),
            positions: Box::new(members),
            encyclopedia: Box::new(Wikipedia::new(http.clone(), config.encyclopedia.clone())),
            archive: Box::new(HansardArchive::new(http, config.archive.clone())),
            generator: Box::new(generator),
        })
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Input of a full biography run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BiographyRequest {
    /// Free-text name query.
    pub query: String,
    /// Roster id picked from an earlier suggestions list.
    pub member_id: Option<u32>,
    /// Caller-supplied notes added to the evidence.
    pub supplied: Option<String>,
    /// Topic to search the legislative record for.
    pub topic: Option<String>,
    pub window: Option<DateWindow>,
    /// Overrides `search.result_cap`.
    pub result_cap: Option<usize>,
}

// ============================================================================
// BioEngine
// ============================================================================

/// The main engine for mpbio operations.
///
/// # Example
///
/// ```ignore
/// use mpbio_core::{BioEngine, BiographyRequest, CancellationToken};
///
/// let engine = BioEngine::with_defaults()?;
/// let request = BiographyRequest {
///     query: "Keir Starmer".into(),
///     topic: Some("housing".into()),
///     ..Default::default()
/// };
/// let draft = engine.generate(&request, &CancellationToken::new())?;
/// engine.save_draft(&draft, None, &CancellationToken::new())?;
/// ```
pub struct BioEngine {
    config: GlobalConfig,
    sources: Sources,
    cache: ResolutionCache,
    exemplars: Vec<Exemplar>,
}

impl BioEngine {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new(config: GlobalConfig, sources: Sources) -> Self {
        Self {
            config,
            sources,
            cache: ResolutionCache::new(),
            exemplars: Vec::new(),
        }
    }

    /// Create an engine backed by the public HTTP APIs.
    pub fn from_config(config: GlobalConfig) -> anyhow::Result<Self> {
        let sources = Sources::http(&config)?;
        Ok(Self::new(config, sources))
    }

    /// Load `~/.mpbio/config.yaml` (or defaults) and build the HTTP engine.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let config = GlobalConfig::load_default()?;
        Self::from_config(config)
    }

    /// Build the HTTP engine from a specific config file.
    pub fn with_config(path: &Path) -> anyhow::Result<Self> {
        let config = GlobalConfig::from_path(path)?;
        Self::from_config(config)
    }

    /// Style exemplars included in narrative prompts.
    pub fn with_exemplars(mut self, exemplars: Vec<Exemplar>) -> Self {
        self.exemplars = exemplars;
        self
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Drop every cached resolution.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// `~/.mpbio/drafts`, if a home directory exists.
    pub fn default_drafts_dir() -> Option<PathBuf> {
        GlobalConfig::default_dir().map(|d| d.join(DRAFTS_DIR_NAME))
    }

    // -------------------------------------------------------------------------
    // Stages
    // -------------------------------------------------------------------------

    fn resolver(&self) -> EntityResolver<'_> {
        EntityResolver::new(
            self.sources.roster.as_ref(),
            &self.cache,
            &self.config.resolver,
            self.config.roster.search_limit,
        )
    }

    pub fn resolve(&self, query: &str) -> Resolution {
        self.resolver().resolve(query)
    }

    /// Resolve a caller's pick from an earlier suggestions list.
    pub fn resolve_choice(&self, query: &str, member_id: u32) -> Result<ResolvedIdentity, BioError> {
        self.resolver().resolve_choice(query, member_id)
    }

    pub fn aggregate(&self, identity: &ResolvedIdentity, supplied: Option<&str>) -> EvidenceBundle {
        EvidenceAggregator::new(
            self.sources.positions.as_ref(),
            self.sources.encyclopedia.as_ref(),
            &self.config.evidence,
        )
        .aggregate(identity, supplied)
    }

    pub fn plan_topic(&self, topic: &str, member_name: &str) -> SearchQueryPlan {
        TopicSearchPlanner::new(
            self.sources.generator.as_ref(),
            self.config.generator.planner_max_tokens,
        )
        .plan(topic, member_name)
    }

    /// Search the archive. `cap` defaults to `search.result_cap`.
    pub fn search_records(
        &self,
        identity: &ResolvedIdentity,
        plan: &SearchQueryPlan,
        window: Option<DateWindow>,
        cap: Option<usize>,
    ) -> SearchReport {
        RecordSearchEngine::new(
            self.sources.archive.as_ref(),
            &self.config.archive.web_url,
            &self.config.search,
        )
        .search(
            identity.id(),
            plan,
            window,
            cap.unwrap_or(self.config.search.result_cap),
        )
    }

    // -------------------------------------------------------------------------
    // Full pipeline
    // -------------------------------------------------------------------------

    /// Run resolution, aggregation, the optional topic search, generation and
    /// citation reconciliation.
    ///
    /// # Errors
    ///
    /// - [`BioError::Ambiguous`] / [`BioError::NotFound`] when the query does
    ///   not resolve to exactly one member
    /// - [`BioError::Cancelled`] when `token` fires at a checkpoint
    /// - [`BioError::Generation`] when the generator fails
    pub fn generate(
        &self,
        request: &BiographyRequest,
        token: &CancellationToken,
    ) -> Result<BiographyDraft, BioError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("generate", run_id = %run_id);
        let _guard = span.enter();

        let identity = match request.member_id {
            Some(id) => self.resolve_choice(&request.query, id)?,
            None => self.resolve(&request.query).into_identity(&request.query)?,
        };
        tracing::info!(member = identity.name(), id = identity.id(), "Member resolved");
        token.checkpoint(Checkpoint::ResolutionDone)?;

        let bundle = self.aggregate(&identity, request.supplied.as_deref());
        token.checkpoint(Checkpoint::AggregationDone)?;

        let topic = request.topic.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let (plan, report) = match topic {
            Some(topic) => {
                let plan = self.plan_topic(topic, identity.name());
                let report = self.search_records(&identity, &plan, request.window, request.result_cap);
                if let Some(err) = report.partial_error() {
                    tracing::warn!(error = %err, "Continuing with partial search results");
                }
                (Some(plan), Some(report))
            }
            None => (None, None),
        };
        token.checkpoint(Checkpoint::SearchDone)?;

        let activity = report.as_ref().map(SearchReport::evidence);
        let today = Local::now().date_naive();
        let narrative = NarrativeBuilder::new(&self.config.generator, &self.exemplars, today)
            .build(&bundle, activity.as_deref());
        token.checkpoint(Checkpoint::BeforeGeneration)?;

        tracing::info!(items = narrative.items.len(), "Generating narrative");
        let generated = self
            .sources
            .generator
            .generate(&narrative.request)
            .map_err(|e| BioError::Generation(e.to_string()))?;

        let citations = reconcile(&generated, &narrative.items);
        let draft = BiographyDraft {
            run_id,
            generated_at: Utc::now(),
            model: self.config.generator.model.clone(),
            member: identity,
            plan,
            narrative: narrative_body(&generated),
            generated_text: generated,
            citations,
            evidence: narrative.items,
            sources: bundle.sources,
            failed_phrases: report
                .map(|r| r.failed_phrases().map(|p| p.phrase.clone()).collect())
                .unwrap_or_default(),
        };

        tracing::info!(
            citations = draft.citations.len(),
            unresolved = draft.unresolved_citations(),
            "Biography generated"
        );
        Ok(draft)
    }

    /// Save `draft` to `dir`, or to [`Self::default_drafts_dir`].
    pub fn save_draft(
        &self,
        draft: &BiographyDraft,
        dir: Option<&Path>,
        token: &CancellationToken,
    ) -> Result<PathBuf, BioError> {
        token.checkpoint(Checkpoint::BeforeSave)?;
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::default_drafts_dir().ok_or_else(|| {
                BioError::InvalidArgument(
                    "Could not determine home directory; pass an output directory".to_string(),
                )
            })?,
        };
        draft.save(&dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use crate::sources::fake::{
        date, hit, member, page, position, FakeArchive, FakeEncyclopedia, FakeGenerator,
        FakePositions, FakeRoster,
    };
    use crate::sources::PositionKind;
    use crate::types::SourceType;
    use tempfile::TempDir;

    const LONG: &str = "I have long argued that this House must build more social homes.";

    const NARRATIVE: &str = "Jane Doe\n(Labour, Anytown)\n\n\
        Jane Doe sits on the Treasury Committee [REF-1].\n\n\
        Sources\n\
        - Members profile [REF-1]\n\
        - Speech on social housing. [REF-3]\n";

    fn sources(generator: FakeGenerator) -> Sources {
        let mut encyclopedia = FakeEncyclopedia::default();
        encyclopedia.add(page("Jane Doe", "Jane Doe is the Labour MP for Anytown.", &[]));

        let mut archive = FakeArchive::default();
        archive.hits.insert(
            "social housing".into(),
            Ok(vec![hit("H1", date(2025, 3, 4), LONG)]),
        );
        archive.paths.insert("H1".into(), "/debates/H1".into());

        Sources {
            roster: Box::new(FakeRoster::with(vec![
                member(42, "Jane Doe", "Labour", "Anytown"),
                member(7, "John Smith", "Conservative", "Elsewhere"),
            ])),
            positions: Box::new(FakePositions {
                positions: Ok(vec![position("Treasury Committee", PositionKind::Committee, None)]),
                ..Default::default()
            }),
            encyclopedia: Box::new(encyclopedia),
            archive: Box::new(archive),
            generator: Box::new(generator),
        }
    }

    fn engine(generator: FakeGenerator) -> BioEngine {
        BioEngine::new(GlobalConfig::default(), sources(generator))
    }

    fn request(topic: Option<&str>) -> BiographyRequest {
        BiographyRequest {
            query: "Jane Doe".into(),
            topic: topic.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_pipeline() {
        let generator = FakeGenerator::answering(vec![
            Ok("social housing\nhousebuilding".into()),
            Ok(NARRATIVE.into()),
        ]);
        let engine = engine(generator);
        let draft = engine
            .generate(&request(Some("housing")), &CancellationToken::new())
            .unwrap();

        assert_eq!(draft.member.id(), 42);
        assert_eq!(
            draft.plan.as_ref().unwrap().expanded_terms,
            vec!["social housing", "housebuilding"]
        );

        let kinds: Vec<SourceType> = draft.evidence.iter().map(|e| e.source_type).collect();
        assert_eq!(
            kinds,
            vec![
                SourceType::Committee,
                SourceType::Encyclopedia,
                SourceType::LegislativeRecord
            ]
        );

        assert_eq!(draft.citations.len(), 2);
        assert_eq!(
            draft.citations[0].resolved_url.as_deref(),
            Some("https://members.example/42")
        );
        assert_eq!(draft.citations[1].source_ordinal, Some(3));
        assert_eq!(
            draft.citations[1].resolved_url.as_deref(),
            Some("https://hansard.parliament.uk/debates/H1")
        );
        assert_eq!(
            draft.narrative,
            "Jane Doe\n(Labour, Anytown)\n\nJane Doe sits on the Treasury Committee."
        );
        assert!(draft.failed_phrases.is_empty());
    }

    #[test]
    fn test_pipeline_without_topic_skips_search() {
        let engine = engine(FakeGenerator::text("Jane Doe\n\nSources\n- Profile [REF-1]\n"));
        let draft = engine.generate(&request(None), &CancellationToken::new()).unwrap();

        assert!(draft.plan.is_none());
        assert_eq!(draft.evidence.len(), 2);
        assert_eq!(draft.citations[0].source_ordinal, Some(1));
    }

    #[test]
    fn test_ambiguous_query_halts_before_aggregation() {
        let mut sources = sources(FakeGenerator::text("unused"));
        sources.roster = Box::new(FakeRoster::with(vec![
            member(1, "Jane Doe", "Labour", "Anytown"),
            member(2, "Jane Doe-Smith", "Green", "Elsewhere"),
        ]));
        let engine = BioEngine::new(GlobalConfig::default(), sources);

        let err = engine
            .generate(&request(None), &CancellationToken::new())
            .unwrap_err();
        match err {
            BioError::Ambiguous { suggestions, .. } => assert_eq!(suggestions.len(), 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }

        let draft = engine
            .generate(
                &BiographyRequest {
                    member_id: Some(2),
                    ..request(None)
                },
                &CancellationToken::new(),
            )
            .map(|d| d.member.id());
        assert_eq!(draft.unwrap(), 2);
    }

    #[test]
    fn test_cancellation_stops_at_first_checkpoint() {
        let engine = engine(FakeGenerator::text("unused"));
        let token = CancellationToken::new();
        token.cancel();

        let err = engine.generate(&request(Some("housing")), &token).unwrap_err();
        assert!(matches!(err, BioError::Cancelled(Checkpoint::ResolutionDone)));
    }

    #[test]
    fn test_generation_failure() {
        let engine = engine(FakeGenerator::answering(vec![Err(SourceError::Unavailable(
            "HTTP 529".into(),
        ))]));
        let err = engine.generate(&request(None), &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, BioError::Generation(ref m) if m.contains("529")));
    }

    #[test]
    fn test_save_draft_respects_cancellation() {
        let engine = engine(FakeGenerator::text("Jane Doe\n"));
        let draft = engine.generate(&request(None), &CancellationToken::new()).unwrap();
        let temp = TempDir::new().unwrap();

        let path = engine
            .save_draft(&draft, Some(temp.path()), &CancellationToken::new())
            .unwrap();
        assert!(path.exists());

        let token = CancellationToken::new();
        token.cancel();
        assert!(engine.save_draft(&draft, Some(temp.path()), &token).is_err());
    }

    #[test]
    fn test_resolution_is_cached_until_cleared() {
        let engine = engine(FakeGenerator::text("unused"));
        assert!(matches!(engine.resolve("Jane Doe"), Resolution::Confirmed(_)));
        assert!(matches!(engine.resolve("jane  doe"), Resolution::Confirmed(_)));
        assert_eq!(engine.cache.len(), 1);
        engine.clear_cache();
        assert!(engine.cache.is_empty());
    }
}
