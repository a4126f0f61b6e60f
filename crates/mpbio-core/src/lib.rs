//! # mpbio-core
//!
//! **MP biography kernel**, the core library behind `mpbio`.
//!
//! Turns a free-text name query into a verified, multi-source evidence bundle
//! about a sitting Member of the House of Commons, hands it to a text
//! generator and reconciles the generated citations back to their sources.
//!
//! ## Main Types
//!
//! - [`BioEngine`]: entry point for every pipeline stage
//! - [`BiographyDraft`]: the result of a generation run
//! - [`BioError`]: domain-specific error type
//!
//! ## Modules
//!
//! - [`resolver`]: fuzzy entity resolution with a disambiguation policy
//! - [`evidence`]: verified, budget-packed evidence aggregation
//! - [`query_expansion`]: topic to search-phrase planning
//! - [`search`]: legislative record search
//! - [`narrative`]: generation request building
//! - [`notes`]: caller-supplied notes from text or PDF files
//! - [`citations`]: citation reconciliation
//! - [`sources`]: external data source traits and HTTP adapters
//! - [`config`]: configuration types
//!
//! ## Example
//!
//! ```ignore
//! use mpbio_core::{BioEngine, Resolution};
//!
//! let engine = BioEngine::with_defaults()?;
//! match engine.resolve("Keir Starmer") {
//!     Resolution::Confirmed(identity) => {
//!         let bundle = engine.aggregate(&identity, None);
//!         println!("{}", bundle.text);
//!     }
//!     Resolution::Suggestions(ranked) => println!("{} possible matches", ranked.len()),
//!     Resolution::NoMatch(message) => println!("{}", message),
//! }
//! ```

// Modules
pub mod cancel;
pub mod citations;
pub mod config;
pub mod draft;
pub mod engine;
pub mod errors;
pub mod evidence;
pub mod narrative;
pub mod notes;
pub mod query_expansion;
pub mod resolver;
pub mod search;
pub mod sources;
pub mod types;

// Re-exports for convenience
pub use cancel::{CancellationToken, Checkpoint};
pub use citations::{narrative_body, reconcile};
pub use config::{GlobalConfig, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use draft::BiographyDraft;
pub use engine::{BioEngine, BiographyRequest, Sources};
pub use errors::{BioError, SourceError};
pub use evidence::{EvidenceAggregator, EvidenceBundle, SourceOutcome, SourceStatus};
pub use narrative::{load_exemplars, Exemplar, NarrativeBuilder, NarrativeRequest};
pub use notes::read_notes;
pub use query_expansion::TopicSearchPlanner;
pub use resolver::{similarity, EntityResolver, Resolution, ResolutionCache, ResolutionStatus};
pub use search::{PhraseOutcome, RecordSearchEngine, SearchReport};
pub use types::{
    Chamber, ContributionRecord, DateWindow, EntityCandidate, Evidence, EvidenceItem,
    ReconciledBullet, ResolvedIdentity, ScoredCandidate, SearchQueryPlan, SourceType,
    PRIMARY_CHAMBER,
};
