//! Product search: text matching, synonym resolution, filtering, ranking and response assembly.
//!
//! Everything here except [`context`], [`filters`] and [`assemble`] is pure computation over
//! already-fetched data.

// Module declarations
pub mod assemble;
pub mod context;
pub mod distance;
pub mod filters;
pub mod lexicon;
pub mod scoring;
pub mod synonyms;
pub mod tokenize;

// Public re-exports (used via lib.rs)
pub use assemble::{AssemblyOptions, assemble, no_match};
pub use context::SearchContext;
pub use filters::{DetailFilter, PipelineReport, StageOutcome, run_pipeline};
pub use scoring::{ScoringQuery, rank, rank_matches, score};
pub use synonyms::{SynonymGroup, resolve};
pub use tokenize::{normalize, simplify_query, tokenize};
