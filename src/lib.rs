//! Conversational product search for a storefront assistant.
//!
//! A customer message is classified into a [`SearchIntent`], matched against the catalog through
//! a fail-open [filter pipeline](search::filters), and assembled into a [`SearchResponse`] with
//! enriched products or a no-match fallback that always carries suggestions.

pub mod assistant;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod search;
pub mod server;
pub mod tools;
pub mod tracing;
pub mod types;

pub use catalog::{CatalogAccessor, CatalogStore, HttpCatalogStore, MemoryCatalog};
pub use config::Config;
pub use engine::SearchEngine;
pub use error::{Result, SearchError};
pub use server::SearchServer;
pub use types::{SearchFilters, SearchIntent, SearchResponse};
