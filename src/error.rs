//! Error handling types and utilities.

use crate::assistant::AssistantError;
use crate::catalog::CatalogError;
use thiserror::Error;

/// A specialized Result type for storefront-search glue code.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Shown to the customer for every fatal error; details only go to the logs.
pub const GENERIC_ERROR_MESSAGE: &str =
    "Xin lỗi, hệ thống đang gặp sự cố. Bạn vui lòng thử lại sau ít phút nhé.";

/// A failure that aborts a search request.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("intent classification failed: {0}")]
    Classifier(#[source] AssistantError),
    #[error("product catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),
}

impl SearchError {
    /// The text the customer sees. Identical for every variant.
    pub const fn user_message(&self) -> &'static str {
        GENERIC_ERROR_MESSAGE
    }
}
