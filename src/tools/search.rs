//! Product search tool handler.

use crate::engine::SearchEngine;
use crate::types::SearchResponse;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchProductsRequest {
    /// The customer's message, verbatim
    pub message: String,
}

/// Run one search and serialize the response payload as JSON.
///
/// Fatal engine errors are logged and surface only as the generic customer-facing message.
pub async fn handle_search(
    engine: &SearchEngine,
    request: SearchProductsRequest,
) -> Result<String, String> {
    let response = match engine.search(&request.message).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            return Err(e.user_message().to_string());
        }
    };
    render(&response)
}

fn render(response: &SearchResponse) -> Result<String, String> {
    serde_json::to_string_pretty(response).map_err(|e| {
        tracing::error!("Failed to serialize search response: {}", e);
        crate::error::GENERIC_ERROR_MESSAGE.to_string()
    })
}
