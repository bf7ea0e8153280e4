//! MCP server exposing the product search tool over stdio.

use crate::engine::SearchEngine;
use crate::tools::search::{SearchProductsRequest, handle_search};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP Server for conversational product search
#[derive(Clone)]
pub struct SearchServer {
    engine: Arc<SearchEngine>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchServer")
            .field("engine", &self.engine)
            .finish()
    }
}

#[tool_router]
impl SearchServer {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            tool_router: Self::tool_router(),
        }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    #[tool(
        description = "Answer a storefront customer's message. Product requests are matched against the catalog (with category, price, size, scent and rating filters understood from the message) and return up to three enriched products with prices, ratings and links, or similar suggestions when nothing matches. Other messages get a conversational reply. Returns the response as JSON with a `kind` of `search`, `no_match` or `chat`.",
        input_schema = inline_schema_for_type::<SearchProductsRequest>()
    )]
    async fn search_products(
        &self,
        Parameters(request): Parameters<SearchProductsRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.engine, request).await
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "storefront-search: conversational product search for the storefront assistant. \
                 Pass the customer's message to search_products unchanged; the server classifies \
                 it, searches the catalog and renders a Vietnamese reply with product links."
                    .to_string(),
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// to generate inline definitions instead of $ref patterns.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(object)) => Arc::new(object),
        Ok(_) | Err(_) => {
            tracing::error!("Schema serialization produced a non-object value");
            Arc::new(JsonObject::new())
        }
    }
}
