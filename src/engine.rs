//! Request entry point: classify the utterance, then search or chat.

use crate::assistant::{
    CannedResponder, ChatResponder, DEFAULT_GREETING, HttpChatResponder, HttpIntentClassifier,
    IntentClassifier, PassthroughClassifier,
};
use crate::catalog::{CatalogAccessor, CatalogStore};
use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::search::lexicon::scent_groups;
use crate::search::{
    AssemblyOptions, DetailFilter, ScoringQuery, SearchContext, assemble, no_match, run_pipeline,
};
use crate::types::{SearchIntent, SearchResponse};
use anyhow::Context;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Instrument;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Where a classified request goes next.
#[derive(Debug, Clone, PartialEq)]
enum Route {
    Searching(SearchIntent),
    Chatting,
}

impl From<SearchIntent> for Route {
    fn from(intent: SearchIntent) -> Self {
        if intent.is_search {
            Self::Searching(intent)
        } else {
            Self::Chatting
        }
    }
}

/// The search engine. Holds no per-request state and can serve requests concurrently.
#[derive(Clone)]
pub struct SearchEngine {
    catalog: CatalogAccessor,
    classifier: Arc<dyn IntentClassifier>,
    responder: Arc<dyn ChatResponder>,
    options: AssemblyOptions,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("catalog", &self.catalog)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SearchEngine {
    pub fn new(
        catalog: CatalogAccessor,
        classifier: Arc<dyn IntentClassifier>,
        responder: Arc<dyn ChatResponder>,
        options: AssemblyOptions,
    ) -> Self {
        Self {
            catalog,
            classifier,
            responder,
            options,
        }
    }

    /// Wires an engine from configuration over the given catalog store.
    ///
    /// Without a classifier URL every utterance is searched as-is; without a chat URL the
    /// engine answers small talk with a canned greeting.
    pub fn from_config(config: &Config, store: Arc<dyn CatalogStore>) -> Result<Self> {
        let catalog = CatalogAccessor::new(store, config.catalog_timeout(), config.search.fan_out);

        let classifier: Arc<dyn IntentClassifier> = match &config.assistant.classifier_url {
            Some(url) => Arc::new(
                HttpIntentClassifier::new(url, config.assistant_timeout())
                    .context("Failed to build intent classifier client")?,
            ),
            None => {
                tracing::info!("No classifier configured, searching utterances verbatim");
                Arc::new(PassthroughClassifier)
            }
        };
        let responder: Arc<dyn ChatResponder> = match &config.assistant.chat_url {
            Some(url) => Arc::new(
                HttpChatResponder::new(url, config.assistant_timeout())
                    .context("Failed to build chat responder client")?,
            ),
            None => Arc::new(CannedResponder::default()),
        };

        Ok(Self::new(
            catalog,
            classifier,
            responder,
            config.assembly_options(),
        ))
    }

    /// Handles one customer utterance, producing exactly one response.
    pub async fn search(&self, utterance: &str) -> std::result::Result<SearchResponse, SearchError> {
        let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let span = tracing::info_span!("search", request_id);
        async {
            tracing::info!("Classifying utterance ({} chars)", utterance.chars().count());
            let intent = self
                .classifier
                .classify(utterance)
                .await
                .map_err(SearchError::Classifier)
                .inspect_err(|e| tracing::error!("{}", e))?;

            let response = match Route::from(intent) {
                Route::Searching(intent) => self.run_search(&intent).await?,
                Route::Chatting => {
                    let text = self.responder.respond(utterance).await.unwrap_or_else(|e| {
                        tracing::warn!("Chat responder failed, using the default greeting: {}", e);
                        DEFAULT_GREETING.to_string()
                    });
                    SearchResponse::Chat { text }
                }
            };
            tracing::info!(kind = response.kind(), "Responding");
            Ok::<_, SearchError>(response)
        }
        .instrument(span)
        .await
    }

    /// Runs the filter pipeline and assembles the response for an already-classified intent.
    pub async fn run_search(
        &self,
        intent: &SearchIntent,
    ) -> std::result::Result<SearchResponse, SearchError> {
        tracing::debug!(query = %intent.query, filters = ?intent.filters, "Searching");
        let ctx = SearchContext::new(&self.catalog);
        let products = ctx.products().await?;

        let query = ScoringQuery::new(&intent.query, scent_groups());
        let (ranked, report) =
            run_pipeline(&ctx, products.clone(), &query, &intent.filters).await;
        tracing::debug!(?report, survivors = ranked.len(), "Filter pipeline finished");

        if ranked.is_empty() {
            return Ok(no_match(products, &intent.query, &intent.filters, &self.options));
        }

        let detail_filter = DetailFilter::new(&intent.filters, scent_groups());
        Ok(assemble(&ctx, &ranked, &intent.filters, &detail_filter, &self.options).await)
    }
}
