mod common;

use assert2::{check, let_assert};
use common::{
    FaultyCatalog, ScriptedClassifier, UnreachableResponder, catalog, engine, engine_with,
    engine_with_responder,
};
use rstest::rstest;
use rust_decimal::Decimal;
use storefront_search::MemoryCatalog;
use storefront_search::assistant::DEFAULT_GREETING;
use storefront_search::SearchError;
use storefront_search::error::GENERIC_ERROR_MESSAGE;
use storefront_search::search::AssemblyOptions;
use storefront_search::tools::search::{SearchProductsRequest, handle_search};
use storefront_search::types::{SearchFilters, SearchIntent, SearchResponse};

// --- Fatal paths ---

#[rstest]
#[tokio::test]
async fn classifier_failure_is_fatal(catalog: MemoryCatalog) {
    let engine = engine_with(
        catalog,
        ScriptedClassifier::failing(),
        AssemblyOptions::default(),
    );

    let_assert!(Err(error) = engine.search("nến").await);
    check!(matches!(error, SearchError::Classifier(_)));
    check!(error.user_message() == GENERIC_ERROR_MESSAGE);
}

#[rstest]
#[tokio::test]
async fn product_listing_failure_is_fatal(catalog: MemoryCatalog) {
    let mut store = FaultyCatalog::new(catalog);
    store.fail_products = true;
    let engine = engine(store, SearchIntent::search("nến", SearchFilters::default()));

    let_assert!(Err(error) = engine.search("nến").await);
    check!(matches!(error, SearchError::CatalogUnavailable(_)));
}

// --- Degraded paths ---

/// Test: without the price listing the price filter is skipped but prices still render.
#[rstest]
#[tokio::test]
async fn price_listing_failure_disables_price_filter(catalog: MemoryCatalog) {
    let mut store = FaultyCatalog::new(catalog);
    store.fail_price_listing = true;
    let filters = SearchFilters {
        price_max: Some(100_000.0),
        ..SearchFilters::default()
    };
    let engine = engine(store, SearchIntent::search("nến", filters));

    let_assert!(Ok(SearchResponse::Search { products, .. }) = engine.search("nến rẻ").await);
    check!(products.iter().map(|p| p.id).collect::<Vec<_>>() == vec![1, 2]);
    check!(products[0].price.as_ref().map(|p| p.final_price) == Some(Decimal::from(80_000)));
}

/// Test: without live categories the keyword dictionary still resolves the category.
#[rstest]
#[tokio::test]
async fn category_listing_failure_falls_back_to_keywords(catalog: MemoryCatalog) {
    let mut store = FaultyCatalog::new(catalog);
    store.fail_categories = true;
    let filters = SearchFilters {
        category: Some("tinh dầu".into()),
        ..SearchFilters::default()
    };
    let engine = engine(store, SearchIntent::search("", filters));

    let_assert!(Ok(SearchResponse::Search { products, .. }) = engine.search("tinh dầu").await);
    check!(products.iter().map(|p| p.id).collect::<Vec<_>>() == vec![3, 4]);
    check!(products[0].category.is_none());
}

/// Test: a failing chat responder still yields a chat reply.
#[rstest]
#[tokio::test]
async fn chat_responder_failure_falls_back_to_greeting(catalog: MemoryCatalog) {
    let engine = engine_with_responder(
        catalog,
        ScriptedClassifier::returning(SearchIntent::chat()),
        UnreachableResponder,
        AssemblyOptions::default(),
    );

    let_assert!(Ok(SearchResponse::Chat { text }) = engine.search("shop ơi").await);
    check!(text == DEFAULT_GREETING);
}

/// Test: a chat classification with null fields routes to the responder.
#[rstest]
#[tokio::test]
async fn null_classifier_fields_route_to_chat(catalog: MemoryCatalog) {
    let intent: SearchIntent =
        serde_json::from_str(r#"{"isSearch": false, "query": null, "filters": null}"#).unwrap();
    let engine = engine(catalog, intent);

    let_assert!(Ok(SearchResponse::Chat { text }) = engine.search("cảm ơn shop").await);
    check!(text == common::CHAT_REPLY);
}

// --- Tool surface ---

#[rstest]
#[tokio::test]
async fn tool_returns_json_payload(catalog: MemoryCatalog) {
    let engine = engine(
        catalog,
        SearchIntent::search("nến oải hương", SearchFilters::default()),
    );
    let request = SearchProductsRequest {
        message: "nến oải hương".to_string(),
    };

    let_assert!(Ok(json) = handle_search(&engine, request).await);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    check!(value["kind"] == "search");
    check!(value["products"][0]["id"] == 1);
    check!(value["products"][0]["hasRating"] == true);
    check!(value["filtersApplied"]["category"].is_null());
}

#[rstest]
#[tokio::test]
async fn tool_hides_fatal_error_details(catalog: MemoryCatalog) {
    let engine = engine_with(
        catalog,
        ScriptedClassifier::failing(),
        AssemblyOptions::default(),
    );
    let request = SearchProductsRequest {
        message: "nến".to_string(),
    };

    let_assert!(Err(message) = handle_search(&engine, request).await);
    check!(message == GENERIC_ERROR_MESSAGE);
}
