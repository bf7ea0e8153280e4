use anyhow::Context;
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use std::path::Path;
use std::sync::Arc;
use storefront_search::cli::{Cli, Commands};
use storefront_search::{
    CatalogStore, Config, HttpCatalogStore, MemoryCatalog, SearchEngine, SearchServer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_search::tracing::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { catalog } => {
            let engine = build_engine(&config, catalog.as_deref()).await?;
            tracing::info!("Starting storefront-search MCP server");

            let service = SearchServer::new(engine)
                .serve(stdio())
                .await
                .inspect_err(|e| {
                    tracing::error!("Error serving MCP server: {:?}", e);
                })?;
            service.waiting().await?;
        }
        Commands::Query {
            utterance,
            json,
            catalog,
        } => {
            let engine = build_engine(&config, catalog.as_deref()).await?;
            match engine.search(&utterance).await {
                Ok(response) if json => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                }
                Ok(response) => println!("{}", response.text()),
                Err(e) => {
                    tracing::error!("Search failed: {}", e);
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

async fn build_engine(config: &Config, snapshot: Option<&Path>) -> anyhow::Result<SearchEngine> {
    let store: Arc<dyn CatalogStore> = match snapshot {
        Some(path) => Arc::new(MemoryCatalog::from_json_file(path).await?),
        None => Arc::new(
            HttpCatalogStore::new(&config.catalog.base_url, config.catalog_timeout())
                .context("Failed to build catalog client")?,
        ),
    };
    SearchEngine::from_config(config, store)
}
