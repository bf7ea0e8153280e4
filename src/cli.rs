use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "storefront-search")]
#[command(about = "Conversational product search for the storefront assistant", long_about = None)]
pub struct Cli {
    /// Config file (defaults to $STOREFRONT_SEARCH_CONFIG, then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the search_products tool over MCP stdio
    Serve {
        /// Use a JSON catalog snapshot instead of the remote catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Run a single search and print the reply
    Query {
        utterance: String,
        /// Print the full JSON payload instead of the reply text
        #[arg(long)]
        json: bool,
        /// Use a JSON catalog snapshot instead of the remote catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}
