//! Vivero CLI - Catalog seeding and inventory management tools.
//!
//! Operates on the local JSON store file (`VIVERO_STORE_FILE`), which the
//! app can use as its offline development backend.
//!
//! # Usage
//!
//! ```bash
//! # Seed a demo plant catalog
//! vivero-cli seed
//!
//! # Inspect and manage inventory
//! vivero-cli product list
//! vivero-cli product add --name "Monstera Deliciosa" --price 24.99 --stock 7
//! vivero-cli product update doc-0001 --stock 3
//! vivero-cli product delete doc-0001
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
// This is a terminal tool; stdout is its interface.
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vivero_storefront::backend::JsonFileStore;
use vivero_storefront::{ProductCatalog, StoreConfig};

mod commands;

#[derive(Parser)]
#[command(name = "vivero-cli")]
#[command(author, version, about = "Vivero CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the local store with a demo plant catalog
    Seed {
        /// Replace existing products instead of refusing to run
        #[arg(long)]
        force: bool,
    },
    /// Manage the product catalog
    Product {
        #[command(subcommand)]
        action: commands::product::ProductAction,
    },
}

#[tokio::main]
async fn main() -> vivero_storefront::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = StoreConfig::from_env()?;
    let store = JsonFileStore::open(&config.store_file)?;
    let catalog = ProductCatalog::new(
        std::sync::Arc::new(store),
        config.products_collection.clone(),
    );

    match cli.command {
        Commands::Seed { force } => commands::seed::run(&catalog, force).await,
        Commands::Product { action } => commands::product::run(&catalog, action).await,
    }
}
