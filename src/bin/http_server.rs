//! HTTP Server Binary for the gadget store catalog
//!
//! Usage:
//!   cargo run --bin http_server -- --host 0.0.0.0 --port 8080 --data-file ./data_gadget.ttl

use clap::Parser;
use gadgetstore::{api::CatalogApi, http::start_server, storage::util::StoreConfig};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "Gadget Store HTTP Server")]
#[command(about = "HTTP API server for the gadget store triple catalog", long_about = None)]
struct Args {
    #[arg(short = 'H', long, env = "GADGETSTORE_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, env = "GADGETSTORE_PORT", default_value = "8080")]
    port: u16,

    #[arg(short, long, env = "GADGETSTORE_DATA_FILE", default_value = "data_gadget.ttl")]
    data_file: PathBuf,

    /// Skip the class and property declarations
    #[arg(long)]
    no_seed: bool,

    /// Only persist through explicit saves
    #[arg(long)]
    no_autosave: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = StoreConfig {
        data_file: args.data_file,
        seed_schema: !args.no_seed,
        autosave: !args.no_autosave,
    };
    info!(data_file = %config.data_file.display(), autosave = config.autosave, "Opening catalog");
    let catalog = CatalogApi::open(config)?;
    info!(statements = catalog.store().len(), "Catalog ready");
    let catalog = Arc::new(Mutex::new(catalog));

    let addr = format!("{}:{}", args.host, args.port);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        result = start_server(&addr, catalog) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal => {
            info!("Server shut down gracefully");
        }
    }

    Ok(())
}
