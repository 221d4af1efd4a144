//! message-ingress - HTTP server hosting the `addMessage` callable function
//!
//! Builds the document store named by the configuration, injects it into the
//! handler and serves the callable protocol plus health probes.

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use message_ingress::{
    router, AppState, DocumentStore, InMemoryStore, MessageIngressHandler, ServiceConfig,
    StoreConfig,
};

#[derive(Parser)]
#[command(name = "message-ingress")]
#[command(version, about = "Serve the addMessage callable function", long_about = None)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("message-ingress failed: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => ServiceConfig::load_from_file(path)?,
        None => ServiceConfig::default(),
    };
    let mut config = config.apply_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let store = build_store(&config.store).await?;
    tracing::info!("Using {} document store", store.backend());

    let handler = MessageIngressHandler::new(store, config.collection.clone())
        .with_validation(config.validation);
    let state = Arc::new(AppState {
        handler,
        cors_permissive: config.cors_permissive,
    });

    let app = router(state);

    let addr = config.socket_addr();
    tracing::info!("addMessage listening on {}", addr);
    tracing::info!(
        "Appending to collection '{}' ({:?} validation)",
        config.collection,
        config.validation
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, Box<dyn Error>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(InMemoryStore::new())),
        #[cfg(feature = "postgres")]
        StoreConfig::Postgres(pg) => {
            let pg = pg.clone();
            let store = tokio::task::spawn_blocking(move || {
                message_ingress::PostgresStore::connect(&pg)
            })
            .await??;
            Ok(Arc::new(store))
        }
    }
}
