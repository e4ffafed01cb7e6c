//! hometrack-catalog - Catalog and price tracking service
//!
//! HTTP service over the catalog database: companies, communities,
//! membership, plan ingestion with price history, and the unified
//! community view.

use anyhow::Result;
use clap::Parser;
use hometrack_catalog::services::enrichment::EnrichmentClient;
use hometrack_catalog::{build_router, AppState};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "hometrack-catalog", about = "HomeTrack catalog service")]
struct Args {
    /// Root folder holding the catalog database (overrides env/config)
    #[arg(long)]
    root_folder: Option<String>,

    /// Port to listen on
    #[arg(long, default_value_t = 5750)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!(
        "Starting HomeTrack catalog service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let root_folder = hometrack_common::config::resolve_root_folder(args.root_folder.as_deref());
    hometrack_common::config::ensure_root_folder(&root_folder)?;

    let db_path = hometrack_common::config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = hometrack_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    let enrichment = match hometrack_common::config::resolve_openai_api_key() {
        Some(key) => match EnrichmentClient::new(key) {
            Ok(client) => {
                info!("Enrichment client configured");
                Some(client)
            }
            Err(e) => {
                warn!("Failed to create enrichment client: {e}");
                None
            }
        },
        None => {
            warn!("No text-generation API key configured; /api/companies/ai is disabled");
            None
        }
    };

    let state = AppState::new(pool, enrichment);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("hometrack-catalog listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
