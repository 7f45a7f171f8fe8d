use anyhow::Result;
use std::sync::Arc;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use services::analytics::{ColumnAnalyzer, PreviewColumnAnalyzer};
use services::ingest::Ingestor;
use services::progress::{Clock, TokioClock};
use services::store::PreviewReader;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;

    // Build our application state
    let state = Arc::new(AppState::new(config, Arc::new(TokioClock)));
    let addr = state.config.bind_addr;

    let app = routes::router(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
pub struct AppState {
    config: config::Config,
    ingestor: Arc<Ingestor>,
    reader: PreviewReader,
    analyzer: Arc<dyn ColumnAnalyzer>,
}

impl AppState {
    fn new(config: config::Config, clock: Arc<dyn Clock>) -> Self {
        let ingestor = Arc::new(Ingestor::new(&config, clock));
        let reader = ingestor.reader();
        Self {
            config,
            ingestor,
            reader,
            analyzer: Arc::new(PreviewColumnAnalyzer),
        }
    }
}
