//! services/showroom/src/bin/showroom.rs

use std::sync::Arc;

use clap::Parser;
use showroom_core::ports::ImageSearchService;
use showroom_core::{StaticCatalog, SystemClock};
use showroom_lib::{
    adapters::{DbAdapter, DisabledImageSearch, UnsplashAdapter},
    app::{Showroom, ShowroomDeps},
    cli::{self, Cli},
    config::Config,
    error::AppError,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded.");

    // --- 2. Connect to Database & Run Migrations ---
    let db = Arc::new(DbAdapter::connect(&config.database_url, 5).await?);
    db.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let image_search: Arc<dyn ImageSearchService> = match &config.unsplash_access_key {
        Some(key) => Arc::new(UnsplashAdapter::new(
            config.unsplash_api_url.clone(),
            key.clone(),
        )?),
        None => {
            warn!("UNSPLASH_ACCESS_KEY is not set; only cached images are available");
            Arc::new(DisabledImageSearch)
        }
    };

    // --- 4. Build the Showroom ---
    let showroom = Showroom::init(ShowroomDeps {
        kv: db.clone(),
        image_search,
        catalog: Arc::new(StaticCatalog::default()),
        clock: Arc::new(SystemClock),
        options: config.store_options(),
    })
    .await;

    // --- 5. Run the Command ---
    let result = cli::run(&showroom, args.command).await;
    showroom.shutdown().await;
    db.close().await;

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
