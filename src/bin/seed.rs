//! Replaces the catalog tables with the contents of a saved catalog listing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use storefront_api::seed::{load_dataset, run_seed};
use storefront_api::store::PoolConfig;
use storefront_api::{load_app_config, AppConfig, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "seed")]
#[command(about = "Seed categories, products and bundles from a catalog dump")]
struct Cli {
    /// Dataset file; falls back to the configured SEED_DATA_PATH.
    #[arg(long, env = "SEED_DATA_PATH")]
    data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = load_app_config();
    let level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(env_filter).with(tracing_subscriber::fmt::layer()).init();

    let result = match config {
        Ok(config) => seed(cli, config).await,
        Err(e) => Err(e.into()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Seeding failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn seed(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let path = cli.data.unwrap_or_else(|| config.seed_data_path.clone());
    tracing::info!(path = %path.display(), "Starting database seeding...");
    let items = load_dataset(&path)?;

    let store = PgStore::connect(&config.database_url, PoolConfig::from_app_config(&config)).await?;
    store.run_migrations().await?;

    let report = run_seed(&store, &items).await?;
    tracing::info!(
        categories = report.categories,
        products = report.products,
        bundles = report.bundles,
        links = report.links,
        "Database seeding completed successfully!"
    );
    Ok(())
}
