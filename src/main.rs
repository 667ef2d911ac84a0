//! Storefront API server

use std::sync::Arc;

use anyhow::Result;
use storefront_api::store::PoolConfig;
use storefront_api::{build_app, load_app_config, AppState, CatalogApiClient, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry().with(env_filter).with(tracing_subscriber::fmt::layer()).init();

    let store = PgStore::connect(&config.database_url, PoolConfig::from_app_config(&config)).await?;
    store.run_migrations().await?;
    let catalog = CatalogApiClient::new(&config.catalog_api_base_url, config.catalog_api_timeout_secs)?;

    let app = build_app(AppState { store: Arc::new(store), catalog });

    tracing::info!(addr = %config.bind_addr, "storefront API listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => { signal.recv().await; }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
