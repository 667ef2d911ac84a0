//! Storefront backend
//!
//! Catalog, bundles, cart, checkout and support tickets for a small shop.
//!
//! ## Layout
//! - [`api`]: axum routes for the storefront and the admin editor
//! - [`store`]: the relational backend seam (Postgres, in-memory)
//! - [`catalog_api`]: client for the third-party product catalog
//! - [`seed`]: one-shot ETL from a saved catalog listing
//! - [`domain`]: aggregates and value objects shared by all of the above

pub mod api;
pub mod catalog_api;
pub mod config;
pub mod domain;
pub mod images;
pub mod seed;
pub mod store;

pub use api::{build_app, ApiError, AppState};
pub use catalog_api::{CatalogApiClient, CatalogApiError};
pub use config::{load_app_config, AppConfig, ConfigError};
pub use seed::{run_seed, SeedError, SeedReport};
pub use store::{MemoryStore, PgStore, StoreError};
