//! One-shot catalog seeding from a saved catalog listing.
//!
//! Stages run strictly in order (clear, categories, products, bundles,
//! links) because each needs the ID map produced by the one before it. The
//! first failing stage aborts the run; earlier stages are not rolled back.

mod plan;
mod source;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::store::{SeedStore, StoreError};

pub use plan::{
    bundle_links, bundle_records, collect_categories, dedupe_products, CanonicalBundle,
    CanonicalProduct, IdMap, NewBundleLink, NewCategory,
};
pub use source::{
    DatasetPage, SeedDataset, SourceBundle, SourceBundleEntry, SourceBundleGroup, SourceCategory,
    SourceImage, SourceItem, SourceNestedProduct, SourceProduct,
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Clearing existing data failed: {0}")]
    Clear(#[source] StoreError),
    #[error("Category seeding failed: {0}")]
    Categories(#[source] StoreError),
    #[error("Product seeding failed: {0}")]
    Products(#[source] StoreError),
    #[error("Bundle seeding failed: {0}")]
    Bundles(#[source] StoreError),
    #[error("Bundle item linking failed: {0}")]
    Links(#[source] StoreError),
}

/// Row counts of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub products: usize,
    pub bundles: usize,
    pub links: usize,
}

/// Reads and parses the dataset file.
///
/// # Errors
///
/// [`SeedError::Read`] if the file cannot be read, [`SeedError::Parse`] if it
/// is not a valid dataset envelope.
pub fn load_dataset(path: &Path) -> Result<Vec<SourceItem>, SeedError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&raw)
}

/// # Errors
///
/// [`SeedError::Parse`] if `raw` is not a valid dataset envelope.
pub fn parse_dataset(raw: &str) -> Result<Vec<SourceItem>, SeedError> {
    let dataset: SeedDataset = serde_json::from_str(raw)?;
    Ok(dataset.data.data)
}

/// Runs every stage against `store`.
///
/// # Errors
///
/// Returns the first failing stage's [`SeedError`]; anything written by
/// earlier stages stays in place.
pub async fn run_seed(store: &dyn SeedStore, items: &[SourceItem]) -> Result<SeedReport, SeedError> {
    tracing::info!("Clearing existing data from tables...");
    store.clear_catalog().await.map_err(SeedError::Clear)?;

    tracing::info!("Seeding categories...");
    let categories = collect_categories(items);
    let inserted_categories = store
        .insert_categories(&categories)
        .await
        .map_err(SeedError::Categories)?;
    tracing::info!(count = inserted_categories.len(), "categories seeded");
    let category_ids = IdMap::from_categories(&inserted_categories);

    tracing::info!("Gathering and de-duplicating all products...");
    let products = dedupe_products(items, &category_ids);
    let inserted_products = store
        .insert_products(&products)
        .await
        .map_err(SeedError::Products)?;
    tracing::info!(count = inserted_products.len(), "unique products seeded");
    let product_ids = IdMap::from_catalog_rows(&inserted_products);

    tracing::info!("Seeding bundles...");
    let bundles = bundle_records(items, &category_ids);
    let inserted_bundles = store
        .insert_bundles(&bundles)
        .await
        .map_err(SeedError::Bundles)?;
    tracing::info!(count = inserted_bundles.len(), "bundles seeded");
    let bundle_ids = IdMap::from_catalog_rows(&inserted_bundles);

    tracing::info!("Linking products to bundles...");
    let links = bundle_links(items, &bundle_ids, &product_ids);
    store
        .insert_bundle_links(&links)
        .await
        .map_err(SeedError::Links)?;
    tracing::info!(count = links.len(), "bundle-product links created");

    Ok(SeedReport {
        categories: inserted_categories.len(),
        products: inserted_products.len(),
        bundles: inserted_bundles.len(),
        links: links.len(),
    })
}
