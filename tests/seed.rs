//! Seed runs against the in-memory store.

use serde_json::json;
use storefront_api::seed::{parse_dataset, run_seed, SeedError, SourceItem};
use storefront_api::store::{MemoryStore, TableCounts};

fn dataset() -> Vec<SourceItem> {
    let raw = json!({"data": {"data": [
        {"type": "product", "product_id": 101, "name": "Madu Hutan", "slug": "madu-hutan", "price": 85000.0,
         "stock": 12, "is_best_seller": true,
         "images": [{"image_url": "https://cdn.example.com/madu.jpg"}],
         "category": {"category_id": 1, "name": "Madu", "slug": "madu"}},
        {"type": "product", "product_id": 102, "name": "Propolis", "slug": "propolis", "price": 65000,
         "category": {"category_id": 1, "name": "Madu", "slug": "madu"}},
        {"type": "product", "product_id": 103, "name": "Teh Daun", "slug": "teh-daun", "price": 25000,
         "category": {"category_id": 2, "name": "Teh", "slug": "teh"}},
        {"type": "bundle", "bundle_id": 900, "name": "Paket Sehat", "slug": "paket-sehat", "price": 140000,
         "category": {"category_id": 2, "name": "Teh", "slug": "teh"},
         "bundle_items": [
            {"items": [{"variant_name": "Original",
                        "product": {"product_id": 101, "name": "Madu (nested)", "price": 80000}}]},
            {"items": [{"variant_name": null,
                        "product": {"product_id": 103, "name": "Teh Daun", "price": 25000}}]}
         ]}
    ]}});
    parse_dataset(&raw.to_string()).expect("dataset parses")
}

#[tokio::test]
async fn full_run_counts_match_the_dataset() {
    let store = MemoryStore::new();
    let report = run_seed(&store, &dataset()).await.expect("seed succeeds");

    assert_eq!(report.categories, 2);
    assert_eq!(report.products, 3);
    assert_eq!(report.bundles, 1);
    assert_eq!(report.links, 2);
    assert_eq!(
        store.counts(),
        TableCounts { categories: 2, products: 3, bundles: 1, links: 2, ..TableCounts::default() }
    );
}

#[tokio::test]
async fn links_point_at_newly_assigned_ids() {
    let store = MemoryStore::new();
    run_seed(&store, &dataset()).await.expect("seed succeeds");

    let links = store.links();
    assert!(links.iter().all(|l| l.bundle_id != 900));
    assert!(links.iter().all(|l| l.product_id < 100));
    assert_eq!(links[0].variant_name.as_deref(), Some("Original"));
    assert_eq!(links[1].variant_name, None);
}

#[tokio::test]
async fn rerun_replaces_previous_catalog() {
    let store = MemoryStore::new();
    run_seed(&store, &dataset()).await.expect("first run");
    run_seed(&store, &dataset()).await.expect("second run");

    assert_eq!(store.counts().products, 3);
    assert_eq!(store.counts().links, 2);
}

#[tokio::test]
async fn failing_stage_halts_the_run_without_rollback() {
    let store = MemoryStore::new();
    store.fail_on("insert_bundles");

    let err = run_seed(&store, &dataset()).await.expect_err("bundle stage fails");

    assert!(matches!(err, SeedError::Bundles(_)));
    assert!(err.to_string().starts_with("Bundle seeding failed"));
    let counts = store.counts();
    assert_eq!(counts.categories, 2);
    assert_eq!(counts.products, 3);
    assert_eq!(counts.bundles, 0);
    assert_eq!(counts.links, 0);
}

#[tokio::test]
async fn clear_failure_stops_before_any_insert() {
    let store = MemoryStore::new();
    store.fail_on("clear_catalog");

    let err = run_seed(&store, &dataset()).await.expect_err("clear fails");
    assert!(matches!(err, SeedError::Clear(_)));
    assert_eq!(store.counts(), TableCounts::default());
}

#[test]
fn unparsable_dataset_is_a_parse_error() {
    assert!(matches!(parse_dataset("{\"data\": []}"), Err(SeedError::Parse(_))));
}
