//! Pure transformations of the seed run: category collection, product
//! de-duplication, bundle records and bundle-product links.
//!
//! Nothing here touches the backend; the orchestrator feeds the ID maps built
//! from each stage's inserted rows into the next stage.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::domain::aggregates::{CatalogRow, CategoryRow};

use super::source::{image_urls, SourceBundle, SourceItem, SourceNestedProduct, SourceProduct};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub slug: Option<String>,
    pub original_id: i64,
}

/// The single de-duplicated representation of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalProduct {
    pub original_id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    pub stock: Option<i32>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_best_seller: bool,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBundle {
    pub original_id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_best_seller: bool,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBundleLink {
    pub bundle_id: i64,
    pub product_id: i64,
    pub variant_name: Option<String>,
}

/// Source identifier -> identifier assigned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap(HashMap<i64, i64>);

impl IdMap {
    /// Rows without an `original_id` cannot be mapped and are skipped.
    pub fn from_categories(rows: &[CategoryRow]) -> Self {
        Self(rows.iter().filter_map(|r| r.original_id.map(|orig| (orig, r.id))).collect())
    }

    pub fn from_catalog_rows(rows: &[CatalogRow]) -> Self {
        Self(rows.iter().filter_map(|r| r.original_id.map(|orig| (orig, r.id))).collect())
    }

    pub fn get(&self, original_id: i64) -> Option<i64> {
        self.0.get(&original_id).copied()
    }
}

/// Distinct categories in first-seen order.
pub fn collect_categories(items: &[SourceItem]) -> Vec<NewCategory> {
    let mut seen: IndexMap<i64, NewCategory> = IndexMap::new();
    for category in items.iter().filter_map(SourceItem::category) {
        seen.entry(category.category_id).or_insert_with(|| NewCategory {
            name: category.name.clone(),
            slug: category.slug.clone(),
            original_id: category.category_id,
        });
    }
    seen.into_values().collect()
}

fn from_nested(p: &SourceNestedProduct) -> CanonicalProduct {
    CanonicalProduct {
        original_id: p.product_id,
        name: p.name.clone(),
        slug: p.slug.clone(),
        description: Some(p.description.clone().unwrap_or_default()),
        price: p.price,
        stock: p.stock,
        images: image_urls(p.product_images.as_ref()),
        is_active: p.is_active.unwrap_or(true),
        is_best_seller: p.is_best_seller.unwrap_or(false),
        category_id: None,
    }
}

fn from_standalone(p: &SourceProduct, categories: &IdMap) -> CanonicalProduct {
    CanonicalProduct {
        original_id: p.product_id,
        name: p.name.clone(),
        slug: p.slug.clone(),
        description: p.description.clone(),
        price: p.price,
        stock: p.stock,
        images: image_urls(p.images.as_ref()),
        is_active: p.is_active.unwrap_or(true),
        is_best_seller: p.is_best_seller.unwrap_or(false),
        category_id: p.category.as_ref().and_then(|c| categories.get(c.category_id)),
    }
}

/// Merges nested and standalone occurrences into one record per source id.
///
/// Nested products are recorded first; standalone products then overwrite
/// them. A key keeps the position of its first insertion.
pub fn dedupe_products(items: &[SourceItem], categories: &IdMap) -> Vec<CanonicalProduct> {
    let mut unique: IndexMap<i64, CanonicalProduct> = IndexMap::new();

    for bundle in bundles(items) {
        for entry in bundle.entries() {
            unique.insert(entry.product.product_id, from_nested(&entry.product));
        }
    }

    for item in items {
        if let SourceItem::Product(product) = item {
            unique.insert(product.product_id, from_standalone(product, categories));
        }
    }

    unique.into_values().collect()
}

pub fn bundle_records(items: &[SourceItem], categories: &IdMap) -> Vec<CanonicalBundle> {
    bundles(items)
        .map(|b| CanonicalBundle {
            original_id: b.bundle_id,
            name: b.name.clone(),
            slug: b.slug.clone(),
            description: b.description.clone(),
            price: b.price,
            images: image_urls(b.images.as_ref()),
            is_active: b.is_active.unwrap_or(true),
            is_best_seller: b.is_best_seller.unwrap_or(false),
            category_id: b.category.as_ref().and_then(|c| categories.get(c.category_id)),
        })
        .collect()
}

/// Links for every nested reference whose bundle and product both resolved.
/// Unresolved references are dropped without error.
pub fn bundle_links(items: &[SourceItem], bundle_ids: &IdMap, product_ids: &IdMap) -> Vec<NewBundleLink> {
    let mut links = Vec::new();
    for bundle in bundles(items) {
        let Some(bundle_id) = bundle_ids.get(bundle.bundle_id) else {
            continue;
        };
        for entry in bundle.entries() {
            if let Some(product_id) = product_ids.get(entry.product.product_id) {
                links.push(NewBundleLink {
                    bundle_id,
                    product_id,
                    variant_name: entry.variant_name.clone(),
                });
            }
        }
    }
    links
}

fn bundles(items: &[SourceItem]) -> impl Iterator<Item = &SourceBundle> {
    items.iter().filter_map(|item| match item {
        SourceItem::Bundle(b) => Some(b),
        _ => None,
    })
}
