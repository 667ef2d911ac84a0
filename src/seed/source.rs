//! Shape of the source dataset: a saved response of the public catalog
//! listing, `{"data": {"data": [item, ...]}}`.

use serde::Deserialize;

use crate::catalog_api::whole_price;

#[derive(Debug, Clone, Deserialize)]
pub struct SeedDataset {
    pub data: DatasetPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetPage {
    pub data: Vec<SourceItem>,
}

/// One listing entry, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceItem {
    Product(SourceProduct),
    Bundle(SourceBundle),
    #[serde(other)]
    Other,
}

impl SourceItem {
    pub fn category(&self) -> Option<&SourceCategory> {
        match self {
            Self::Product(p) => p.category.as_ref(),
            Self::Bundle(b) => b.category.as_ref(),
            Self::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceCategory {
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceImage {
    pub image_url: String,
}

/// Collects `image_url`s; an absent list is empty.
pub(crate) fn image_urls(images: Option<&Vec<SourceImage>>) -> Vec<String> {
    images
        .map(|list| list.iter().map(|img| img.image_url.clone()).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceProduct {
    pub product_id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "whole_price")]
    pub price: i64,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub images: Option<Vec<SourceImage>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_best_seller: Option<bool>,
    #[serde(default)]
    pub category: Option<SourceCategory>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceBundle {
    pub bundle_id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "whole_price")]
    pub price: i64,
    #[serde(default)]
    pub images: Option<Vec<SourceImage>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_best_seller: Option<bool>,
    #[serde(default)]
    pub category: Option<SourceCategory>,
    #[serde(default)]
    pub bundle_items: Option<Vec<SourceBundleGroup>>,
}

impl SourceBundle {
    /// Every product reference across all groups, in dataset order.
    pub fn entries(&self) -> impl Iterator<Item = &SourceBundleEntry> {
        self.bundle_items
            .iter()
            .flatten()
            .flat_map(|group| group.items.iter().flatten())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceBundleGroup {
    #[serde(default)]
    pub items: Option<Vec<SourceBundleEntry>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceBundleEntry {
    #[serde(default)]
    pub variant_name: Option<String>,
    pub product: SourceNestedProduct,
}

/// A product as embedded in a bundle; thinner than a standalone listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceNestedProduct {
    pub product_id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "whole_price")]
    pub price: i64,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub product_images: Option<Vec<SourceImage>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_best_seller: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn items_are_discriminated_by_type() {
        let page: DatasetPage = serde_json::from_value(json!({"data": [
            {"type": "product", "product_id": 1, "name": "Madu", "price": 10},
            {"type": "bundle", "bundle_id": 5, "name": "Paket", "price": 30,
             "bundle_items": [{"items": [{"variant_name": "Original",
                "product": {"product_id": 1, "name": "Madu", "price": 10}}]}]},
            {"type": "voucher", "code": "X"}
        ]}))
        .unwrap();

        assert!(matches!(page.data[0], SourceItem::Product(ref p) if p.product_id == 1));
        let SourceItem::Bundle(ref bundle) = page.data[1] else { panic!("expected bundle") };
        assert_eq!(bundle.entries().count(), 1);
        assert_eq!(page.data[2], SourceItem::Other);
    }

    #[test]
    fn bundle_without_groups_has_no_entries() {
        let bundle: SourceBundle =
            serde_json::from_value(json!({"bundle_id": 2, "name": "Empty", "bundle_items": [{}]})).unwrap();
        assert_eq!(bundle.entries().count(), 0);
    }
}
