//! Wire types of the third-party catalog API.
//!
//! The upstream is loose about which fields it sends, so every field defaults
//! when absent. `type` is passed through as sent; only the detail route needs
//! it to be a known [`ItemKind`](crate::domain::value_objects::ItemKind).

use serde::{Deserialize, Deserializer, Serialize};

/// Prices arrive as JSON numbers that are sometimes written with a fraction.
pub(crate) fn whole_price<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or_default();
    #[allow(clippy::cast_possible_truncation)]
    Ok(raw.round() as i64)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantProduct {
    pub name: String,
    #[serde(default, deserialize_with = "whole_price")]
    pub price: i64,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub product_images: Vec<ImageRef>,
}

/// One selectable product inside a bundle group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleVariant {
    pub product_id: i64,
    #[serde(default)]
    pub variant_name: Option<String>,
    pub product: VariantProduct,
}

/// A slot of a bundle; the shopper picks one of `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleGroup {
    pub bundle_item_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<BundleVariant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

fn product_kind() -> String {
    "product".to_string()
}

/// Product or bundle as served by the upstream catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductBundle {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "whole_price")]
    pub price: i64,
    #[serde(default)]
    pub is_best_seller: bool,
    #[serde(rename = "type", default = "product_kind")]
    pub kind: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_images: Option<Vec<ImageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_images: Option<Vec<ImageRef>>,
    #[serde(default)]
    pub bundle_items: Vec<BundleGroup>,
    #[serde(default)]
    pub category: Option<ProductCategory>,
}

impl ProductBundle {
    /// Detail payloads keep their pictures under `bundle_images` or
    /// `product_images`; hoist whichever is present into `images`.
    #[must_use]
    pub fn with_resolved_images(mut self) -> Self {
        self.images = self
            .bundle_images
            .clone()
            .or_else(|| self.product_images.clone())
            .unwrap_or_default();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub items_per_page: u32,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PublicPage {
    pub data: Vec<ProductBundle>,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublicListEnvelope {
    pub data: PublicPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SingleEnvelope {
    #[serde(default)]
    pub data: Option<ProductBundle>,
}

/// Query for `GET /api/products/public`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicQuery {
    pub page: u32,
    pub limit: u32,
    pub category_id: Option<i64>,
}

impl Default for PublicQuery {
    fn default() -> Self {
        Self { page: 1, limit: 12, category_id: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fractional_prices_round_to_whole_units() {
        let item: ProductBundle =
            serde_json::from_value(json!({"id": 1, "name": "Madu", "price": 45000.0})).unwrap();
        assert_eq!(item.price, 45_000);
        assert_eq!(item.kind, "product");
    }

    #[test]
    fn unknown_item_types_pass_through() {
        let page: PublicPage = serde_json::from_value(json!({"data": [
            {"id": 1, "name": "Madu", "slug": "madu", "type": "product"},
            {"type": "voucher"}
        ]}))
        .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1].kind, "voucher");
        assert_eq!(page.data[1].id, 0);
    }

    #[test]
    fn resolved_images_prefer_bundle_images() {
        let item: ProductBundle = serde_json::from_value(json!({
            "id": 9,
            "name": "Paket Sehat",
            "type": "bundle",
            "product_images": [{"image_url": "p.jpg"}],
            "bundle_images": [{"image_url": "b.jpg"}]
        }))
        .unwrap();
        let item = item.with_resolved_images();
        assert_eq!(item.images, vec![ImageRef { image_url: "b.jpg".into() }]);
    }

    #[test]
    fn resolved_images_default_to_empty() {
        let item = ProductBundle { id: 1, name: "x".into(), ..Default::default() };
        assert!(item.with_resolved_images().images.is_empty());
    }
}
