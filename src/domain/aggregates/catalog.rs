//! Catalog Aggregate
//!
//! Products and bundles share one row shape; bundles never carry `stock`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::domain::value_objects::{ItemKind, Slug};
use crate::images::parse_optional_images;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub original_id: Option<i64>,
}

/// Category as embedded in catalog listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
    pub slug: Option<String>,
}

impl From<&CategoryRow> for CategoryRef {
    fn from(c: &CategoryRow) -> Self {
        Self { name: c.name.clone(), slug: c.slug.clone() }
    }
}

/// A stored row of the `products` or `bundles` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogRow {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    pub stock: Option<i32>,
    pub images: Option<Value>,
    pub is_active: bool,
    pub is_best_seller: Option<bool>,
    pub category_id: Option<i64>,
    pub original_id: Option<i64>,
    pub unit: Option<String>,
    pub size: Option<String>,
    pub min_purchase: Option<i32>,
    pub bpom_number: Option<String>,
    pub sku_id: Option<String>,
    pub weight_gr: Option<f64>,
    pub length_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A catalog row joined with its category.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub row: CatalogRow,
    pub category: Option<CategoryRow>,
}

/// Full admin representation of a product or bundle.
#[derive(Clone, Debug, Serialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    pub stock: Option<i32>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_best_seller: Option<bool>,
    pub category_id: Option<i64>,
    pub category: Option<CategoryRow>,
    pub unit: Option<String>,
    pub size: Option<String>,
    pub min_purchase: Option<i32>,
    pub bpom_number: Option<String>,
    pub sku_id: Option<String>,
    pub weight_gr: Option<f64>,
    pub length_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl CatalogItem {
    pub fn from_entry(entry: CatalogEntry, kind: ItemKind) -> Self {
        let CatalogEntry { row, category } = entry;
        Self {
            images: parse_optional_images(row.images.as_ref()),
            stock: if kind == ItemKind::Bundle { None } else { row.stock },
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            is_active: row.is_active,
            is_best_seller: row.is_best_seller,
            category_id: row.category_id,
            category,
            unit: row.unit,
            size: row.size,
            min_purchase: row.min_purchase,
            bpom_number: row.bpom_number,
            sku_id: row.sku_id,
            weight_gr: row.weight_gr,
            length_cm: row.length_cm,
            width_cm: row.width_cm,
            height_cm: row.height_cm,
            created_at: row.created_at,
            kind,
        }
    }
}

/// Storefront listing card for a product or bundle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayProduct {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub price: i64,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_best_seller: Option<bool>,
    pub stock: Option<i32>,
    pub category: Option<CategoryRef>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl DisplayProduct {
    pub fn from_entry(entry: &CatalogEntry, kind: ItemKind) -> Self {
        let row = &entry.row;
        Self {
            id: row.id,
            name: row.name.clone(),
            slug: row.slug.clone(),
            price: row.price,
            images: parse_optional_images(row.images.as_ref()),
            is_active: row.is_active,
            is_best_seller: row.is_best_seller,
            stock: if kind == ItemKind::Bundle { None } else { row.stock },
            category: entry.category.as_ref().map(CategoryRef::from),
            kind,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Body of a create request; `type` picks the table.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct NewCatalogItem {
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub is_best_seller: Option<bool>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: Option<i64>,
    pub unit: Option<String>,
    pub size: Option<String>,
    pub min_purchase: Option<i32>,
    pub bpom_number: Option<String>,
    pub sku_id: Option<String>,
    pub weight_gr: Option<f64>,
    pub length_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Missing required fields.")]
    MissingRequiredFields,
    #[error("No valid fields provided for update.")]
    EmptyPatch,
}

/// A create command after validation, ready for insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogInsert {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: Option<i32>,
    pub is_active: bool,
    pub is_best_seller: bool,
    pub images: Vec<String>,
    pub category_id: Option<i64>,
    pub unit: Option<String>,
    pub size: Option<String>,
    pub min_purchase: Option<i32>,
    pub bpom_number: Option<String>,
    pub sku_id: Option<String>,
    pub weight_gr: Option<f64>,
    pub length_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
}

impl NewCatalogItem {
    /// Checks required fields and fills defaults (slug from name, active, not best seller).
    /// A zero price counts as missing; negative prices are accepted.
    pub fn into_insert(self) -> Result<(ItemKind, CatalogInsert), CatalogError> {
        self.validate().map_err(|_| CatalogError::MissingRequiredFields)?;
        let (Some(name), Some(price)) = (self.name, self.price.filter(|p| *p != 0)) else {
            return Err(CatalogError::MissingRequiredFields);
        };
        let slug = match self.slug.filter(|s| !s.trim().is_empty()) {
            Some(slug) => slug,
            None => Slug::from_name(&name)
                .map_err(|_| CatalogError::MissingRequiredFields)?
                .into_inner(),
        };
        let stock = if self.kind == ItemKind::Bundle { None } else { self.stock };

        Ok((self.kind, CatalogInsert {
            name,
            slug,
            description: self.description,
            price,
            stock,
            is_active: self.is_active.unwrap_or(true),
            is_best_seller: self.is_best_seller.unwrap_or(false),
            images: self.images,
            category_id: self.category_id,
            unit: self.unit,
            size: self.size,
            min_purchase: self.min_purchase,
            bpom_number: self.bpom_number,
            sku_id: self.sku_id,
            weight_gr: self.weight_gr,
            length_cm: self.length_cm,
            width_cm: self.width_cm,
            height_cm: self.height_cm,
        }))
    }
}

/// Distinguishes "field absent" from "field set to null".
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Update command: one optional field per updatable attribute.
///
/// Outer `None` leaves the column alone; `Some(None)` clears a nullable column.
#[allow(clippy::option_option)]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogPatch {
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub slug: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub stock: Option<Option<i32>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub is_best_seller: Option<Option<bool>>,
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub min_purchase: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub bpom_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub sku_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub weight_gr: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub length_cm: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub width_cm: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub height_cm: Option<Option<f64>>,
}

/// A typed value for one column of a [`CatalogPatch`].
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    BigInt(Option<i64>),
    Int(Option<i32>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Json(Value),
}

impl CatalogPatch {
    /// Column assignments in a stable order. `stock` is dropped for bundles.
    pub fn assignments(&self) -> Vec<(&'static str, ColumnValue)> {
        use ColumnValue::{BigInt, Bool, Float, Int, Json, Text};

        let mut out = Vec::new();
        let mut push = |column: &'static str, value: Option<ColumnValue>| {
            if let Some(v) = value { out.push((column, v)); }
        };

        push("name", self.name.clone().map(|v| Text(Some(v))));
        push("slug", self.slug.clone().map(Text));
        push("description", self.description.clone().map(Text));
        push("price", self.price.map(|v| BigInt(Some(v))));
        if self.kind == ItemKind::Product {
            push("stock", self.stock.map(Int));
        }
        push("is_active", self.is_active.map(|v| Bool(Some(v))));
        push("is_best_seller", self.is_best_seller.map(Bool));
        push("images", self.images.as_ref().map(|v| Json(Value::from(v.clone()))));
        push("category_id", self.category_id.map(BigInt));
        push("unit", self.unit.clone().map(Text));
        push("size", self.size.clone().map(Text));
        push("min_purchase", self.min_purchase.map(Int));
        push("bpom_number", self.bpom_number.clone().map(Text));
        push("sku_id", self.sku_id.clone().map(Text));
        push("weight_gr", self.weight_gr.map(Float));
        push("length_cm", self.length_cm.map(Float));
        push("width_cm", self.width_cm.map(Float));
        push("height_cm", self.height_cm.map(Float));
        out
    }

    /// Assignments, rejecting a command that touches nothing.
    pub fn non_empty_assignments(&self) -> Result<Vec<(&'static str, ColumnValue)>, CatalogError> {
        let assignments = self.assignments();
        if assignments.is_empty() {
            return Err(CatalogError::EmptyPatch);
        }
        Ok(assignments)
    }
}

impl CatalogRow {
    /// Applies one patch assignment in memory. Unknown columns or mismatched
    /// value types are ignored.
    pub fn apply(&mut self, column: &str, value: &ColumnValue) {
        use ColumnValue::{BigInt, Bool, Float, Int, Json, Text};

        match (column, value) {
            ("name", Text(Some(v))) => self.name = v.clone(),
            ("slug", Text(v)) => self.slug = v.clone(),
            ("description", Text(v)) => self.description = v.clone(),
            ("price", BigInt(Some(v))) => self.price = *v,
            ("stock", Int(v)) => self.stock = *v,
            ("is_active", Bool(Some(v))) => self.is_active = *v,
            ("is_best_seller", Bool(v)) => self.is_best_seller = *v,
            ("images", Json(v)) => self.images = Some(v.clone()),
            ("category_id", BigInt(v)) => self.category_id = *v,
            ("unit", Text(v)) => self.unit = v.clone(),
            ("size", Text(v)) => self.size = v.clone(),
            ("min_purchase", Int(v)) => self.min_purchase = *v,
            ("bpom_number", Text(v)) => self.bpom_number = v.clone(),
            ("sku_id", Text(v)) => self.sku_id = v.clone(),
            ("weight_gr", Float(v)) => self.weight_gr = *v,
            ("length_cm", Float(v)) => self.length_cm = *v,
            ("width_cm", Float(v)) => self.width_cm = *v,
            ("height_cm", Float(v)) => self.height_cm = *v,
            _ => {}
        }
    }
}

/// Case-insensitive name order used by the admin table.
pub fn sort_by_name(items: &mut [CatalogItem]) {
    items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_only_touches_present_fields() {
        let patch: CatalogPatch = serde_json::from_value(json!({"type": "product", "price": 99})).unwrap();
        assert_eq!(patch.assignments(), vec![("price", ColumnValue::BigInt(Some(99)))]);
    }

    #[test]
    fn test_patch_null_clears_nullable_column() {
        let patch: CatalogPatch = serde_json::from_value(json!({"category_id": null})).unwrap();
        assert_eq!(patch.assignments(), vec![("category_id", ColumnValue::BigInt(None))]);
    }

    #[test]
    fn test_patch_ignores_unknown_keys_and_rejects_empty() {
        let patch: CatalogPatch = serde_json::from_value(json!({"type": "bundle", "owner": "x"})).unwrap();
        assert_eq!(patch.kind, ItemKind::Bundle);
        assert_eq!(patch.non_empty_assignments(), Err(CatalogError::EmptyPatch));
    }

    #[test]
    fn test_patch_drops_stock_for_bundles() {
        let patch: CatalogPatch = serde_json::from_value(json!({"type": "bundle", "stock": 3})).unwrap();
        assert!(patch.assignments().is_empty());
    }

    #[test]
    fn test_new_item_defaults() {
        let body: NewCatalogItem = serde_json::from_value(json!({"name": "Madu Hutan 500g", "price": 120000})).unwrap();
        let (kind, insert) = body.into_insert().unwrap();
        assert_eq!(kind, ItemKind::Product);
        assert_eq!(insert.slug, "madu-hutan-500g");
        assert!(insert.is_active);
        assert!(!insert.is_best_seller);
    }

    #[test]
    fn test_new_item_requires_name_and_price() {
        let no_price: NewCatalogItem = serde_json::from_value(json!({"name": "Madu"})).unwrap();
        assert_eq!(no_price.into_insert(), Err(CatalogError::MissingRequiredFields));
        let zero_price: NewCatalogItem = serde_json::from_value(json!({"name": "Madu", "price": 0})).unwrap();
        assert_eq!(zero_price.into_insert(), Err(CatalogError::MissingRequiredFields));
        let empty_name: NewCatalogItem = serde_json::from_value(json!({"name": "", "price": 5})).unwrap();
        assert_eq!(empty_name.into_insert(), Err(CatalogError::MissingRequiredFields));
    }

    #[test]
    fn test_new_item_accepts_negative_price() {
        let body: NewCatalogItem = serde_json::from_value(json!({"name": "Diskon", "price": -5000})).unwrap();
        let (_, insert) = body.into_insert().unwrap();
        assert_eq!(insert.price, -5000);
    }
}
