//! Cart Aggregate
//!
//! Client-side basket: an ordered list keyed by product id, totals derived on read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog_api::ProductBundle;
use crate::domain::aggregates::order::{CheckoutLine, CheckoutProduct, CheckoutRequest};

/// Bundle group id -> chosen variant name.
pub type VariantChoices = BTreeMap<i64, String>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: ProductBundle,
    pub variants: VariantChoices,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> i64 { self.product.price * i64::from(self.quantity) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn total_items(&self) -> u32 { self.items.iter().fold(0, |acc, i| acc.saturating_add(i.quantity)) }
    pub fn total_price(&self) -> i64 { self.items.iter().map(CartItem::line_total).sum() }

    /// Adds to an existing line for the same product, keeping its first
    /// variant choices, or appends a new line.
    pub fn add_product(&mut self, product: ProductBundle, variants: VariantChoices, quantity: u32) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem { product, variants, quantity });
        }
    }

    /// Sets a line's quantity; zero or less removes it. Unknown ids are ignored.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) {
        if quantity <= 0 {
            self.remove_product(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product_id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    pub fn remove_product(&mut self, product_id: i64) {
        self.items.retain(|i| i.product.id != product_id);
    }

    /// Body for `POST /api/checkout`.
    pub fn checkout_request(&self) -> CheckoutRequest {
        CheckoutRequest {
            items: self
                .items
                .iter()
                .map(|i| CheckoutLine {
                    product: CheckoutProduct { id: i.product.id, price: i.product.price },
                    quantity: i.quantity,
                })
                .collect(),
            total_price: self.total_price(),
        }
    }
}
