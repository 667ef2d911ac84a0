//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::images::parse_images_nested;

/// Product fields the checkout needs; the client sends the whole product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutProduct { pub id: i64, pub price: i64 }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine { pub product: CheckoutProduct, pub quantity: u32 }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    pub total_price: i64,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() { return Err(OrderError::NoItems); }
        if self.items.iter().any(|l| l.quantity == 0) { return Err(OrderError::InvalidQuantity); }
        Ok(())
    }

    /// Line items for a freshly created order, priced as sent.
    pub fn order_items(&self, order_id: i64) -> Vec<NewOrderItem> {
        self.items
            .iter()
            .map(|l| NewOrderItem {
                order_id,
                product_id: l.product.id,
                quantity: i32::try_from(l.quantity).unwrap_or(i32::MAX),
                price_at_purchase: l.product.price,
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub order_number: String,
    pub user_id: Uuid,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrderItem { pub order_id: i64, pub product_id: i64, pub quantity: i32, pub price_at_purchase: i64 }

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse { pub order_id: i64, pub order_number: String }

/// An order item joined with the product it refers to, as read from the store.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct OrderItemRecord {
    pub order_id: i64,
    pub quantity: i32,
    pub price_at_purchase: i64,
    pub product_name: Option<String>,
    pub product_images: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderedProduct { pub name: String, pub images: Vec<String> }

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderItemView { pub quantity: i32, pub price_at_purchase: i64, pub product: Option<OrderedProduct> }

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: OrderRow,
    pub order_items: Vec<OrderItemView>,
}

impl OrderSummary {
    /// Groups item records under their orders, keeping the order of `orders`.
    pub fn assemble(orders: Vec<OrderRow>, items: Vec<OrderItemRecord>) -> Vec<Self> {
        let mut summaries: Vec<Self> = orders.into_iter().map(|order| Self { order, order_items: vec![] }).collect();
        for item in items {
            let Some(summary) = summaries.iter_mut().find(|s| s.order.id == item.order_id) else { continue };
            let product = item.product_name.map(|name| OrderedProduct {
                name,
                images: item.product_images.as_ref().map(parse_images_nested).unwrap_or_default(),
            });
            summary.order_items.push(OrderItemView { quantity: item.quantity, price_at_purchase: item.price_at_purchase, product });
        }
        summaries
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Cart is empty.")]
    NoItems,
    #[error("Quantity must be at least 1.")]
    InvalidQuantity,
}
