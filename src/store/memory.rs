//! In-process store with the same table semantics as [`super::PgStore`].
//!
//! Used by the integration tests and for running the API without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::aggregates::{
    CatalogEntry, CatalogInsert, CatalogRow, CategoryRow, ColumnValue, NewOrderItem, NewTicket,
    OrderItemRecord, OrderRow, TicketRow, TicketStatus,
};
use crate::domain::value_objects::ItemKind;
use crate::seed::{CanonicalBundle, CanonicalProduct, NewBundleLink, NewCategory};

use super::{AccountStore, CatalogStore, SeedStore, StoreError, StoreResult, Visibility};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    categories: Vec<CategoryRow>,
    products: Vec<CatalogRow>,
    bundles: Vec<CatalogRow>,
    links: Vec<NewBundleLink>,
    sessions: HashMap<String, Uuid>,
    orders: Vec<OrderRow>,
    order_items: Vec<NewOrderItem>,
    tickets: Vec<TicketRow>,
    fail_on: Option<&'static str>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn catalog(&self, kind: ItemKind) -> &Vec<CatalogRow> {
        match kind { ItemKind::Product => &self.products, ItemKind::Bundle => &self.bundles }
    }

    fn catalog_mut(&mut self, kind: ItemKind) -> &mut Vec<CatalogRow> {
        match kind { ItemKind::Product => &mut self.products, ItemKind::Bundle => &mut self.bundles }
    }

    fn entry(&self, row: &CatalogRow) -> CatalogEntry {
        let category = row.category_id.and_then(|id| self.categories.iter().find(|c| c.id == id)).cloned();
        CatalogEntry { row: row.clone(), category }
    }

    fn check(&self, operation: &'static str) -> StoreResult<()> {
        match self.fail_on {
            Some(op) if op == operation => Err(StoreError::Backend(format!("{operation} failed"))),
            _ => Ok(()),
        }
    }

    fn ensure_unique_slug(&self, kind: ItemKind, slug: Option<&str>, except: Option<i64>) -> StoreResult<()> {
        let Some(slug) = slug else { return Ok(()) };
        let taken = self.catalog(kind).iter().any(|r| r.slug.as_deref() == Some(slug) && Some(r.id) != except);
        if taken {
            return Err(StoreError::UniqueViolation(format!(
                "duplicate key value violates unique constraint \"{}_slug_key\"",
                kind.table()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore { tables: Mutex<Tables> }

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Backend("memory store poisoned".to_string()))
    }

    /// Registers a bearer token for `user_id`.
    pub fn add_session(&self, token: &str, user_id: Uuid) {
        if let Ok(mut t) = self.tables() { t.sessions.insert(token.to_string(), user_id); }
    }

    /// Stores `row` as-is, keeping its id.
    pub fn put_row(&self, kind: ItemKind, row: CatalogRow) {
        if let Ok(mut t) = self.tables() {
            t.next_id = t.next_id.max(row.id);
            t.catalog_mut(kind).push(row);
        }
    }

    pub fn put_category(&self, category: CategoryRow) {
        if let Ok(mut t) = self.tables() {
            t.next_id = t.next_id.max(category.id);
            t.categories.push(category);
        }
    }

    pub fn row(&self, kind: ItemKind, id: i64) -> Option<CatalogRow> {
        self.tables().ok()?.catalog(kind).iter().find(|r| r.id == id).cloned()
    }

    /// Makes the named trait operation fail with a backend error.
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut t) = self.tables() { t.fail_on = Some(operation); }
    }

    pub fn counts(&self) -> TableCounts {
        self.tables()
            .map(|t| TableCounts {
                categories: t.categories.len(),
                products: t.products.len(),
                bundles: t.bundles.len(),
                links: t.links.len(),
                orders: t.orders.len(),
                order_items: t.order_items.len(),
                tickets: t.tickets.len(),
            })
            .unwrap_or_default()
    }

    pub fn links(&self) -> Vec<NewBundleLink> {
        self.tables().map(|t| t.links.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub categories: usize,
    pub products: usize,
    pub bundles: usize,
    pub links: usize,
    pub orders: usize,
    pub order_items: usize,
    pub tickets: usize,
}

#[allow(clippy::too_many_arguments)]
fn new_row(id: i64, name: &str, slug: Option<String>, description: Option<String>, price: i64, stock: Option<i32>, images: &[String], is_active: bool, is_best_seller: bool, category_id: Option<i64>) -> CatalogRow {
    CatalogRow {
        id,
        name: name.to_string(),
        slug,
        description,
        price,
        stock,
        images: Some(serde_json::Value::from(images.to_vec())),
        is_active,
        is_best_seller: Some(is_best_seller),
        category_id,
        original_id: None,
        unit: None,
        size: None,
        min_purchase: None,
        bpom_number: None,
        sku_id: None,
        weight_gr: None,
        length_cm: None,
        width_cm: None,
        height_cm: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_catalog(&self, kind: ItemKind, visibility: Visibility) -> StoreResult<Vec<CatalogEntry>> {
        let t = self.tables()?;
        t.check("list_catalog")?;
        let mut rows: Vec<&CatalogRow> = t
            .catalog(kind)
            .iter()
            .filter(|r| visibility == Visibility::All || r.is_active)
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows.into_iter().map(|r| t.entry(r)).collect())
    }

    async fn find_catalog_item(&self, kind: ItemKind, id: i64) -> StoreResult<Option<CatalogEntry>> {
        let t = self.tables()?;
        t.check("find_catalog_item")?;
        Ok(t.catalog(kind).iter().find(|r| r.id == id).map(|r| t.entry(r)))
    }

    async fn insert_catalog_item(&self, kind: ItemKind, item: &CatalogInsert) -> StoreResult<CatalogRow> {
        let mut t = self.tables()?;
        t.check("insert_catalog_item")?;
        t.ensure_unique_slug(kind, Some(&item.slug), None)?;
        let id = t.id();
        let stock = if kind == ItemKind::Product { item.stock } else { None };
        let mut row = new_row(id, &item.name, Some(item.slug.clone()), item.description.clone(), item.price, stock, &item.images, item.is_active, item.is_best_seller, item.category_id);
        row.unit = item.unit.clone();
        row.size = item.size.clone();
        row.min_purchase = item.min_purchase;
        row.bpom_number = item.bpom_number.clone();
        row.sku_id = item.sku_id.clone();
        row.weight_gr = item.weight_gr;
        row.length_cm = item.length_cm;
        row.width_cm = item.width_cm;
        row.height_cm = item.height_cm;
        t.catalog_mut(kind).push(row.clone());
        Ok(row)
    }

    async fn update_catalog_item(&self, kind: ItemKind, id: i64, assignments: &[(&'static str, ColumnValue)]) -> StoreResult<Option<CatalogRow>> {
        let mut t = self.tables()?;
        t.check("update_catalog_item")?;
        if let Some((_, ColumnValue::Text(slug))) = assignments.iter().find(|(c, _)| *c == "slug") {
            t.ensure_unique_slug(kind, slug.as_deref(), Some(id))?;
        }
        let Some(row) = t.catalog_mut(kind).iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        for (column, value) in assignments {
            row.apply(column, value);
        }
        Ok(Some(row.clone()))
    }

    async fn delete_catalog_item(&self, kind: ItemKind, id: i64) -> StoreResult<()> {
        let mut t = self.tables()?;
        t.check("delete_catalog_item")?;
        t.catalog_mut(kind).retain(|r| r.id != id);
        match kind {
            ItemKind::Product => t.links.retain(|l| l.product_id != id),
            ItemKind::Bundle => t.links.retain(|l| l.bundle_id != id),
        }
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<CategoryRow>> {
        let t = self.tables()?;
        t.check("list_categories")?;
        let mut categories = t.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn session_user(&self, token: &str) -> StoreResult<Option<Uuid>> {
        Ok(self.tables()?.sessions.get(token).copied())
    }

    async fn insert_order(&self, user_id: Uuid, total_price: i64) -> StoreResult<OrderRow> {
        let mut t = self.tables()?;
        t.check("insert_order")?;
        let id = t.id();
        let order = OrderRow { id, order_number: format!("ORD-{id:06}"), user_id, total_price, created_at: Utc::now() };
        t.orders.push(order.clone());
        Ok(order)
    }

    async fn insert_order_items(&self, items: &[NewOrderItem]) -> StoreResult<()> {
        let mut t = self.tables()?;
        t.check("insert_order_items")?;
        t.order_items.extend_from_slice(items);
        Ok(())
    }

    async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<OrderRow>> {
        let t = self.tables()?;
        let mut orders: Vec<OrderRow> = t.orders.iter().filter(|o| o.user_id == user_id).cloned().collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    async fn list_order_items(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemRecord>> {
        let t = self.tables()?;
        Ok(t.order_items
            .iter()
            .filter(|i| order_ids.contains(&i.order_id))
            .map(|i| {
                let product = t.products.iter().find(|p| p.id == i.product_id);
                OrderItemRecord {
                    order_id: i.order_id,
                    quantity: i.quantity,
                    price_at_purchase: i.price_at_purchase,
                    product_name: product.map(|p| p.name.clone()),
                    product_images: product.and_then(|p| p.images.clone()),
                }
            })
            .collect())
    }

    async fn list_tickets(&self, user_id: Uuid) -> StoreResult<Vec<TicketRow>> {
        let t = self.tables()?;
        let mut tickets: Vec<TicketRow> = t.tickets.iter().filter(|r| r.user_id == user_id).cloned().collect();
        tickets.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(tickets)
    }

    async fn insert_ticket(&self, ticket: &NewTicket) -> StoreResult<TicketRow> {
        let mut t = self.tables()?;
        t.check("insert_ticket")?;
        let id = t.id();
        let row = TicketRow {
            id,
            user_id: ticket.user_id,
            issue_type: ticket.issue_type.clone(),
            description: ticket.description.clone(),
            transaction_reference: ticket.transaction_reference.clone(),
            contact_phone: ticket.contact_phone.clone(),
            contact_email: ticket.contact_email.clone(),
            supporting_files: ticket.supporting_files.clone(),
            status: TicketStatus::Open.as_str().to_string(),
            resolved_at: None,
            created_at: Utc::now(),
        };
        t.tickets.push(row.clone());
        Ok(row)
    }

    async fn update_ticket_status(&self, id: i64, user_id: Uuid, status: TicketStatus, resolved_at: Option<DateTime<Utc>>) -> StoreResult<bool> {
        let mut t = self.tables()?;
        let Some(ticket) = t.tickets.iter_mut().find(|r| r.id == id && r.user_id == user_id) else {
            return Ok(false);
        };
        ticket.status = status.as_str().to_string();
        ticket.resolved_at = resolved_at;
        Ok(true)
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    async fn clear_catalog(&self) -> StoreResult<()> {
        let mut t = self.tables()?;
        t.check("clear_catalog")?;
        t.links.clear();
        t.bundles.clear();
        t.products.clear();
        t.categories.clear();
        Ok(())
    }

    async fn insert_categories(&self, rows: &[NewCategory]) -> StoreResult<Vec<CategoryRow>> {
        let mut t = self.tables()?;
        t.check("insert_categories")?;
        let mut inserted = Vec::with_capacity(rows.len());
        for c in rows {
            let row = CategoryRow { id: t.id(), name: c.name.clone(), slug: c.slug.clone(), original_id: Some(c.original_id) };
            t.categories.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn insert_products(&self, rows: &[CanonicalProduct]) -> StoreResult<Vec<CatalogRow>> {
        let mut t = self.tables()?;
        t.check("insert_products")?;
        let mut inserted = Vec::with_capacity(rows.len());
        for p in rows {
            let mut row = new_row(t.id(), &p.name, p.slug.clone(), p.description.clone(), p.price, p.stock, &p.images, p.is_active, p.is_best_seller, p.category_id);
            row.original_id = Some(p.original_id);
            t.products.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn insert_bundles(&self, rows: &[CanonicalBundle]) -> StoreResult<Vec<CatalogRow>> {
        let mut t = self.tables()?;
        t.check("insert_bundles")?;
        let mut inserted = Vec::with_capacity(rows.len());
        for b in rows {
            let mut row = new_row(t.id(), &b.name, b.slug.clone(), b.description.clone(), b.price, None, &b.images, b.is_active, b.is_best_seller, b.category_id);
            row.original_id = Some(b.original_id);
            t.bundles.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn insert_bundle_links(&self, rows: &[NewBundleLink]) -> StoreResult<u64> {
        let mut t = self.tables()?;
        t.check("insert_bundle_links")?;
        t.links.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }
}
