//! The relational backend seam.
//!
//! Handlers and the seed job talk to the database only through these traits.
//! [`PgStore`] is the production implementation; [`MemoryStore`] keeps the
//! same tables in process for tests and local experiments.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{
    CatalogEntry, CatalogInsert, CatalogRow, CategoryRow, ColumnValue, NewOrderItem, NewTicket,
    OrderItemRecord, OrderRow, TicketRow, TicketStatus,
};
use crate::domain::value_objects::ItemKind;
use crate::seed::{CanonicalBundle, CanonicalProduct, NewBundleLink, NewCategory};

pub use memory::{MemoryStore, TableCounts};
pub use postgres::{PgStore, PoolConfig};

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    UniqueViolation(String),
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Self::UniqueViolation(db.message().to_string())
            }
            other => Self::Backend(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for catalog listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    All,
    ActiveOnly,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_catalog(&self, kind: ItemKind, visibility: Visibility) -> StoreResult<Vec<CatalogEntry>>;
    async fn find_catalog_item(&self, kind: ItemKind, id: i64) -> StoreResult<Option<CatalogEntry>>;
    async fn insert_catalog_item(&self, kind: ItemKind, item: &CatalogInsert) -> StoreResult<CatalogRow>;
    /// `Ok(None)` when no row has this id.
    async fn update_catalog_item(&self, kind: ItemKind, id: i64, assignments: &[(&'static str, ColumnValue)]) -> StoreResult<Option<CatalogRow>>;
    async fn delete_catalog_item(&self, kind: ItemKind, id: i64) -> StoreResult<()>;
    /// Categories ordered by name.
    async fn list_categories(&self) -> StoreResult<Vec<CategoryRow>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Resolves a bearer token to the user it was issued for.
    async fn session_user(&self, token: &str) -> StoreResult<Option<Uuid>>;
    async fn insert_order(&self, user_id: Uuid, total_price: i64) -> StoreResult<OrderRow>;
    async fn insert_order_items(&self, items: &[NewOrderItem]) -> StoreResult<()>;
    /// Orders of one user, newest first.
    async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<OrderRow>>;
    async fn list_order_items(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemRecord>>;
    /// Tickets of one user, newest first.
    async fn list_tickets(&self, user_id: Uuid) -> StoreResult<Vec<TicketRow>>;
    async fn insert_ticket(&self, ticket: &NewTicket) -> StoreResult<TicketRow>;
    /// `Ok(false)` when the ticket does not exist or belongs to someone else.
    async fn update_ticket_status(&self, id: i64, user_id: Uuid, status: TicketStatus, resolved_at: Option<DateTime<Utc>>) -> StoreResult<bool>;
}

/// Bulk operations used by the seed job.
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// Empties links, bundles, products and categories, in that order.
    async fn clear_catalog(&self) -> StoreResult<()>;
    async fn insert_categories(&self, rows: &[NewCategory]) -> StoreResult<Vec<CategoryRow>>;
    async fn insert_products(&self, rows: &[CanonicalProduct]) -> StoreResult<Vec<CatalogRow>>;
    async fn insert_bundles(&self, rows: &[CanonicalBundle]) -> StoreResult<Vec<CatalogRow>>;
    async fn insert_bundle_links(&self, rows: &[NewBundleLink]) -> StoreResult<u64>;
}

/// Everything the HTTP layer needs from the backend.
pub trait Backend: CatalogStore + AccountStore {}

impl<T: CatalogStore + AccountStore> Backend for T {}
