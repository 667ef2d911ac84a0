//! Postgres implementation of the store traits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::aggregates::{
    CatalogEntry, CatalogInsert, CatalogRow, CategoryRow, ColumnValue, NewOrderItem, NewTicket,
    OrderItemRecord, OrderRow, TicketRow, TicketStatus,
};
use crate::domain::value_objects::ItemKind;
use crate::seed::{CanonicalBundle, CanonicalProduct, NewBundleLink, NewCategory};

use super::{AccountStore, CatalogStore, SeedStore, StoreResult, Visibility};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const ROW_COLUMNS: [&str; 21] = [
    "id", "name", "slug", "description", "price", "stock", "images", "is_active", "is_best_seller",
    "category_id", "original_id", "unit", "size", "min_purchase", "bpom_number", "sku_id",
    "weight_gr", "length_cm", "width_cm", "height_cm", "created_at",
];

const CATEGORY_COLUMNS: &str = "id, name, slug, original_id";
const ORDER_COLUMNS: &str = "id, order_number, user_id, total_price, created_at";

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_connections: 10, min_connections: 1, acquire_timeout_secs: 10 }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Clone)]
pub struct PgStore { pool: PgPool }

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the pool cannot be established.
    pub async fn connect(database_url: &str, config: PoolConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// # Errors
    ///
    /// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool { &self.pool }
}

/// Select list for one catalog table. Bundles have no `stock` column, so it
/// is projected as a typed NULL to keep a single row shape.
fn row_columns(kind: ItemKind, alias: &str) -> String {
    ROW_COLUMNS
        .iter()
        .map(|column| match (kind, *column) {
            (ItemKind::Bundle, "stock") => "NULL::integer AS stock".to_string(),
            _ => format!("{alias}{column}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(sqlx::FromRow)]
struct JoinedRow {
    #[sqlx(flatten)]
    item: CatalogRow,
    cat_id: Option<i64>,
    cat_name: Option<String>,
    cat_slug: Option<String>,
    cat_original_id: Option<i64>,
}

impl From<JoinedRow> for CatalogEntry {
    fn from(j: JoinedRow) -> Self {
        let category = j.cat_id.zip(j.cat_name).map(|(id, name)| CategoryRow {
            id,
            name,
            slug: j.cat_slug,
            original_id: j.cat_original_id,
        });
        Self { row: j.item, category }
    }
}

fn joined_select(kind: ItemKind) -> String {
    format!(
        "SELECT {}, c.id AS cat_id, c.name AS cat_name, c.slug AS cat_slug, c.original_id AS cat_original_id \
         FROM {} t LEFT JOIN categories c ON c.id = t.category_id",
        row_columns(kind, "t."),
        kind.table()
    )
}

fn bind_column(qb: &mut QueryBuilder<'_, Postgres>, value: &ColumnValue) {
    match value {
        ColumnValue::Text(v) => qb.push_bind(v.clone()),
        ColumnValue::BigInt(v) => qb.push_bind(*v),
        ColumnValue::Int(v) => qb.push_bind(*v),
        ColumnValue::Float(v) => qb.push_bind(*v),
        ColumnValue::Bool(v) => qb.push_bind(*v),
        ColumnValue::Json(v) => qb.push_bind(v.clone()),
    };
}

fn images_json(images: &[String]) -> serde_json::Value {
    serde_json::Value::from(images.to_vec())
}

fn insert_item_query(kind: ItemKind, item: &CatalogInsert) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (name, slug, description, price, ", kind.table()));
    if kind == ItemKind::Product { qb.push("stock, "); }
    qb.push("is_active, is_best_seller, images, category_id, unit, size, min_purchase, bpom_number, sku_id, weight_gr, length_cm, width_cm, height_cm) VALUES (");
    {
        let mut values = qb.separated(", ");
        values.push_bind(item.name.clone()).push_bind(item.slug.clone()).push_bind(item.description.clone()).push_bind(item.price);
        if kind == ItemKind::Product { values.push_bind(item.stock); }
        values.push_bind(item.is_active).push_bind(item.is_best_seller).push_bind(images_json(&item.images)).push_bind(item.category_id);
        values.push_bind(item.unit.clone()).push_bind(item.size.clone()).push_bind(item.min_purchase).push_bind(item.bpom_number.clone()).push_bind(item.sku_id.clone());
        values.push_bind(item.weight_gr).push_bind(item.length_cm).push_bind(item.width_cm).push_bind(item.height_cm);
    }
    qb.push(") RETURNING ");
    qb.push(row_columns(kind, ""));
    qb
}

/// `assignments` must be non-empty; callers reject empty patches first.
fn update_item_query(kind: ItemKind, id: i64, assignments: &[(&'static str, ColumnValue)]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", kind.table()));
    for (i, (column, value)) in assignments.iter().enumerate() {
        if i > 0 { qb.push(", "); }
        qb.push(*column).push(" = ");
        bind_column(&mut qb, value);
    }
    qb.push(" WHERE id = ").push_bind(id).push(" RETURNING ").push(row_columns(kind, ""));
    qb
}

fn insert_categories_query(rows: &[NewCategory]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO categories (name, slug, original_id) ");
    qb.push_values(rows, |mut b, c| {
        b.push_bind(c.name.clone()).push_bind(c.slug.clone()).push_bind(c.original_id);
    });
    qb.push(" RETURNING ").push(CATEGORY_COLUMNS);
    qb
}

fn insert_products_query(rows: &[CanonicalProduct]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO products (name, slug, description, price, stock, images, is_active, is_best_seller, category_id, original_id) ",
    );
    qb.push_values(rows, |mut b, p| {
        b.push_bind(p.name.clone()).push_bind(p.slug.clone()).push_bind(p.description.clone()).push_bind(p.price).push_bind(p.stock)
            .push_bind(images_json(&p.images)).push_bind(p.is_active).push_bind(p.is_best_seller).push_bind(p.category_id).push_bind(p.original_id);
    });
    qb.push(" RETURNING ").push(row_columns(ItemKind::Product, ""));
    qb
}

fn insert_bundles_query(rows: &[CanonicalBundle]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO bundles (name, slug, description, price, images, is_active, is_best_seller, category_id, original_id) ",
    );
    qb.push_values(rows, |mut b, r| {
        b.push_bind(r.name.clone()).push_bind(r.slug.clone()).push_bind(r.description.clone()).push_bind(r.price)
            .push_bind(images_json(&r.images)).push_bind(r.is_active).push_bind(r.is_best_seller).push_bind(r.category_id).push_bind(r.original_id);
    });
    qb.push(" RETURNING ").push(row_columns(ItemKind::Bundle, ""));
    qb
}

fn insert_links_query(rows: &[NewBundleLink]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO bundle_product_items (bundle_id, product_id, variant_name) ");
    qb.push_values(rows, |mut b, link| {
        b.push_bind(link.bundle_id).push_bind(link.product_id).push_bind(link.variant_name.clone());
    });
    qb
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_catalog(&self, kind: ItemKind, visibility: Visibility) -> StoreResult<Vec<CatalogEntry>> {
        let mut sql = joined_select(kind);
        if visibility == Visibility::ActiveOnly { sql.push_str(" WHERE t.is_active = TRUE"); }
        sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");
        let rows = sqlx::query_as::<_, JoinedRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(CatalogEntry::from).collect())
    }

    async fn find_catalog_item(&self, kind: ItemKind, id: i64) -> StoreResult<Option<CatalogEntry>> {
        let sql = format!("{} WHERE t.id = $1", joined_select(kind));
        let row = sqlx::query_as::<_, JoinedRow>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(CatalogEntry::from))
    }

    async fn insert_catalog_item(&self, kind: ItemKind, item: &CatalogInsert) -> StoreResult<CatalogRow> {
        let mut qb = insert_item_query(kind, item);
        Ok(qb.build_query_as::<CatalogRow>().fetch_one(&self.pool).await?)
    }

    async fn update_catalog_item(&self, kind: ItemKind, id: i64, assignments: &[(&'static str, ColumnValue)]) -> StoreResult<Option<CatalogRow>> {
        let mut qb = update_item_query(kind, id, assignments);
        Ok(qb.build_query_as::<CatalogRow>().fetch_optional(&self.pool).await?)
    }

    async fn delete_catalog_item(&self, kind: ItemKind, id: i64) -> StoreResult<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table())).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<CategoryRow>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name");
        Ok(sqlx::query_as::<_, CategoryRow>(&sql).fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn session_user(&self, token: &str) -> StoreResult<Option<Uuid>> {
        Ok(sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM auth_sessions WHERE token = $1 AND (expires_at IS NULL OR expires_at > NOW())")
            .bind(token).fetch_optional(&self.pool).await?)
    }

    async fn insert_order(&self, user_id: Uuid, total_price: i64) -> StoreResult<OrderRow> {
        let sql = format!("INSERT INTO orders (user_id, total_price) VALUES ($1, $2) RETURNING {ORDER_COLUMNS}");
        Ok(sqlx::query_as::<_, OrderRow>(&sql).bind(user_id).bind(total_price).fetch_one(&self.pool).await?)
    }

    async fn insert_order_items(&self, items: &[NewOrderItem]) -> StoreResult<()> {
        if items.is_empty() { return Ok(()); }
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase) ");
        qb.push_values(items, |mut b, item| {
            b.push_bind(item.order_id).push_bind(item.product_id).push_bind(item.quantity).push_bind(item.price_at_purchase);
        });
        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<OrderRow>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC");
        Ok(sqlx::query_as::<_, OrderRow>(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn list_order_items(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItemRecord>> {
        if order_ids.is_empty() { return Ok(Vec::new()); }
        Ok(sqlx::query_as::<_, OrderItemRecord>(
            "SELECT oi.order_id, oi.quantity, oi.price_at_purchase, p.name AS product_name, p.images AS product_images \
             FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id WHERE oi.order_id = ANY($1) ORDER BY oi.id",
        )
        .bind(order_ids.to_vec())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_tickets(&self, user_id: Uuid) -> StoreResult<Vec<TicketRow>> {
        Ok(sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn insert_ticket(&self, ticket: &NewTicket) -> StoreResult<TicketRow> {
        Ok(sqlx::query_as::<_, TicketRow>("INSERT INTO tickets (user_id, issue_type, description, transaction_reference, contact_phone, contact_email, supporting_files) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *")
            .bind(ticket.user_id).bind(&ticket.issue_type).bind(&ticket.description).bind(&ticket.transaction_reference)
            .bind(&ticket.contact_phone).bind(&ticket.contact_email).bind(&ticket.supporting_files)
            .fetch_one(&self.pool).await?)
    }

    async fn update_ticket_status(&self, id: i64, user_id: Uuid, status: TicketStatus, resolved_at: Option<DateTime<Utc>>) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE tickets SET status = $1, resolved_at = $2 WHERE id = $3 AND user_id = $4")
            .bind(status.as_str()).bind(resolved_at).bind(id).bind(user_id)
            .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SeedStore for PgStore {
    async fn clear_catalog(&self) -> StoreResult<()> {
        for table in ["bundle_product_items", "bundles", "products", "categories"] {
            sqlx::query(&format!("DELETE FROM {table}")).execute(&self.pool).await?;
            tracing::debug!(table, "cleared");
        }
        Ok(())
    }

    async fn insert_categories(&self, rows: &[NewCategory]) -> StoreResult<Vec<CategoryRow>> {
        if rows.is_empty() { return Ok(Vec::new()); }
        let mut qb = insert_categories_query(rows);
        Ok(qb.build_query_as::<CategoryRow>().fetch_all(&self.pool).await?)
    }

    async fn insert_products(&self, rows: &[CanonicalProduct]) -> StoreResult<Vec<CatalogRow>> {
        if rows.is_empty() { return Ok(Vec::new()); }
        let mut qb = insert_products_query(rows);
        Ok(qb.build_query_as::<CatalogRow>().fetch_all(&self.pool).await?)
    }

    async fn insert_bundles(&self, rows: &[CanonicalBundle]) -> StoreResult<Vec<CatalogRow>> {
        if rows.is_empty() { return Ok(Vec::new()); }
        let mut qb = insert_bundles_query(rows);
        Ok(qb.build_query_as::<CatalogRow>().fetch_all(&self.pool).await?)
    }

    async fn insert_bundle_links(&self, rows: &[NewBundleLink]) -> StoreResult<u64> {
        if rows.is_empty() { return Ok(0); }
        let mut qb = insert_links_query(rows);
        Ok(qb.build().execute(&self.pool).await?.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders(sql: &str) -> usize {
        sql.matches('$').count()
    }

    /// Number of names in the first parenthesised column list.
    fn column_count(sql: &str) -> usize {
        let start = sql.find('(').unwrap();
        let end = sql[start..].find(')').unwrap() + start;
        sql[start + 1..end].split(',').count()
    }

    fn stored(id: i64, name: &str) -> CatalogRow {
        CatalogRow {
            id,
            name: name.to_string(),
            slug: Some(name.to_lowercase()),
            description: None,
            price: 10_000,
            stock: Some(3),
            images: None,
            is_active: true,
            is_best_seller: Some(false),
            category_id: Some(1),
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

    fn insert(name: &str) -> CatalogInsert {
        CatalogInsert {
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: None,
            price: 85_000,
            stock: Some(4),
            is_active: true,
            is_best_seller: false,
            images: vec!["madu.jpg".to_string()],
            category_id: None,
            unit: None,
            size: None,
            min_purchase: None,
            bpom_number: None,
            sku_id: None,
            weight_gr: None,
            length_cm: None,
            width_cm: None,
            height_cm: None,
        }
    }

    #[test]
    fn bundle_columns_project_null_stock() {
        let columns = row_columns(ItemKind::Bundle, "t.");
        assert!(columns.contains("NULL::integer AS stock"));
        assert!(!columns.contains("t.stock"));
        assert!(row_columns(ItemKind::Product, "t.").contains("t.stock"));
    }

    #[test]
    fn joined_select_embeds_category_columns() {
        let sql = joined_select(ItemKind::Bundle);
        assert!(sql.starts_with("SELECT t.id, t.name"));
        assert!(sql.contains("c.id AS cat_id, c.name AS cat_name, c.slug AS cat_slug, c.original_id AS cat_original_id"));
        assert!(sql.ends_with("FROM bundles t LEFT JOIN categories c ON c.id = t.category_id"));
    }

    #[test]
    fn joined_row_becomes_entry_with_category() {
        let entry = CatalogEntry::from(JoinedRow {
            item: stored(5, "Madu"),
            cat_id: Some(1),
            cat_name: Some("Honey".into()),
            cat_slug: Some("honey".into()),
            cat_original_id: Some(7),
        });
        assert_eq!(entry.row.id, 5);
        assert_eq!(
            entry.category,
            Some(CategoryRow { id: 1, name: "Honey".into(), slug: Some("honey".into()), original_id: Some(7) })
        );

        let orphan = CatalogEntry::from(JoinedRow {
            item: stored(6, "Teh"),
            cat_id: None,
            cat_name: None,
            cat_slug: None,
            cat_original_id: None,
        });
        assert_eq!(orphan.category, None);
    }

    #[test]
    fn update_sets_only_given_columns() {
        let qb = update_item_query(ItemKind::Product, 42, &[("price", ColumnValue::BigInt(Some(99)))]);
        let sql = qb.sql();
        assert!(sql.starts_with("UPDATE products SET price = $1 WHERE id = $2 RETURNING id, name"));
        assert_eq!(placeholders(sql), 2);
    }

    #[test]
    fn update_of_bundle_returns_null_stock() {
        let assignments = [("name", ColumnValue::Text(Some("Paket".into()))), ("category_id", ColumnValue::BigInt(None))];
        let qb = update_item_query(ItemKind::Bundle, 9, &assignments);
        let sql = qb.sql();
        assert!(sql.starts_with("UPDATE bundles SET name = $1, category_id = $2 WHERE id = $3 RETURNING "));
        assert!(sql.contains("NULL::integer AS stock"));
        assert_eq!(placeholders(sql), 3);
    }

    #[test]
    fn insert_binds_one_value_per_column() {
        let product = insert_item_query(ItemKind::Product, &insert("Madu"));
        assert!(product.sql().starts_with("INSERT INTO products (name, slug, description, price, stock, "));
        assert_eq!(column_count(product.sql()), 18);
        assert_eq!(placeholders(product.sql()), 18);

        let bundle = insert_item_query(ItemKind::Bundle, &insert("Paket"));
        assert!(!bundle.sql().contains(", stock,"));
        assert!(bundle.sql().contains("RETURNING id, name"));
        assert!(bundle.sql().contains("NULL::integer AS stock"));
        assert_eq!(column_count(bundle.sql()), 17);
        assert_eq!(placeholders(bundle.sql()), 17);
    }

    #[test]
    fn seed_batches_bind_every_row() {
        let categories = [
            NewCategory { name: "Madu".into(), slug: Some("madu".into()), original_id: 1 },
            NewCategory { name: "Teh".into(), slug: None, original_id: 2 },
        ];
        let qb = insert_categories_query(&categories);
        assert_eq!(placeholders(qb.sql()), 6);
        assert!(qb.sql().ends_with(&format!("RETURNING {CATEGORY_COLUMNS}")));

        let products = vec![
            CanonicalProduct {
                original_id: 101,
                name: "Madu".into(),
                slug: Some("madu".into()),
                description: None,
                price: 85_000,
                stock: Some(12),
                images: vec![],
                is_active: true,
                is_best_seller: true,
                category_id: Some(1),
            };
            3
        ];
        let qb = insert_products_query(&products);
        assert_eq!(column_count(qb.sql()), 10);
        assert_eq!(placeholders(qb.sql()), 30);
        assert!(qb.sql().contains("VALUES ($1, $2"));

        let bundles = [CanonicalBundle {
            original_id: 900,
            name: "Paket".into(),
            slug: None,
            description: None,
            price: 140_000,
            images: vec![],
            is_active: true,
            is_best_seller: false,
            category_id: None,
        }];
        let qb = insert_bundles_query(&bundles);
        assert_eq!(column_count(qb.sql()), 9);
        assert_eq!(placeholders(qb.sql()), 9);
        assert!(qb.sql().contains("NULL::integer AS stock"));

        let links = [
            NewBundleLink { bundle_id: 1, product_id: 2, variant_name: Some("Original".into()) },
            NewBundleLink { bundle_id: 1, product_id: 3, variant_name: None },
        ];
        let qb = insert_links_query(&links);
        assert_eq!(placeholders(qb.sql()), 6);
        assert!(!qb.sql().contains("RETURNING"));
    }

    #[test]
    fn pool_config_follows_app_config() {
        let config = crate::config::build_app_config(|key| match key {
            "DATABASE_URL" => Ok("postgres://localhost/shop".to_string()),
            "DB_MAX_CONNECTIONS" => Ok("4".to_string()),
            _ => Err(std::env::VarError::NotPresent),
        })
        .unwrap();
        let pool = PoolConfig::from_app_config(&config);
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.acquire_timeout_secs, PoolConfig::default().acquire_timeout_secs);
    }
}
