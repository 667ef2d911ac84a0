//! Catalog routes backed by our own tables: storefront listings, categories
//! and the admin product/bundle editor.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::catalog::sort_by_name;
use crate::domain::aggregates::{CatalogItem, CatalogPatch, CatalogRow, DisplayProduct, NewCatalogItem};
use crate::domain::value_objects::ItemKind;
use crate::store::{StoreError, Visibility};

use super::{parse_id, ApiError, ApiJson, AppState};

const DUPLICATE_ITEM: &str = "A product with this name or slug already exists.";
const ITEM_NOT_FOUND: &str = "Product or Bundle not found";
const INVALID_PRODUCT_ID: &str = "Invalid Product ID";

#[derive(Debug, Serialize)]
pub(super) struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
}

/// Optional body of a delete; absent means `product`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct KindSelector {
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
}

/// Active products followed by active bundles.
pub(super) async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<DisplayProduct>>, ApiError> {
    let (products, bundles) = tokio::try_join!(
        state.store.list_catalog(ItemKind::Product, Visibility::ActiveOnly),
        state.store.list_catalog(ItemKind::Bundle, Visibility::ActiveOnly),
    )?;

    let items = products
        .iter()
        .map(|e| DisplayProduct::from_entry(e, ItemKind::Product))
        .chain(bundles.iter().map(|e| DisplayProduct::from_entry(e, ItemKind::Bundle)))
        .collect();
    Ok(Json(items))
}

pub(super) async fn list_bundles(State(state): State<AppState>) -> Result<Json<Vec<DisplayProduct>>, ApiError> {
    let bundles = state.store.list_catalog(ItemKind::Bundle, Visibility::ActiveOnly).await?;
    Ok(Json(bundles.iter().map(|e| DisplayProduct::from_entry(e, ItemKind::Bundle)).collect()))
}

pub(super) async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let categories = state.store.list_categories().await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategorySummary { id: c.id, name: c.name, slug: c.slug })
            .collect(),
    ))
}

pub(super) async fn create_item(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewCatalogItem>,
) -> Result<(StatusCode, Json<CatalogRow>), ApiError> {
    let (kind, insert) = body.into_insert()?;
    let row = state
        .store
        .insert_catalog_item(kind, &insert)
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => ApiError::conflict(DUPLICATE_ITEM),
            other => other.into(),
        })?;
    tracing::info!(id = row.id, %kind, slug = %insert.slug, "catalog item created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// Every product and bundle, active or not, ordered by name.
pub(super) async fn list_admin(State(state): State<AppState>) -> Result<Json<Vec<CatalogItem>>, ApiError> {
    let (products, bundles) = tokio::try_join!(
        state.store.list_catalog(ItemKind::Product, Visibility::All),
        state.store.list_catalog(ItemKind::Bundle, Visibility::All),
    )?;

    let mut items: Vec<CatalogItem> = products
        .into_iter()
        .map(|e| CatalogItem::from_entry(e, ItemKind::Product))
        .chain(bundles.into_iter().map(|e| CatalogItem::from_entry(e, ItemKind::Bundle)))
        .collect();
    sort_by_name(&mut items);
    Ok(Json(items))
}

/// Looks the id up in `products` first, then in `bundles`.
pub(super) async fn get_admin_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<CatalogItem>, ApiError> {
    let id = parse_id(&raw_id, INVALID_PRODUCT_ID)?;
    for kind in [ItemKind::Product, ItemKind::Bundle] {
        if let Some(entry) = state.store.find_catalog_item(kind, id).await? {
            return Ok(Json(CatalogItem::from_entry(entry, kind)));
        }
    }
    Err(ApiError::not_found(ITEM_NOT_FOUND))
}

pub(super) async fn update_admin_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ApiJson(patch): ApiJson<CatalogPatch>,
) -> Result<Json<CatalogRow>, ApiError> {
    let id = parse_id(&raw_id, INVALID_PRODUCT_ID)?;
    let assignments = patch.non_empty_assignments()?;
    let row = state
        .store
        .update_catalog_item(patch.kind, id, &assignments)
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => ApiError::conflict(DUPLICATE_ITEM),
            other => other.into(),
        })?
        .ok_or_else(|| ApiError::not_found(ITEM_NOT_FOUND))?;
    tracing::info!(id, kind = %patch.kind, fields = assignments.len(), "catalog item updated");
    Ok(Json(row))
}

pub(super) async fn delete_admin_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Option<Json<KindSelector>>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id, INVALID_PRODUCT_ID)?;
    let kind = body.map(|Json(b)| b.kind).unwrap_or_default();
    state.store.delete_catalog_item(kind, id).await?;
    tracing::info!(id, %kind, "catalog item deleted");
    Ok(StatusCode::NO_CONTENT)
}
