//! Routes proxied to the third-party catalog API.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::catalog_api::{ProductBundle, PublicQuery};
use crate::domain::value_objects::ItemKind;

use super::error::upstream;
use super::{ApiError, ApiQuery, AppState};

const PAGE_SIZE: u32 = 12;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListingParams {
    pub page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductCard {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub price: i64,
    pub image_url: String,
    pub is_best_seller: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub category_name: String,
}

impl From<&ProductBundle> for ProductCard {
    fn from(p: &ProductBundle) -> Self {
        Self {
            id: p.id,
            slug: p.slug.clone(),
            name: p.name.clone(),
            price: p.price,
            image_url: p.images.first().map(|i| i.image_url.clone()).unwrap_or_default(),
            is_best_seller: p.is_best_seller,
            kind: p.kind.clone(),
            category_name: p.category.as_ref().map_or_else(|| "Uncategorized".to_string(), |c| c.name.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductListing {
    pub products: Vec<ProductCard>,
    pub total_pages: u32,
    pub current_page: u32,
}

/// Resolves a category slug to the identifier the upstream catalog uses.
/// Lookup failures only lose the upstream filter; the local filter still applies.
async fn upstream_category_id(state: &AppState, slug: &str) -> Option<i64> {
    match state.store.list_categories().await {
        Ok(categories) => categories
            .into_iter()
            .find(|c| c.slug.as_deref() == Some(slug))
            .map(|c| c.original_id.unwrap_or(c.id)),
        Err(e) => {
            tracing::warn!(error = %e, "could not load categories to resolve slug");
            None
        }
    }
}

fn matches_filters(p: &ProductBundle, category: Option<&str>, search: Option<&str>) -> bool {
    let in_category = category.map_or(true, |slug| {
        p.category.as_ref().and_then(|c| c.slug.as_deref()) == Some(slug)
    });
    let matches_search = search.map_or(true, |q| p.name.to_lowercase().contains(&q.to_lowercase()));
    in_category && matches_search
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListingParams>,
) -> Result<Json<ProductListing>, ApiError> {
    let category = params.category.as_deref().filter(|s| !s.is_empty());
    let search = params.search.as_deref().filter(|s| !s.is_empty());

    let category_id = match category {
        Some(slug) => upstream_category_id(&state, slug).await,
        None => None,
    };
    let query = PublicQuery { page: params.page.unwrap_or(1).max(1), limit: PAGE_SIZE, category_id };

    let page = state
        .catalog
        .list_public(&query)
        .await
        .map_err(upstream("Failed to fetch products."))?;

    let products = page
        .data
        .iter()
        .filter(|p| matches_filters(p, category, search))
        .map(ProductCard::from)
        .collect();

    Ok(Json(ProductListing {
        products,
        total_pages: page.meta.total_pages,
        current_page: page.meta.current_page,
    }))
}

pub(super) async fn product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductBundle>, ApiError> {
    let all = state
        .catalog
        .list_all_public()
        .await
        .map_err(upstream("Failed to fetch product data."))?;
    all.into_iter()
        .find(|p| p.slug == slug)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

pub(super) async fn product_by_kind_and_slug(
    State(state): State<AppState>,
    Path((raw_kind, slug)): Path<(String, String)>,
) -> Result<Json<ProductBundle>, ApiError> {
    let kind = ItemKind::parse(&raw_kind).ok_or_else(|| ApiError::not_found("Product not found"))?;
    let product = state
        .catalog
        .find_by_slug(kind, &slug)
        .await
        .map_err(upstream("Failed to fetch product data."))?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(product.with_resolved_images()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_api::{ImageRef, ProductCategory};

    fn honey() -> ProductBundle {
        ProductBundle {
            id: 3,
            name: "Madu Hutan".into(),
            slug: "madu-hutan".into(),
            price: 85_000,
            images: vec![ImageRef { image_url: "https://cdn/madu.jpg".into() }],
            category: Some(ProductCategory { category_id: 7, name: "Madu".into(), slug: Some("madu".into()) }),
            ..Default::default()
        }
    }

    #[test]
    fn card_takes_first_image_and_category_name() {
        let card = ProductCard::from(&honey());
        assert_eq!(card.image_url, "https://cdn/madu.jpg");
        assert_eq!(card.category_name, "Madu");

        let bare = ProductCard::from(&ProductBundle { id: 1, name: "x".into(), ..Default::default() });
        assert_eq!(bare.image_url, "");
        assert_eq!(bare.category_name, "Uncategorized");
    }

    #[test]
    fn filters_are_case_insensitive_on_name() {
        let p = honey();
        assert!(matches_filters(&p, Some("madu"), Some("HUTAN")));
        assert!(!matches_filters(&p, Some("teh"), None));
        assert!(!matches_filters(&p, None, Some("propolis")));
        assert!(matches_filters(&p, None, None));
    }
}
