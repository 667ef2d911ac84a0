//! HTTP surface of the storefront.

mod auth;
mod catalog;
mod error;
mod orders;
mod storefront;
mod tickets;

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog_api::CatalogApiClient;
use crate::store::Backend;

pub use auth::AuthUser;
pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Backend>,
    pub catalog: CatalogApiClient,
}

/// `Json` extractor whose rejection is an [`ApiError`] body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejection is an [`ApiError`] body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

pub(crate) fn parse_id(raw: &str, message: &'static str) -> Result<i64, ApiError> {
    raw.trim().parse::<i64>().map_err(|_| ApiError::bad_request(message))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health).fallback(error::method_not_allowed))
        .route(
            "/api/products",
            get(catalog::list_active).post(catalog::create_item).fallback(error::method_not_allowed),
        )
        .route("/api/products/:slug", get(storefront::product_by_slug).fallback(error::method_not_allowed))
        .route(
            "/api/products/:type/:slug",
            get(storefront::product_by_kind_and_slug).fallback(error::method_not_allowed),
        )
        .route("/api/storefront/products", get(storefront::list_products).fallback(error::method_not_allowed))
        .route("/api/bundles", get(catalog::list_bundles).fallback(error::method_not_allowed))
        .route("/api/categories", get(catalog::list_categories).fallback(error::method_not_allowed))
        .route(
            "/api/admin/products",
            get(catalog::list_admin).post(catalog::create_item).fallback(error::method_not_allowed),
        )
        .route(
            "/api/admin/products/:id",
            get(catalog::get_admin_item)
                .put(catalog::update_admin_item)
                .delete(catalog::delete_admin_item)
                .fallback(error::method_not_allowed),
        )
        .route("/api/checkout", post(orders::checkout).fallback(error::method_not_allowed))
        .route("/api/orders", get(orders::list_orders).fallback(error::method_not_allowed))
        .route(
            "/api/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket).fallback(error::method_not_allowed),
        )
        .route("/api/tickets/:id", put(tickets::update_ticket).fallback(error::method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "storefront-api"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_non_integers() {
        assert_eq!(parse_id("42", "bad").unwrap(), 42);
        let err = parse_id("abc", "Invalid Product ID").unwrap_err();
        assert_eq!(err.status_code, 400);
        assert_eq!(err.status_message, "Invalid Product ID");
    }
}
