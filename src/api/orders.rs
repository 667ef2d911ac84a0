use axum::extract::State;
use axum::Json;

use crate::domain::aggregates::{CheckoutRequest, CheckoutResponse, OrderSummary};

use super::auth::AuthUser;
use super::{ApiError, ApiJson, AppState};

/// Creates the order row, then its line items priced as sent by the cart.
pub(super) async fn checkout(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    request.validate()?;

    let order = state.store.insert_order(user_id, request.total_price).await?;
    state.store.insert_order_items(&request.order_items(order.id)).await?;

    tracing::info!(order_id = order.id, order_number = %order.order_number, items = request.items.len(), "order placed");
    Ok(Json(CheckoutResponse { order_id: order.id, order_number: order.order_number }))
}

pub(super) async fn list_orders(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    let orders = state.store.list_orders(user_id).await?;
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let items = state.store.list_order_items(&ids).await?;
    Ok(Json(OrderSummary::assemble(orders, items)))
}
