use crate::handlers::common::{
    created_response, map_service_error, success_response, ActorId, PaginationParams,
};
use crate::handlers::AppState;
use crate::services::orders::{CreateOrderRequest, UpdateOrderRequest};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ApiError;

/// Create an order with its line items
async fn create_order(
    State(state): State<Arc<AppState>>,
    ActorId(actor_id): ActorId,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .create_order(request, actor_id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(order))
}

/// Fetch one order with its line items
async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// List orders, newest first
async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_orders(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// Apply a partial update to an order
async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_order(order_id, request)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Order routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order))
}
