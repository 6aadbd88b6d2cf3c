use crate::handlers::common::{created_response, map_service_error, success_response, ActorId};
use crate::handlers::AppState;
use crate::services::inventory::AdjustStockRequest;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct TransactionListParams {
    pub product_id: Option<Uuid>,
}

/// Apply a manual stock adjustment
async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    ActorId(actor_id): ActorId,
    Json(request): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .services
        .inventory
        .adjust_stock(request, actor_id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(response))
}

/// List products at or below their minimum stock level
async fn get_low_stock_products(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .inventory
        .get_low_stock_products()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// List inventory transactions, newest first
async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state
        .services
        .inventory
        .get_transactions(params.product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(transactions))
}

/// Inventory routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/adjustments", post(adjust_stock))
        .route("/low-stock", get(get_low_stock_products))
        .route("/transactions", get(get_transactions))
}
