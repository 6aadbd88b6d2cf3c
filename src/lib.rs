/*!
Salespoint API: a sales-management backend for small retail operations.

The core is the order-and-inventory consistency engine: order capture,
stock adjustment with an append-only audit trail, and the reporting
queries that read from the same data. Every multi-row mutation runs in a
single database transaction, so stock levels, line items, and audit rows
always move together.
*/

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{routing::get, Json, Router};
use std::sync::Arc;

/// Shared application state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Health check: verifies the database connection is live.
async fn health(
    state: axum::extract::State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, errors::ServiceError> {
    db::check_connection(&state.db).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// Builds the versioned API router. State is applied by the caller.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/orders", handlers::orders::routes())
        .nest("/inventory", handlers::inventory::routes())
        .nest("/reports", handlers::reports::routes())
}

/// Full application router including the health endpoint.
pub fn app_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes())
}
