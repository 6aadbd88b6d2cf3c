#![allow(dead_code)]

use rust_decimal::Decimal;
use salespoint_api::{
    db::{self, DbConfig, DbPool},
    entities::{customer, product},
    events,
    services::{InventoryService, OrderService, ReportService},
};
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

/// Creates a private in-memory SQLite database with the full schema.
///
/// The pool is pinned to a single connection so the in-memory database is
/// not dropped and re-created between checkouts.
pub async fn setup_db() -> Arc<DbPool> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };

    let pool = db::establish_connection_with_config(&config)
        .await
        .expect("failed to create test database");

    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");

    Arc::new(pool)
}

/// Event sender whose events are consumed by a background logger task.
pub fn test_event_sender() -> Arc<events::EventSender> {
    let (sender, rx) = events::event_channel(64);
    tokio::spawn(events::process_events(rx));
    Arc::new(sender)
}

pub fn inventory_service(db: &Arc<DbPool>) -> InventoryService {
    InventoryService::new(db.clone(), Some(test_event_sender()))
}

pub fn order_service(db: &Arc<DbPool>) -> OrderService {
    OrderService::new(db.clone(), Some(test_event_sender()))
}

pub fn report_service(db: &Arc<DbPool>) -> ReportService {
    ReportService::new(db.clone())
}

pub async fn seed_customer(db: &DbPool, name: &str) -> customer::Model {
    customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(Some(format!(
            "{}@example.com",
            name.to_lowercase().replace(' ', ".")
        ))),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed customer")
}

pub async fn seed_product(
    db: &DbPool,
    name: &str,
    sku: &str,
    price: Decimal,
    stock_quantity: i32,
    min_stock_level: i32,
) -> product::Model {
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        sku: Set(sku.to_string()),
        price: Set(price),
        cost_price: Set(price / Decimal::from(2)),
        stock_quantity: Set(stock_quantity),
        min_stock_level: Set(min_stock_level),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed product")
}
