use crate::{
    db::DbPool,
    entities::inventory_transaction::{
        self, Entity as InventoryTransactionEntity, Model as InventoryTransactionModel,
        TransactionType,
    },
    entities::product::{self, Entity as ProductEntity, Model as ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument, warn};
use uuid::Uuid;

/// Request to apply a manual stock adjustment to a product.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdjustStockRequest {
    pub product_id: Uuid,
    /// Signed delta; positive increases stock, negative decreases it.
    pub quantity: i32,
    /// One of "purchase", "adjustment", "return". "sale" is reserved for
    /// order processing.
    pub transaction_type: String,
    pub notes: Option<String>,
}

/// Result of a stock adjustment: the audit row plus the resulting quantity.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdjustStockResponse {
    pub transaction: InventoryTransactionModel,
    pub new_quantity: i32,
}

/// Service for stock adjustments and inventory queries.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Applies a signed stock delta to one product and appends the matching
    /// audit transaction, inside the caller's transaction.
    ///
    /// This is the only code path that mutates `stock_quantity`. Decreases
    /// use a conditional update (`stock_quantity >= |delta|`) so a
    /// concurrent writer cannot drive the quantity negative; when the guard
    /// fails the caller's transaction rolls back untouched.
    pub(crate) async fn apply_stock_delta(
        txn: &DatabaseTransaction,
        product_id: Uuid,
        delta: i32,
        transaction_type: TransactionType,
        notes: Option<String>,
        actor_id: Uuid,
        reference: Option<(Uuid, &str)>,
    ) -> Result<(InventoryTransactionModel, i32), ServiceError> {
        let product = ProductEntity::find_by_id(product_id)
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with id {} not found", product_id))
            })?;

        let mut update = ProductEntity::update_many()
            .col_expr(
                product::Column::StockQuantity,
                Expr::col(product::Column::StockQuantity).add(delta),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id));

        if delta < 0 {
            update = update.filter(product::Column::StockQuantity.gte(-delta));
        }

        let result = update.exec(txn).await.map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            warn!(
                product_id = %product_id,
                available = product.stock_quantity,
                requested = -delta,
                "Stock adjustment rejected: insufficient stock"
            );
            return Err(ServiceError::InsufficientStock(format!(
                "Insufficient stock for product '{}'. Available: {}, Requested: {}",
                product.name,
                product.stock_quantity,
                -delta
            )));
        }

        let transaction = inventory_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            transaction_type: Set(transaction_type.as_str().to_string()),
            quantity: Set(delta),
            reference_id: Set(reference.map(|(id, _)| id)),
            reference_type: Set(reference.map(|(_, kind)| kind.to_string())),
            notes: Set(notes),
            created_by: Set(actor_id),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        let new_quantity = ProductEntity::find_by_id(product_id)
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .map(|p| p.stock_quantity)
            .unwrap_or(product.stock_quantity + delta);

        Ok((transaction, new_quantity))
    }

    /// Applies a manual stock adjustment requested by a user.
    ///
    /// Validation happens before any write; the stock update and the audit
    /// row commit together or not at all.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, delta = request.quantity))]
    pub async fn adjust_stock(
        &self,
        request: AdjustStockRequest,
        actor_id: Uuid,
    ) -> Result<AdjustStockResponse, ServiceError> {
        if request.quantity == 0 {
            return Err(ServiceError::InvalidInput(
                "Adjustment quantity must be non-zero".to_string(),
            ));
        }

        let transaction_type = TransactionType::from_str(&request.transaction_type)
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "Unknown transaction type '{}'",
                    request.transaction_type
                ))
            })?;

        if transaction_type == TransactionType::Sale {
            return Err(ServiceError::InvalidInput(
                "Transaction type 'sale' is reserved for order processing".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for stock adjustment");
            ServiceError::DatabaseError(e)
        })?;

        let (transaction, new_quantity) = Self::apply_stock_delta(
            &txn,
            request.product_id,
            request.quantity,
            transaction_type,
            request.notes,
            actor_id,
            None,
        )
        .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Some(sender) = &self.event_sender {
            let event = Event::StockAdjusted {
                product_id: request.product_id,
                quantity_delta: request.quantity,
                new_quantity,
                transaction_id: transaction.id,
            };
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send stock adjusted event");
            }
        }

        Ok(AdjustStockResponse {
            transaction,
            new_quantity,
        })
    }

    /// Returns all products whose stock has fallen to or below their
    /// configured minimum level.
    #[instrument(skip(self))]
    pub async fn get_low_stock_products(&self) -> Result<Vec<ProductModel>, ServiceError> {
        let db = &*self.db_pool;

        ProductEntity::find()
            .filter(
                Expr::col(product::Column::StockQuantity)
                    .lte(Expr::col(product::Column::MinStockLevel)),
            )
            .order_by_asc(product::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Returns inventory transactions, newest first, optionally restricted
    /// to one product.
    #[instrument(skip(self))]
    pub async fn get_transactions(
        &self,
        product_id: Option<Uuid>,
    ) -> Result<Vec<InventoryTransactionModel>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = InventoryTransactionEntity::find()
            .order_by_desc(inventory_transaction::Column::CreatedAt)
            .order_by_desc(inventory_transaction::Column::Id);

        if let Some(product_id) = product_id {
            query = query.filter(inventory_transaction::Column::ProductId.eq(product_id));
        }

        query.all(db).await.map_err(ServiceError::DatabaseError)
    }
}
