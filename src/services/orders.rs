use crate::{
    db::DbPool,
    entities::customer::Entity as CustomerEntity,
    entities::inventory_transaction::TransactionType,
    entities::order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus},
    entities::order_item::{self, Model as OrderItemModel},
    entities::order_sequence::{self, Entity as OrderSequenceEntity},
    entities::product::Entity as ProductEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::InventoryService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument, warn};
use uuid::Uuid;

const ORDER_SEQUENCE_ROW_ID: i32 = 1;

/// One requested line item. The unit price is supplied by the caller and
/// captured on the line; it is not re-read from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub discount_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Partial update; omitted fields are left untouched. `total_amount` is
/// never recomputed after creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub discount_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderModel>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for order capture and lifecycle updates.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order with its line items and the matching stock effects.
    ///
    /// Validation runs fully before the first write. The order row, every
    /// line item, every stock decrement, and every audit transaction commit
    /// as a single unit; a failure at any point (including a stock race
    /// detected on the last item) leaves no trace.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, items = request.items.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        actor_id: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        Self::validate_create_request(&request)?;

        let discount_amount = request.discount_amount.unwrap_or(Decimal::ZERO);
        let tax_amount = request.tax_amount.unwrap_or(Decimal::ZERO);

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let outcome = Self::create_order_in_txn(
            &txn,
            &request,
            discount_amount,
            tax_amount,
            actor_id,
        )
        .await;

        let created = match outcome {
            Ok(created) => created,
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(error = %rollback_err, "Failed to roll back order creation");
                }
                return Err(e);
            }
        };

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::OrderCreated(created.order.id)).await {
                warn!(error = %e, "Failed to send order created event");
            }
        }

        Ok(created)
    }

    async fn create_order_in_txn(
        txn: &DatabaseTransaction,
        request: &CreateOrderRequest,
        discount_amount: Decimal,
        tax_amount: Decimal,
        actor_id: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        // Existence checks before any write.
        CustomerEntity::find_by_id(request.customer_id)
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Customer with id {} not found",
                    request.customer_id
                ))
            })?;

        for item in &request.items {
            let product = ProductEntity::find_by_id(item.product_id)
                .one(txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Product with id {} not found",
                        item.product_id
                    ))
                })?;

            if product.stock_quantity < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for product '{}'. Available: {}, Requested: {}",
                    product.name, product.stock_quantity, item.quantity
                )));
            }
        }

        let order_number = Self::next_order_number(txn).await?;

        let items_total: Decimal = request
            .items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();
        let total_amount = items_total + tax_amount - discount_amount;

        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            customer_id: Set(request.customer_id),
            user_id: Set(actor_id),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            total_amount: Set(total_amount),
            discount_amount: Set(discount_amount),
            tax_amount: Set(tax_amount),
            notes: Set(request.notes.clone()),
            order_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let total_price = item.unit_price * Decimal::from(item.quantity);

            let line = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                total_price: Set(total_price),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

            InventoryService::apply_stock_delta(
                txn,
                item.product_id,
                -item.quantity,
                TransactionType::Sale,
                Some(format!("Sale from order {}", order_number)),
                actor_id,
                Some((order_id, "order")),
            )
            .await?;

            items.push(line);
        }

        Ok(OrderWithItems { order, items })
    }

    /// Allocates the next order number by atomically incrementing the
    /// single sequence row inside the caller's transaction. Concurrent
    /// creations serialize on this row, so no two orders can observe the
    /// same value.
    async fn next_order_number(txn: &DatabaseTransaction) -> Result<String, ServiceError> {
        let result = OrderSequenceEntity::update_many()
            .col_expr(
                order_sequence::Column::LastValue,
                Expr::col(order_sequence::Column::LastValue).add(1),
            )
            .filter(order_sequence::Column::Id.eq(ORDER_SEQUENCE_ROW_ID))
            .exec(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::InternalError(
                "Order number sequence row is missing".to_string(),
            ));
        }

        let sequence = OrderSequenceEntity::find_by_id(ORDER_SEQUENCE_ROW_ID)
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError("Order number sequence row is missing".to_string())
            })?;

        Ok(format!("ORD-{:03}", sequence.last_value))
    }

    fn validate_create_request(request: &CreateOrderRequest) -> Result<(), ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }

        for item in &request.items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Item quantity must be a positive integer".to_string(),
                ));
            }
            if item.unit_price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Item unit price must be positive".to_string(),
                ));
            }
        }

        if let Some(discount) = request.discount_amount {
            if discount < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Discount amount must not be negative".to_string(),
                ));
            }
        }
        if let Some(tax) = request.tax_amount {
            if tax < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Tax amount must not be negative".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Applies a partial update to an order. Status changes are restricted
    /// to forward lifecycle transitions; nothing here recomputes the total
    /// or touches stock.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;

        let existing = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with id {} not found", order_id))
            })?;

        let old_status = existing.status.clone();
        let mut status_change: Option<(String, String)> = None;

        let mut active: order::ActiveModel = existing.into();

        if let Some(requested) = &request.status {
            let current = OrderStatus::from_str(&old_status).ok_or_else(|| {
                ServiceError::InternalError(format!("Order has unknown status '{}'", old_status))
            })?;
            let next = OrderStatus::from_str(requested).ok_or_else(|| {
                ServiceError::InvalidInput(format!("Unknown order status '{}'", requested))
            })?;

            if next != current {
                if !current.can_transition_to(next) {
                    return Err(ServiceError::InvalidTransition(format!(
                        "Cannot transition order from '{}' to '{}'",
                        current.as_str(),
                        next.as_str()
                    )));
                }
                active.status = Set(next.as_str().to_string());
                status_change = Some((old_status.clone(), next.as_str().to_string()));
            }
        }

        if let Some(discount) = request.discount_amount {
            if discount < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Discount amount must not be negative".to_string(),
                ));
            }
            active.discount_amount = Set(discount);
        }
        if let Some(tax) = request.tax_amount {
            if tax < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Tax amount must not be negative".to_string(),
                ));
            }
            active.tax_amount = Set(tax);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }

        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        if let (Some(sender), Some((old, new))) = (&self.event_sender, status_change) {
            let event = Event::OrderStatusChanged {
                order_id,
                old_status: old,
                new_status: new,
            };
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send order status changed event");
            }
        }

        Ok(updated)
    }

    /// Fetches one order together with its line items.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let db = &*self.db_pool;

        let mut results = OrderEntity::find_by_id(order_id)
            .find_with_related(order_item::Entity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        match results.pop() {
            Some((order, items)) => Ok(OrderWithItems { order, items }),
            None => Err(ServiceError::NotFound(format!(
                "Order with id {} not found",
                order_id
            ))),
        }
    }

    /// Lists orders, newest first, with offset pagination.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let paginator = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let orders = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }
}
