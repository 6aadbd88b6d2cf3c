use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity},
    entities::order_item,
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const TOP_PRODUCTS_LIMIT: usize = 10;

/// Query window and optional filters for a sales report.
///
/// `start_date` is inclusive and `end_date` exclusive, so a calendar day
/// is covered by `[day 00:00, next day 00:00)` with no sub-second hole.
///
/// The customer filter narrows every figure in the report. The product
/// filter narrows only the quantity-sold total and the product ranking;
/// order-level figures (total sales, order count, daily series) are not
/// affected by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReportQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_sold: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total_sales: Decimal,
    pub order_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SalesReport {
    pub total_sales: Decimal,
    pub total_orders: u64,
    pub total_quantity_sold: i64,
    pub average_order_value: Decimal,
    pub top_products: Vec<TopProduct>,
    pub sales_by_day: Vec<DailySales>,
}

/// Read-only sales aggregation over orders and line items.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Builds a sales report for the given window. An empty window yields
    /// zeroed totals and empty series.
    #[instrument(skip(self), fields(start = %query.start_date, end = %query.end_date))]
    pub async fn generate_sales_report(
        &self,
        query: SalesReportQuery,
    ) -> Result<SalesReport, ServiceError> {
        if query.end_date < query.start_date {
            return Err(ServiceError::InvalidInput(
                "Report end date must not precede start date".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let mut orders_query = OrderEntity::find()
            .filter(order::Column::OrderDate.gte(query.start_date))
            .filter(order::Column::OrderDate.lt(query.end_date));

        if let Some(customer_id) = query.customer_id {
            orders_query = orders_query.filter(order::Column::CustomerId.eq(customer_id));
        }

        let orders_with_items = orders_query
            .find_with_related(order_item::Entity)
            .order_by_asc(order::Column::OrderDate)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let total_orders = orders_with_items.len() as u64;
        let mut total_sales = Decimal::ZERO;
        let mut total_quantity_sold: i64 = 0;
        let mut daily: BTreeMap<NaiveDate, (Decimal, u64)> = BTreeMap::new();
        let mut per_product: HashMap<Uuid, (i64, Decimal)> = HashMap::new();

        for (order, items) in &orders_with_items {
            total_sales += order.total_amount;

            let day = daily
                .entry(order.order_date.date_naive())
                .or_insert((Decimal::ZERO, 0));
            day.0 += order.total_amount;
            day.1 += 1;

            for item in items {
                if let Some(product_id) = query.product_id {
                    if item.product_id != product_id {
                        continue;
                    }
                }

                total_quantity_sold += i64::from(item.quantity);
                let entry = per_product
                    .entry(item.product_id)
                    .or_insert((0, Decimal::ZERO));
                entry.0 += i64::from(item.quantity);
                entry.1 += item.total_price;
            }
        }

        let average_order_value = if total_orders > 0 {
            total_sales / Decimal::from(total_orders)
        } else {
            Decimal::ZERO
        };

        let top_products = Self::rank_products(db, per_product).await?;

        let sales_by_day = daily
            .into_iter()
            .map(|(date, (total, count))| DailySales {
                date,
                total_sales: total,
                order_count: count,
            })
            .collect();

        Ok(SalesReport {
            total_sales,
            total_orders,
            total_quantity_sold,
            average_order_value,
            top_products,
            sales_by_day,
        })
    }

    /// Ranks products by summed revenue, descending, ties broken by
    /// product id for a stable order, truncated to the top ten.
    async fn rank_products(
        db: &DbPool,
        per_product: HashMap<Uuid, (i64, Decimal)>,
    ) -> Result<Vec<TopProduct>, ServiceError> {
        if per_product.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<Uuid> = per_product.keys().copied().collect();
        let names: HashMap<Uuid, String> = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let mut ranked: Vec<TopProduct> = per_product
            .into_iter()
            .map(|(product_id, (quantity_sold, total_revenue))| TopProduct {
                product_id,
                product_name: names.get(&product_id).cloned().unwrap_or_default(),
                quantity_sold,
                total_revenue,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.total_revenue
                .cmp(&a.total_revenue)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(TOP_PRODUCTS_LIMIT);

        Ok(ranked)
    }
}
