mod common;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use salespoint_api::{
    db::DbPool,
    entities::order,
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderItemInput},
    services::reports::SalesReportQuery,
};
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

fn day(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
}

fn at_noon(date: &str) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day(date).and_hms_opt(12, 0, 0).unwrap())
}

// Whole calendar days: inclusive start midnight, exclusive next midnight.
fn window(start: &str, end: &str) -> SalesReportQuery {
    SalesReportQuery {
        start_date: Utc.from_utc_datetime(&day(start).and_hms_opt(0, 0, 0).unwrap()),
        end_date: Utc.from_utc_datetime(&day(end).succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap()),
        customer_id: None,
        product_id: None,
    }
}

async fn place_order(
    db: &Arc<DbPool>,
    service: &salespoint_api::services::OrderService,
    customer_id: Uuid,
    items: Vec<OrderItemInput>,
    order_date: DateTime<Utc>,
) -> order::Model {
    let created = service
        .create_order(
            CreateOrderRequest {
                customer_id,
                items,
                discount_amount: None,
                tax_amount: None,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

    // Pin the order date so the daily series is deterministic.
    let mut active: order::ActiveModel = created.order.into();
    active.order_date = Set(order_date);
    active.update(db.as_ref()).await.unwrap()
}

#[tokio::test]
async fn report_totals_and_average_over_two_orders() {
    let db = common::setup_db().await;
    let orders = common::order_service(&db);
    let reports = common::report_service(&db);

    let customer = common::seed_customer(&db, "Annie Easley").await;
    let pen = common::seed_product(&db, "Pen", "PEN-001", dec!(39.99), 100, 5).await;
    let notebook = common::seed_product(&db, "Notebook", "NOTE-001", dec!(49.99), 100, 5).await;

    // 2 x 39.99 = 79.98
    place_order(
        &db,
        &orders,
        customer.id,
        vec![OrderItemInput {
            product_id: pen.id,
            quantity: 2,
            unit_price: dec!(39.99),
        }],
        at_noon("2026-03-02"),
    )
    .await;

    // 3 x 49.99 = 149.97
    place_order(
        &db,
        &orders,
        customer.id,
        vec![OrderItemInput {
            product_id: notebook.id,
            quantity: 3,
            unit_price: dec!(49.99),
        }],
        at_noon("2026-03-03"),
    )
    .await;

    let report = reports
        .generate_sales_report(window("2026-03-01", "2026-03-31"))
        .await
        .unwrap();

    assert_eq!(report.total_sales, dec!(229.95));
    assert_eq!(report.total_orders, 2);
    assert_eq!(report.total_quantity_sold, 5);
    assert_eq!(report.average_order_value, dec!(114.975));

    // Top products descending by revenue.
    assert_eq!(report.top_products.len(), 2);
    assert_eq!(report.top_products[0].product_id, notebook.id);
    assert_eq!(report.top_products[0].product_name, "Notebook");
    assert_eq!(report.top_products[0].total_revenue, dec!(149.97));
    assert_eq!(report.top_products[0].quantity_sold, 3);
    assert_eq!(report.top_products[1].product_id, pen.id);
    assert_eq!(report.top_products[1].total_revenue, dec!(79.98));

    // Daily series ascending by date.
    assert_eq!(report.sales_by_day.len(), 2);
    assert_eq!(report.sales_by_day[0].date, day("2026-03-02"));
    assert_eq!(report.sales_by_day[0].total_sales, dec!(79.98));
    assert_eq!(report.sales_by_day[0].order_count, 1);
    assert_eq!(report.sales_by_day[1].date, day("2026-03-03"));
    assert_eq!(report.sales_by_day[1].total_sales, dec!(149.97));
}

#[tokio::test]
async fn orders_on_the_same_day_are_grouped() {
    let db = common::setup_db().await;
    let orders = common::order_service(&db);
    let reports = common::report_service(&db);

    let customer = common::seed_customer(&db, "Mary Jackson").await;
    let mug = common::seed_product(&db, "Mug", "MUG-001", dec!(8.00), 100, 5).await;

    for qty in [1, 2] {
        place_order(
            &db,
            &orders,
            customer.id,
            vec![OrderItemInput {
                product_id: mug.id,
                quantity: qty,
                unit_price: dec!(8.00),
            }],
            at_noon("2026-04-10"),
        )
        .await;
    }

    let report = reports
        .generate_sales_report(window("2026-04-10", "2026-04-10"))
        .await
        .unwrap();

    assert_eq!(report.total_orders, 2);
    assert_eq!(report.sales_by_day.len(), 1);
    assert_eq!(report.sales_by_day[0].order_count, 2);
    assert_eq!(report.sales_by_day[0].total_sales, dec!(24.00));
}

#[tokio::test]
async fn orders_in_the_final_second_of_the_window_are_included() {
    let db = common::setup_db().await;
    let orders = common::order_service(&db);
    let reports = common::report_service(&db);

    let customer = common::seed_customer(&db, "Hedy Lamarr").await;
    let clock = common::seed_product(&db, "Clock", "CLK-001", dec!(30.00), 100, 5).await;

    // 500ms before the next day: still part of the end day.
    let late = Utc.from_utc_datetime(
        &day("2026-07-31")
            .and_hms_milli_opt(23, 59, 59, 500)
            .unwrap(),
    );
    place_order(
        &db,
        &orders,
        customer.id,
        vec![OrderItemInput {
            product_id: clock.id,
            quantity: 1,
            unit_price: dec!(30.00),
        }],
        late,
    )
    .await;

    let report = reports
        .generate_sales_report(window("2026-07-01", "2026-07-31"))
        .await
        .unwrap();
    assert_eq!(report.total_orders, 1);
    assert_eq!(report.total_sales, dec!(30.00));
    assert_eq!(report.sales_by_day[0].date, day("2026-07-31"));

    // The exclusive bound keeps the next day out.
    let report = reports
        .generate_sales_report(window("2026-07-01", "2026-07-30"))
        .await
        .unwrap();
    assert_eq!(report.total_orders, 0);
}

#[tokio::test]
async fn customer_filter_narrows_every_figure() {
    let db = common::setup_db().await;
    let orders = common::order_service(&db);
    let reports = common::report_service(&db);

    let alice = common::seed_customer(&db, "Alice").await;
    let bob = common::seed_customer(&db, "Bob").await;
    let book = common::seed_product(&db, "Book", "BOOK-001", dec!(10.00), 100, 5).await;

    place_order(
        &db,
        &orders,
        alice.id,
        vec![OrderItemInput {
            product_id: book.id,
            quantity: 1,
            unit_price: dec!(10.00),
        }],
        at_noon("2026-05-01"),
    )
    .await;
    place_order(
        &db,
        &orders,
        bob.id,
        vec![OrderItemInput {
            product_id: book.id,
            quantity: 4,
            unit_price: dec!(10.00),
        }],
        at_noon("2026-05-02"),
    )
    .await;

    let mut query = window("2026-05-01", "2026-05-31");
    query.customer_id = Some(alice.id);
    let report = reports.generate_sales_report(query).await.unwrap();

    assert_eq!(report.total_orders, 1);
    assert_eq!(report.total_sales, dec!(10.00));
    assert_eq!(report.total_quantity_sold, 1);
    assert_eq!(report.sales_by_day.len(), 1);
}

#[tokio::test]
async fn product_filter_narrows_quantity_and_ranking_only() {
    let db = common::setup_db().await;
    let orders = common::order_service(&db);
    let reports = common::report_service(&db);

    let customer = common::seed_customer(&db, "Dana").await;
    let apple = common::seed_product(&db, "Apple", "APL-001", dec!(1.00), 100, 5).await;
    let pear = common::seed_product(&db, "Pear", "PEAR-001", dec!(2.00), 100, 5).await;

    place_order(
        &db,
        &orders,
        customer.id,
        vec![
            OrderItemInput {
                product_id: apple.id,
                quantity: 6,
                unit_price: dec!(1.00),
            },
            OrderItemInput {
                product_id: pear.id,
                quantity: 3,
                unit_price: dec!(2.00),
            },
        ],
        at_noon("2026-06-15"),
    )
    .await;

    let mut query = window("2026-06-01", "2026-06-30");
    query.product_id = Some(pear.id);
    let report = reports.generate_sales_report(query).await.unwrap();

    // Order-level figures stay untouched by the product filter.
    assert_eq!(report.total_orders, 1);
    assert_eq!(report.total_sales, dec!(12.00));
    assert_eq!(report.sales_by_day.len(), 1);

    // Item-level figures are narrowed.
    assert_eq!(report.total_quantity_sold, 3);
    assert_eq!(report.top_products.len(), 1);
    assert_eq!(report.top_products[0].product_id, pear.id);
}

#[tokio::test]
async fn empty_window_yields_zeroes() {
    let db = common::setup_db().await;
    let reports = common::report_service(&db);

    let report = reports
        .generate_sales_report(window("2020-01-01", "2020-01-31"))
        .await
        .unwrap();

    assert_eq!(report.total_sales, Decimal::ZERO);
    assert_eq!(report.total_orders, 0);
    assert_eq!(report.total_quantity_sold, 0);
    assert_eq!(report.average_order_value, Decimal::ZERO);
    assert!(report.top_products.is_empty());
    assert!(report.sales_by_day.is_empty());

    let err = reports
        .generate_sales_report(window("2020-02-01", "2020-01-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}
