mod common;

use rust_decimal_macros::dec;
use salespoint_api::{
    entities::inventory_transaction::{self, Entity as InventoryTransaction},
    entities::product::Entity as Product,
    errors::ServiceError,
    services::inventory::AdjustStockRequest,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

fn adjust(product_id: Uuid, quantity: i32, transaction_type: &str) -> AdjustStockRequest {
    AdjustStockRequest {
        product_id,
        quantity,
        transaction_type: transaction_type.to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn low_stock_appears_after_adjustment_and_insufficient_stock_is_rejected() {
    let db = common::setup_db().await;
    let service = common::inventory_service(&db);
    let actor = Uuid::new_v4();

    let product = common::seed_product(&db, "Widget", "WIDGET-001", dec!(9.99), 100, 10).await;

    // Well above the minimum level: not in the low-stock list.
    let low = service.get_low_stock_products().await.unwrap();
    assert!(low.is_empty());

    // Draw stock down to 5.
    let response = service
        .adjust_stock(adjust(product.id, -95, "adjustment"), actor)
        .await
        .unwrap();
    assert_eq!(response.new_quantity, 5);

    let low = service.get_low_stock_products().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, product.id);
    assert_eq!(low[0].stock_quantity, 5);

    // A further -10 would go negative: rejected, stock untouched.
    let err = service
        .adjust_stock(adjust(product.id, -10, "adjustment"), actor)
        .await
        .unwrap_err();
    match err {
        ServiceError::InsufficientStock(msg) => {
            assert!(msg.contains("Widget"));
            assert!(msg.contains('5'));
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    let stored = Product::find_by_id(product.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock_quantity, 5);

    // Only the successful adjustment left an audit row.
    let transactions = service.get_transactions(Some(product.id)).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].quantity, -95);
}

#[tokio::test]
async fn adjustment_writes_one_matching_audit_row() {
    let db = common::setup_db().await;
    let service = common::inventory_service(&db);
    let actor = Uuid::new_v4();

    let product = common::seed_product(&db, "Gadget", "GADGET-001", dec!(24.50), 10, 2).await;

    let mut request = adjust(product.id, 20, "purchase");
    request.notes = Some("Restock delivery".to_string());
    let response = service.adjust_stock(request, actor).await.unwrap();

    assert_eq!(response.new_quantity, 30);
    let transaction = &response.transaction;
    assert_eq!(transaction.product_id, product.id);
    assert_eq!(transaction.quantity, 20);
    assert_eq!(transaction.transaction_type, "purchase");
    assert_eq!(transaction.reference_id, None);
    assert_eq!(transaction.reference_type, None);
    assert_eq!(transaction.notes.as_deref(), Some("Restock delivery"));
    assert_eq!(transaction.created_by, actor);
}

#[tokio::test]
async fn ledger_reconciles_with_stock_quantity() {
    let db = common::setup_db().await;
    let service = common::inventory_service(&db);
    let actor = Uuid::new_v4();

    let initial = 50;
    let product =
        common::seed_product(&db, "Thingamajig", "THING-001", dec!(5.00), initial, 5).await;

    for (delta, kind) in [(30, "purchase"), (-12, "adjustment"), (4, "return")] {
        service
            .adjust_stock(adjust(product.id, delta, kind), actor)
            .await
            .unwrap();
    }

    let stored = Product::find_by_id(product.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();

    let ledger_sum: i32 = InventoryTransaction::find()
        .filter(inventory_transaction::Column::ProductId.eq(product.id))
        .all(db.as_ref())
        .await
        .unwrap()
        .iter()
        .map(|t| t.quantity)
        .sum();

    assert_eq!(initial + ledger_sum, stored.stock_quantity);
    assert_eq!(stored.stock_quantity, 72);
}

#[tokio::test]
async fn sale_type_and_zero_delta_are_rejected() {
    let db = common::setup_db().await;
    let service = common::inventory_service(&db);
    let actor = Uuid::new_v4();

    let product = common::seed_product(&db, "Doohickey", "DOO-001", dec!(3.25), 10, 2).await;

    let err = service
        .adjust_stock(adjust(product.id, -1, "sale"), actor)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let err = service
        .adjust_stock(adjust(product.id, 0, "adjustment"), actor)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let err = service
        .adjust_stock(adjust(product.id, 1, "transfer"), actor)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    // None of the rejected requests left any trace.
    let transactions = service.get_transactions(Some(product.id)).await.unwrap();
    assert!(transactions.is_empty());
}

#[tokio::test]
async fn adjusting_unknown_product_is_not_found() {
    let db = common::setup_db().await;
    let service = common::inventory_service(&db);

    let err = service
        .adjust_stock(adjust(Uuid::new_v4(), 5, "purchase"), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn transactions_are_newest_first_and_filterable() {
    let db = common::setup_db().await;
    let service = common::inventory_service(&db);
    let actor = Uuid::new_v4();

    let first = common::seed_product(&db, "Alpha", "ALPHA-001", dec!(1.00), 10, 1).await;
    let second = common::seed_product(&db, "Beta", "BETA-001", dec!(2.00), 10, 1).await;

    service
        .adjust_stock(adjust(first.id, 5, "purchase"), actor)
        .await
        .unwrap();
    service
        .adjust_stock(adjust(second.id, 3, "purchase"), actor)
        .await
        .unwrap();
    service
        .adjust_stock(adjust(first.id, -2, "adjustment"), actor)
        .await
        .unwrap();

    let all = service.get_transactions(None).await.unwrap();
    assert_eq!(all.len(), 3);
    for pair in all.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }

    let only_first = service.get_transactions(Some(first.id)).await.unwrap();
    assert_eq!(only_first.len(), 2);
    assert!(only_first.iter().all(|t| t.product_id == first.id));

    // Reads are idempotent.
    let again = service.get_transactions(Some(first.id)).await.unwrap();
    assert_eq!(only_first, again);
}
