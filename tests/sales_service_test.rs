mod common;

use estoque_api::entities::{product, sale};
use estoque_api::errors::ServiceError;
use estoque_api::services::products::ProductService;
use estoque_api::services::sales::{CreateSaleInput, SaleService};
use sea_orm::EntityTrait;

#[tokio::test]
async fn sale_decrements_stock_and_snapshots_total() {
    let db = common::setup_db().await;
    let widget = common::seed_product(&db, "Widget", 10, 5.0, None).await;

    let svc = SaleService::new(db.clone());
    let sale = svc
        .create_sale(CreateSaleInput {
            product_id: widget.id,
            customer_id: None,
            quantity: 3,
        })
        .await
        .expect("sale should succeed");

    assert_eq!(sale.total_value, 15.0);
    assert_eq!(sale.quantity, 3);

    let stored = product::Entity::find_by_id(widget.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity, 7);
}

#[tokio::test]
async fn insufficient_stock_is_rejected_without_mutation() {
    let db = common::setup_db().await;
    let widget = common::seed_product(&db, "Widget", 2, 5.0, None).await;

    let svc = SaleService::new(db.clone());
    let err = svc
        .create_sale(CreateSaleInput {
            product_id: widget.id,
            customer_id: None,
            quantity: 5,
        })
        .await
        .expect_err("sale must be rejected");

    match err {
        ServiceError::InsufficientStock { available } => assert_eq!(available, 2),
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    let stored = product::Entity::find_by_id(widget.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity, 2, "stock must be unchanged");

    let sale_count = sale::Entity::find().all(&*db).await.unwrap().len();
    assert_eq!(sale_count, 0, "no sale row may exist");
}

#[tokio::test]
async fn sale_total_is_not_recomputed_after_price_change() {
    let db = common::setup_db().await;
    let widget = common::seed_product(&db, "Widget", 10, 5.0, None).await;

    let sales = SaleService::new(db.clone());
    let products = ProductService::new(db.clone());

    let sale = sales
        .create_sale(CreateSaleInput {
            product_id: widget.id,
            customer_id: None,
            quantity: 2,
        })
        .await
        .unwrap();
    assert_eq!(sale.total_value, 10.0);

    products
        .update(
            widget.id,
            estoque_api::services::products::ProductInput {
                name: "Widget".to_string(),
                quantity: 8,
                price: 99.0,
                cost_price: None,
                expiry: None,
            },
        )
        .await
        .unwrap();

    let listed = sales.list_sales().await.unwrap();
    assert_eq!(listed[0].total_value, 10.0, "snapshot must survive repricing");
}

#[tokio::test]
async fn sales_list_newest_first() {
    let db = common::setup_db().await;
    let widget = common::seed_product(&db, "Widget", 10, 5.0, None).await;

    let svc = SaleService::new(db.clone());
    let first = svc
        .create_sale(CreateSaleInput {
            product_id: widget.id,
            customer_id: None,
            quantity: 1,
        })
        .await
        .unwrap();
    let second = svc
        .create_sale(CreateSaleInput {
            product_id: widget.id,
            customer_id: None,
            quantity: 2,
        })
        .await
        .unwrap();

    let listed = svc.list_sales().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[tokio::test]
async fn sale_for_unknown_product_is_not_found() {
    let db = common::setup_db().await;
    let svc = SaleService::new(db.clone());

    let err = svc
        .create_sale(CreateSaleInput {
            product_id: 999,
            customer_id: None,
            quantity: 1,
        })
        .await
        .expect_err("missing product must fail");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn dangling_references_resolve_to_sentinels() {
    let db = common::setup_db().await;
    let widget = common::seed_product(&db, "Widget", 10, 5.0, None).await;
    let customer = common::seed_customer(&db, "Maria").await;

    let sales = SaleService::new(db.clone());
    sales
        .create_sale(CreateSaleInput {
            product_id: widget.id,
            customer_id: Some(customer.id),
            quantity: 1,
        })
        .await
        .unwrap();
    sales
        .create_sale(CreateSaleInput {
            product_id: widget.id,
            customer_id: None,
            quantity: 1,
        })
        .await
        .unwrap();

    // Deleting the product must succeed and leave the sale rows behind.
    ProductService::new(db.clone())
        .delete(widget.id)
        .await
        .unwrap();

    let listed = sales.list_sales().await.unwrap();
    assert_eq!(listed.len(), 2);
    for view in &listed {
        assert_eq!(view.product_name, "Removido");
    }
    // Newest first: the walk-in sale comes first.
    assert_eq!(listed[0].customer_name, "Balcão");
    assert_eq!(listed[1].customer_name, "Maria");
}
