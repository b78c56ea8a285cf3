mod common;

use estoque_api::services::products::ProductService;
use estoque_api::services::reports::ReportService;
use estoque_api::services::sales::{CreateSaleInput, SaleService};

#[tokio::test]
async fn overview_totals_and_valuations() {
    let db = common::setup_db().await;
    let widget = common::seed_product(&db, "Widget", 10, 5.0, Some(2.0)).await;
    common::seed_product(&db, "Caneca", 4, 12.0, None).await;

    let sales = SaleService::new(db.clone());
    sales
        .create_sale(CreateSaleInput {
            product_id: widget.id,
            customer_id: None,
            quantity: 3,
        })
        .await
        .unwrap();

    let report = ReportService::new(db.clone()).overview().await.unwrap();

    assert_eq!(report.total_revenue, 15.0);
    assert_eq!(report.total_units_sold, 3);

    // Valuations use current stock: Widget is down to 7 units.
    assert_eq!(report.stock_value_at_cost, 2.0 * 7.0);
    assert_eq!(report.stock_value_at_sale_price, 5.0 * 7.0 + 12.0 * 4.0);
    assert_eq!(
        report.estimated_stock_profit,
        report.stock_value_at_sale_price - report.stock_value_at_cost
    );
}

#[tokio::test]
async fn low_stock_is_strictly_below_five() {
    let db = common::setup_db().await;
    common::seed_product(&db, "Zerado", 0, 1.0, None).await;
    common::seed_product(&db, "Quase", 4, 1.0, None).await;
    common::seed_product(&db, "NoLimite", 5, 1.0, None).await;
    common::seed_product(&db, "Sobrando", 50, 1.0, None).await;

    let report = ReportService::new(db.clone()).overview().await.unwrap();

    let names: Vec<&str> = report.low_stock.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Zerado", "Quase"]);
}

#[tokio::test]
async fn sales_by_product_keeps_first_encounter_order_and_skips_dangling() {
    let db = common::setup_db().await;
    let widget = common::seed_product(&db, "Widget", 10, 5.0, None).await;
    let caneca = common::seed_product(&db, "Caneca", 10, 12.0, None).await;
    let extinto = common::seed_product(&db, "Extinto", 10, 1.0, None).await;

    let sales = SaleService::new(db.clone());
    for (product_id, quantity) in [
        (extinto.id, 1),
        (widget.id, 2),
        (caneca.id, 1),
        (widget.id, 3),
    ] {
        sales
            .create_sale(CreateSaleInput {
                product_id,
                customer_id: None,
                quantity,
            })
            .await
            .unwrap();
    }

    ProductService::new(db.clone())
        .delete(extinto.id)
        .await
        .unwrap();

    let report = ReportService::new(db.clone()).overview().await.unwrap();

    assert_eq!(report.sales_by_product.labels, vec!["Widget", "Caneca"]);
    assert_eq!(report.sales_by_product.values, vec![5, 1]);
}

#[tokio::test]
async fn daily_revenue_buckets_by_day_month_label() {
    let db = common::setup_db().await;
    let widget = common::seed_product(&db, "Widget", 10, 5.0, None).await;

    let sales = SaleService::new(db.clone());
    for quantity in [1, 2] {
        sales
            .create_sale(CreateSaleInput {
                product_id: widget.id,
                customer_id: None,
                quantity,
            })
            .await
            .unwrap();
    }

    let report = ReportService::new(db.clone()).overview().await.unwrap();

    let today = chrono::Utc::now().format("%d/%m").to_string();
    assert_eq!(report.daily_revenue.labels, vec![today]);
    assert_eq!(report.daily_revenue.values, vec![15.0]);
}

#[tokio::test]
async fn empty_store_reports_zeroes() {
    let db = common::setup_db().await;

    let report = ReportService::new(db.clone()).overview().await.unwrap();

    assert_eq!(report.total_revenue, 0.0);
    assert_eq!(report.total_units_sold, 0);
    assert_eq!(report.estimated_stock_profit, 0.0);
    assert!(report.sales_by_product.labels.is_empty());
    assert!(report.daily_revenue.labels.is_empty());
    assert!(report.low_stock.is_empty());
}
