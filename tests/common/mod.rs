#![allow(dead_code)]

use estoque_api::db::{self, DbConfig, DbPool};
use estoque_api::entities::{customer, product};
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;

/// In-memory SQLite pool with migrations applied. A single connection so
/// every query sees the same database.
pub async fn setup_db() -> Arc<DbPool> {
    let cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&cfg)
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    Arc::new(pool)
}

pub async fn seed_product(
    db: &DbPool,
    name: &str,
    quantity: i32,
    price: f64,
    cost_price: Option<f64>,
) -> product::Model {
    product::ActiveModel {
        name: Set(name.to_string()),
        quantity: Set(quantity),
        price: Set(price),
        cost_price: Set(cost_price),
        expiry: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert product")
}

pub async fn seed_customer(db: &DbPool, name: &str) -> customer::Model {
    customer::ActiveModel {
        name: Set(name.to_string()),
        phone: Set(None),
        email: Set(None),
        city: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert customer")
}
