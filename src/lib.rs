//! estoque-api library
//!
//! Inventory and sales management backend: products, customers, sale
//! transactions with transactional stock decrement, derived reports, and
//! CSV bulk tooling, behind session-gated routes.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{extract::FromRef, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::{
    bulk::BulkService, customers::CustomerService, products::ProductService,
    reports::ReportService, sales::SaleService,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<auth::AuthService>,
    pub products: ProductService,
    pub customers: CustomerService,
    pub sales: SaleService,
    pub reports: ReportService,
    pub bulk: BulkService,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let auth = Arc::new(auth::AuthService::new(db.clone(), config.session_ttl_secs));
        Self {
            products: ProductService::new(db.clone()),
            customers: CustomerService::new(db.clone()),
            sales: SaleService::new(db.clone()),
            reports: ReportService::new(db.clone()),
            bulk: BulkService::new(db.clone()),
            auth,
            db,
            config,
        }
    }
}

impl FromRef<AppState> for Arc<auth::AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Full API router; business areas nest under their own prefixes and every
/// non-auth route requires a session.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/customers", handlers::customers::customer_routes())
        .nest("/sales", handlers::sales::sale_routes())
        .nest("/reports", handlers::reports::report_routes())
        .nest("/bulk", handlers::bulk::bulk_routes())
}
