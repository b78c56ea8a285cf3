pub mod auth;
pub mod bulk;
pub mod common;
pub mod customers;
pub mod products;
pub mod reports;
pub mod sales;
