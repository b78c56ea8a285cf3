pub mod bulk;
pub mod customers;
pub mod products;
pub mod reports;
pub mod sales;
