use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    entities::{
        product::{self, Entity as Product},
        sale::{self, Entity as Sale},
    },
    errors::ServiceError,
};

/// Products with fewer units than this are reported as low stock.
const LOW_STOCK_THRESHOLD: i32 = 5;

/// Label/value pairs for charting, in first-encounter order of the fold
/// that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries<T> {
    pub labels: Vec<String>,
    pub values: Vec<T>,
}

/// Aggregated figures over the full product and sale collections.
#[derive(Debug, Serialize)]
pub struct ReportOverview {
    pub total_revenue: f64,
    pub total_units_sold: i64,
    pub stock_value_at_cost: f64,
    pub stock_value_at_sale_price: f64,
    pub estimated_stock_profit: f64,
    pub sales_by_product: ChartSeries<i64>,
    pub daily_revenue: ChartSeries<f64>,
    pub low_stock: Vec<product::Model>,
}

/// Read-only aggregation; everything is recomputed from scratch per request.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<ReportOverview, ServiceError> {
        let products = Product::find()
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;
        let sales = Sale::find()
            .order_by_asc(sale::Column::Id)
            .all(&*self.db)
            .await?;

        let total_revenue: f64 = sales.iter().map(|s| s.total_value).sum();
        let total_units_sold: i64 = sales.iter().map(|s| s.quantity as i64).sum();

        let stock_value_at_cost: f64 = products
            .iter()
            .map(|p| p.cost_price.unwrap_or(0.0) * p.quantity as f64)
            .sum();
        let stock_value_at_sale_price: f64 =
            products.iter().map(|p| p.price * p.quantity as f64).sum();
        let estimated_stock_profit = stock_value_at_sale_price - stock_value_at_cost;

        let product_names: HashMap<i32, &str> =
            products.iter().map(|p| (p.id, p.name.as_str())).collect();

        // Units sold per product name; sales whose product was deleted are
        // skipped.
        let mut sales_by_product = SeriesBuilder::new();
        for s in &sales {
            if let Some(name) = product_names.get(&s.product_id) {
                sales_by_product.add(name, s.quantity as i64);
            }
        }

        // Revenue per day/month label. Labels carry no year, so sales from
        // different years with the same day and month share a bucket.
        let mut daily_revenue = SeriesBuilder::new();
        for s in &sales {
            let label = s.sold_at.format("%d/%m").to_string();
            daily_revenue.add(&label, s.total_value);
        }

        let low_stock = products
            .iter()
            .filter(|p| p.quantity < LOW_STOCK_THRESHOLD)
            .cloned()
            .collect();

        Ok(ReportOverview {
            total_revenue,
            total_units_sold,
            stock_value_at_cost,
            stock_value_at_sale_price,
            estimated_stock_profit,
            sales_by_product: sales_by_product.build(),
            daily_revenue: daily_revenue.build(),
            low_stock,
        })
    }
}

/// Accumulates values per label, remembering the order labels first
/// appeared.
struct SeriesBuilder<T> {
    labels: Vec<String>,
    values: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Default + Copy + std::ops::AddAssign> SeriesBuilder<T> {
    fn new() -> Self {
        Self {
            labels: Vec::new(),
            values: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, label: &str, value: T) {
        let slot = match self.index.get(label) {
            Some(&slot) => slot,
            None => {
                self.labels.push(label.to_string());
                self.values.push(T::default());
                self.index.insert(label.to_string(), self.labels.len() - 1);
                self.labels.len() - 1
            }
        };
        self.values[slot] += value;
    }

    fn build(self) -> ChartSeries<T> {
        ChartSeries {
            labels: self.labels,
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_builder_keeps_first_encounter_order() {
        let mut b = SeriesBuilder::new();
        b.add("Camiseta", 2i64);
        b.add("Caneca", 1);
        b.add("Camiseta", 3);
        let series = b.build();
        assert_eq!(series.labels, vec!["Camiseta", "Caneca"]);
        assert_eq!(series.values, vec![5, 1]);
    }
}
