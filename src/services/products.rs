use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::product::{self, Entity as Product},
    errors::ServiceError,
};

/// Fields accepted when creating or updating a product.
///
/// Values are stored as given: quantities and prices are not range-checked,
/// and an absent cost stays NULL rather than becoming zero.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub quantity: i32,
    pub price: f64,
    pub cost_price: Option<f64>,
    pub expiry: Option<String>,
}

/// CRUD over the product table.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(Product::find()
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        let created = product::ActiveModel {
            name: Set(input.name),
            quantity: Set(input.quantity),
            price: Set(input.price),
            cost_price: Set(input.cost_price),
            expiry: Set(input.expiry),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = created.id, "Product created: {}", created.name);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get(id).await?;

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.quantity = Set(input.quantity);
        active.price = Set(input.price);
        active.cost_price = Set(input.cost_price);
        active.expiry = Set(input.expiry);

        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a product. Historical sales referencing it are left in place
    /// and resolve to a sentinel name on display.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let res = Product::delete_by_id(id).exec(&*self.db).await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("product {} not found", id)));
        }
        info!(product_id = id, "Product deleted");
        Ok(())
    }
}
