use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::customer::{self, Entity as Customer},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
}

/// CRUD over the customer table.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<customer::Model>, ServiceError> {
        Ok(Customer::find()
            .order_by_asc(customer::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CustomerInput) -> Result<customer::Model, ServiceError> {
        let created = customer::ActiveModel {
            name: Set(input.name),
            phone: Set(input.phone),
            email: Set(input.email),
            city: Set(input.city),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(customer_id = created.id, "Customer created: {}", created.name);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: CustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        let existing = self.get(id).await?;

        let mut active: customer::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.phone = Set(input.phone);
        active.email = Set(input.email);
        active.city = Set(input.city);

        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a customer. Sales referencing it fall back to the walk-in
    /// sentinel on display.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let res = Customer::delete_by_id(id).exec(&*self.db).await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("customer {} not found", id)));
        }
        info!(customer_id = id, "Customer deleted");
        Ok(())
    }
}
