use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        customer::{self, Entity as Customer},
        product::{self, Entity as Product},
        sale::{self, Entity as Sale},
    },
    errors::ServiceError,
};

/// Display fallback for a sale whose product row was deleted.
pub const REMOVED_PRODUCT: &str = "Removido";
/// Display name for a sale with no customer (or a deleted one).
pub const WALK_IN_CUSTOMER: &str = "Balcão";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleInput {
    pub product_id: i32,
    pub customer_id: Option<i32>,
    pub quantity: i32,
}

/// Sale row with its references resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct SaleView {
    pub id: i32,
    pub sold_at: DateTime<Utc>,
    pub quantity: i32,
    pub total_value: f64,
    pub product_id: i32,
    pub product_name: String,
    pub customer_id: Option<i32>,
    pub customer_name: String,
}

/// Sale creation and listing.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DatabaseConnection>,
}

impl SaleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records a sale, decrementing product stock in the same transaction.
    ///
    /// The stock check runs against the row as read inside the transaction,
    /// so concurrent sales of the same product cannot jointly drive the
    /// quantity negative. The sale's total is `price * quantity` at this
    /// instant and is never recomputed afterwards. On any failure nothing is
    /// committed.
    #[instrument(skip(self))]
    pub async fn create_sale(&self, input: CreateSaleInput) -> Result<sale::Model, ServiceError> {
        let created = self
            .db
            .transaction::<_, sale::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let product = Product::find_by_id(input.product_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "product {} not found",
                                input.product_id
                            ))
                        })?;

                    if input.quantity > product.quantity {
                        return Err(ServiceError::InsufficientStock {
                            available: product.quantity,
                        });
                    }

                    let total_value = product.price * input.quantity as f64;

                    let mut active: product::ActiveModel = product.clone().into();
                    active.quantity = Set(product.quantity - input.quantity);
                    active.update(txn).await?;

                    let created = sale::ActiveModel {
                        quantity: Set(input.quantity),
                        total_value: Set(total_value),
                        product_id: Set(input.product_id),
                        customer_id: Set(input.customer_id),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(created)
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        info!(
            sale_id = created.id,
            product_id = created.product_id,
            quantity = created.quantity,
            "Sale recorded, total {}",
            created.total_value
        );
        Ok(created)
    }

    /// All sales, most recent first, with product and customer names
    /// resolved defensively.
    pub async fn list_sales(&self) -> Result<Vec<SaleView>, ServiceError> {
        let sales = Sale::find()
            .order_by_desc(sale::Column::SoldAt)
            .order_by_desc(sale::Column::Id)
            .all(&*self.db)
            .await?;

        let (products, customers) = reference_names(&self.db, &sales).await?;

        Ok(sales
            .into_iter()
            .map(|s| {
                let product_name = products
                    .get(&s.product_id)
                    .cloned()
                    .unwrap_or_else(|| REMOVED_PRODUCT.to_string());
                let customer_name = s
                    .customer_id
                    .and_then(|id| customers.get(&id).cloned())
                    .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string());
                SaleView {
                    id: s.id,
                    sold_at: s.sold_at,
                    quantity: s.quantity,
                    total_value: s.total_value,
                    product_id: s.product_id,
                    product_name,
                    customer_id: s.customer_id,
                    customer_name,
                }
            })
            .collect())
    }
}

/// Name lookup tables for the product/customer ids a set of sales
/// references. Dangling ids are simply absent.
pub(crate) async fn reference_names(
    db: &DatabaseConnection,
    sales: &[sale::Model],
) -> Result<(HashMap<i32, String>, HashMap<i32, String>), ServiceError> {
    let product_ids: Vec<i32> = sales.iter().map(|s| s.product_id).collect();
    let customer_ids: Vec<i32> = sales.iter().filter_map(|s| s.customer_id).collect();

    let products = Product::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let customers = Customer::find()
        .filter(customer::Column::Id.is_in(customer_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    Ok((products, customers))
}

pub(crate) fn unwrap_txn_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
