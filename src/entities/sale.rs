use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};

/// Sale entity
///
/// `total_value` is snapshotted at creation (`price * quantity` at that
/// instant) and never recomputed. The product and customer references carry
/// no FK constraints: historical sales survive deletion of either side and
/// readers resolve the ids defensively.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Server time at insert
    pub sold_at: DateTime<Utc>,

    /// Units sold
    pub quantity: i32,

    /// Unit price at time of sale multiplied by quantity
    pub total_value: f64,

    /// Required product reference
    pub product_id: i32,

    /// Optional customer reference; NULL means a walk-in sale
    pub customer_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.sold_at {
                active_model.sold_at = Set(Utc::now());
            }
        }

        Ok(active_model)
    }
}
