use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order number sequence. A single row holds the last allocated numeric
/// suffix; it is incremented atomically inside the order-creation
/// transaction so concurrent creations serialize on the row instead of
/// racing on a read-then-write of the latest order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub last_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
