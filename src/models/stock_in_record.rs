use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_in_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub stockin_id: String,
    pub item_id: String,
    pub quantity: i32,
    pub uom: String,
    pub supplier_id: String,
    pub stocked_by: Option<Uuid>,
    pub purchase_order_id: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub remarks: String,
    pub date_stocked: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::ItemId",
        to = "super::inventory_item::Column::ItemId",
        on_delete = "Cascade"
    )]
    InventoryItem,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::SupplierId",
        on_delete = "Cascade"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::staff_profile::Entity",
        from = "Column::StockedBy",
        to = "super::staff_profile::Column::Id",
        on_delete = "SetNull"
    )]
    StockedBy,
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItem.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::staff_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
