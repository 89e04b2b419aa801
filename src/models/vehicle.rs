use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::status::{VehicleStatus, VehicleType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub vehicle_id: String,
    #[sea_orm(unique)]
    pub plate_number: String,
    #[sea_orm(column_name = "model")]
    #[serde(rename = "model")]
    pub model_name: String,
    pub brand: String,
    pub year_manufactured: i32,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub status: VehicleStatus,
    pub date_acquired: NaiveDate,
    pub assigned_driver: Option<Uuid>,
    pub last_maintenance: Option<NaiveDate>,
    pub insurance_expiry: NaiveDate,
    pub registration_expiry: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::staff_profile::Entity",
        from = "Column::AssignedDriver",
        to = "super::staff_profile::Column::Id",
        on_delete = "SetNull"
    )]
    AssignedDriver,
}

impl Related<super::staff_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedDriver.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
