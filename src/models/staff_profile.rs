use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::status::{LifecycleStatus, StaffRole};

/// A staff member. `id` is the identity provider's user id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub staff_id: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub name: Option<String>,
    pub contact: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,
    pub role: Option<StaffRole>,
    pub license_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: LifecycleStatus,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_driver(&self) -> bool {
        self.role == Some(StaffRole::Driver)
    }

    /// First letters of the name and role, upper-cased (e.g. "JD" for a Driver named Juan).
    pub fn initials(&self) -> String {
        let first = |s: &str| {
            s.trim()
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_default()
        };
        let name = self.name.as_deref().map(first).unwrap_or_default();
        let role = self
            .role
            .map(|r| first(&r.to_string()))
            .unwrap_or_default();
        format!("{}{}", name, role)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
