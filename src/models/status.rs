//! Status vocabularies for every entity that carries one.
//!
//! Each enum stores its human label (e.g. `"In Transit"`) in the database,
//! serializes to the same label, and parses from it with `FromStr`. Parsing
//! through [`parse_status`] turns an unknown label into
//! [`ServiceError::InvalidStatus`] so a bad request never reaches storage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ServiceError;

/// Parses a status label, reporting unknown values as `InvalidStatus`.
pub fn parse_status<T: FromStr>(entity: &str, raw: &str) -> Result<T, ServiceError> {
    T::from_str(raw.trim()).map_err(|_| {
        ServiceError::InvalidStatus(format!("'{}' is not a valid {} status", raw, entity))
    })
}

/// Keeps an existing timestamp, otherwise stamps `now`.
pub fn stamp_once<T>(current: Option<T>, now: T) -> Option<T> {
    current.or(Some(now))
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PurchaseOrderStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Stocked")]
    Stocked,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Order Confirmed")]
    #[serde(rename = "Order Confirmed")]
    #[strum(serialize = "Order Confirmed")]
    OrderConfirmed,
    #[sea_orm(string_value = "Packed")]
    Packed,
    #[sea_orm(string_value = "In Transit")]
    #[serde(rename = "In Transit")]
    #[strum(serialize = "In Transit")]
    InTransit,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// Which order statuses the API accepts.
///
/// `Fulfillment` tracks an order through packing and delivery. `Confirmation`
/// is the older three-state flow where an order is only pending, confirmed or
/// cancelled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusVocabulary {
    #[default]
    Fulfillment,
    Confirmation,
}

impl OrderStatusVocabulary {
    pub fn accepts(self, status: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            Self::Fulfillment => matches!(status, Pending | Packed | InTransit | Delivered | Cancelled),
            Self::Confirmation => matches!(status, Pending | OrderConfirmed | Cancelled),
        }
    }

    /// Parses a label and checks it belongs to this vocabulary.
    pub fn parse(self, raw: &str) -> Result<OrderStatus, ServiceError> {
        let status: OrderStatus = parse_status("order", raw)?;
        if self.accepts(status) {
            Ok(status)
        } else {
            Err(ServiceError::InvalidStatus(format!(
                "'{}' is not a valid order status",
                raw
            )))
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Packed")]
    Packed,
    #[sea_orm(string_value = "In Transit")]
    #[serde(rename = "In Transit")]
    #[strum(serialize = "In Transit")]
    InTransit,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum VehicleStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Under Maintenance")]
    #[serde(rename = "Under Maintenance")]
    #[strum(serialize = "Under Maintenance")]
    UnderMaintenance,
    #[sea_orm(string_value = "Retired")]
    Retired,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum VehicleType {
    #[sea_orm(string_value = "Van")]
    Van,
    #[sea_orm(string_value = "Truck")]
    Truck,
    #[sea_orm(string_value = "Motorcycle")]
    Motorcycle,
}

/// Account state shared by staff and customer profiles. Deletion is logical.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum LifecycleStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Deactivated")]
    Deactivated,
    #[sea_orm(string_value = "Deleted")]
    Deleted,
}

impl LifecycleStatus {
    /// Deleted is terminal; every other move (including staying put) is allowed.
    pub fn can_transition_to(self, next: LifecycleStatus) -> bool {
        match (self, next) {
            (LifecycleStatus::Deleted, LifecycleStatus::Deleted) => true,
            (LifecycleStatus::Deleted, _) => false,
            _ => true,
        }
    }

    pub fn ensure_transition(self, next: LifecycleStatus) -> Result<(), ServiceError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ServiceError::InvalidOperation(format!(
                "cannot move a {} account to {}",
                self, next
            )))
        }
    }

    /// `(deactivated_at, deleted_at)` after moving into `self`; existing stamps are kept.
    pub fn stamps<T>(
        self,
        deactivated_at: Option<T>,
        deleted_at: Option<T>,
        now: T,
    ) -> (Option<T>, Option<T>) {
        match self {
            LifecycleStatus::Active => (deactivated_at, deleted_at),
            LifecycleStatus::Deactivated => (stamp_once(deactivated_at, now), deleted_at),
            LifecycleStatus::Deleted => (deactivated_at, stamp_once(deleted_at, now)),
        }
    }

    /// Error to report when an account in this state tries to authenticate.
    pub fn access_error(self) -> Option<ServiceError> {
        match self {
            LifecycleStatus::Active => None,
            LifecycleStatus::Deactivated => Some(ServiceError::AccountDeactivated),
            LifecycleStatus::Deleted => Some(ServiceError::AccountDeleted),
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
pub enum StaffRole {
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "Manager")]
    Manager,
    #[sea_orm(string_value = "Driver")]
    Driver,
    #[sea_orm(string_value = "Inventory Clerk")]
    #[serde(rename = "Inventory Clerk")]
    #[strum(serialize = "Inventory Clerk")]
    InventoryClerk,
    #[sea_orm(string_value = "Cashier")]
    Cashier,
    #[sea_orm(string_value = "Delivery Assistant")]
    #[serde(rename = "Delivery Assistant")]
    #[strum(serialize = "Delivery Assistant")]
    DeliveryAssistant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("Pending", OrderStatus::Pending)]
    #[case("Order Confirmed", OrderStatus::OrderConfirmed)]
    #[case("In Transit", OrderStatus::InTransit)]
    #[case(" Delivered ", OrderStatus::Delivered)]
    fn order_labels_parse(#[case] raw: &str, #[case] expected: OrderStatus) {
        let parsed: OrderStatus = parse_status("order", raw).unwrap();
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case("Shipped")]
    #[case("in transit")]
    #[case("")]
    fn unknown_delivery_labels_are_rejected(#[case] raw: &str) {
        let result: Result<DeliveryStatus, _> = parse_status("delivery", raw);
        assert_matches!(result, Err(ServiceError::InvalidStatus(_)));
    }

    #[rstest]
    #[case(OrderStatusVocabulary::Fulfillment, "Packed", true)]
    #[case(OrderStatusVocabulary::Fulfillment, "Order Confirmed", false)]
    #[case(OrderStatusVocabulary::Confirmation, "Order Confirmed", true)]
    #[case(OrderStatusVocabulary::Confirmation, "In Transit", false)]
    #[case(OrderStatusVocabulary::Confirmation, "Cancelled", true)]
    fn vocabulary_gates_order_statuses(
        #[case] vocabulary: OrderStatusVocabulary,
        #[case] raw: &str,
        #[case] accepted: bool,
    ) {
        assert_eq!(vocabulary.parse(raw).is_ok(), accepted);
    }

    #[test]
    fn labels_round_trip_through_display() {
        assert_eq!(VehicleStatus::UnderMaintenance.to_string(), "Under Maintenance");
        assert_eq!(StaffRole::InventoryClerk.to_string(), "Inventory Clerk");
        assert_eq!(
            serde_json::to_value(DeliveryStatus::InTransit).unwrap(),
            serde_json::json!("In Transit")
        );
    }

    #[rstest]
    #[case(LifecycleStatus::Active, LifecycleStatus::Deactivated, true)]
    #[case(LifecycleStatus::Deactivated, LifecycleStatus::Active, true)]
    #[case(LifecycleStatus::Active, LifecycleStatus::Deleted, true)]
    #[case(LifecycleStatus::Deactivated, LifecycleStatus::Deleted, true)]
    #[case(LifecycleStatus::Deleted, LifecycleStatus::Active, false)]
    #[case(LifecycleStatus::Deleted, LifecycleStatus::Deactivated, false)]
    fn lifecycle_table(
        #[case] from: LifecycleStatus,
        #[case] to: LifecycleStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn stamp_once_never_overwrites() {
        assert_eq!(stamp_once(None, 5), Some(5));
        assert_eq!(stamp_once(Some(1), 5), Some(1));
    }

    #[test]
    fn lifecycle_stamps_are_set_once() {
        assert_eq!(LifecycleStatus::Deactivated.stamps(None, None, 7), (Some(7), None));
        assert_eq!(LifecycleStatus::Deleted.stamps(Some(1), None, 7), (Some(1), Some(7)));
        assert_eq!(LifecycleStatus::Active.stamps(Some(1), None, 7), (Some(1), None));
        assert_eq!(LifecycleStatus::Deleted.stamps(None, Some(2), 7), (None, Some(2)));
    }

    #[test]
    fn access_errors_follow_status() {
        assert!(LifecycleStatus::Active.access_error().is_none());
        assert_matches!(
            LifecycleStatus::Deactivated.access_error(),
            Some(ServiceError::AccountDeactivated)
        );
        assert_matches!(
            LifecycleStatus::Deleted.access_error(),
            Some(ServiceError::AccountDeleted)
        );
    }
}
