use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::identifiers::{IdKind, IdentifierAllocator};
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        delivery, order, staff_profile,
        status::{parse_status, stamp_once, DeliveryStatus},
        vehicle,
    },
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateDelivery {
    #[serde(alias = "order")]
    #[validate(length(min = 1))]
    pub order_id: String,
    #[serde(alias = "driver")]
    pub driver_id: Option<Uuid>,
    #[serde(alias = "vehicle")]
    pub vehicle_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateDelivery {
    #[serde(alias = "driver")]
    pub driver_id: Option<Uuid>,
    #[serde(alias = "vehicle")]
    pub vehicle_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryView {
    #[serde(flatten)]
    pub delivery: delivery::Model,
    pub driver_name: Option<String>,
}

fn apply_status(
    active: &mut delivery::ActiveModel,
    current_delivered: Option<NaiveDate>,
    status: DeliveryStatus,
    today: NaiveDate,
) {
    active.status = Set(status);
    if status == DeliveryStatus::Delivered {
        active.date_delivered = Set(stamp_once(current_delivered, today));
    }
}

async fn require_driver<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<staff_profile::Model, ServiceError> {
    let staff = staff_profile::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::ValidationError(format!("Driver '{}' does not exist", id)))?;
    if !staff.is_driver() {
        return Err(ServiceError::ValidationError(format!(
            "Staff member '{}' is not a driver",
            id
        )));
    }
    Ok(staff)
}

async fn require_vehicle<C: ConnectionTrait>(conn: &C, vehicle_id: &str) -> Result<(), ServiceError> {
    vehicle::Entity::find_by_id(vehicle_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| ServiceError::ValidationError(format!("Vehicle '{}' does not exist", vehicle_id)))
}

fn not_found(delivery_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
}

fn duplicate_delivery(order_id: &str) -> String {
    format!("Order {} already has a delivery", order_id)
}

/// Inserts the row; the unique index on `order_id` backs the lookup done
/// beforehand, so a concurrent schedule for the same order is a `Conflict`.
async fn insert_delivery<C: ConnectionTrait>(
    conn: &C,
    active: delivery::ActiveModel,
    order_id: &str,
) -> Result<delivery::Model, ServiceError> {
    active
        .insert(conn)
        .await
        .map_err(|e| ServiceError::from_unique(e, duplicate_delivery(order_id)))
}

/// Service for order deliveries
#[derive(Clone)]
pub struct DeliveryService {
    db_pool: Arc<DbPool>,
}

impl DeliveryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Schedules the delivery of an order. Each order has at most one delivery.
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn create_delivery(
        &self,
        input: CreateDelivery,
    ) -> Result<delivery::Model, ServiceError> {
        input.validate()?;
        let status = input
            .status
            .as_deref()
            .map(|raw| parse_status::<DeliveryStatus>("delivery", raw))
            .transpose()?
            .unwrap_or(DeliveryStatus::Pending);

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        order::Entity::find_by_id(input.order_id.clone())
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Order '{}' does not exist", input.order_id))
            })?;
        let existing = delivery::Entity::find()
            .filter(delivery::Column::OrderId.eq(input.order_id.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(duplicate_delivery(&input.order_id)));
        }
        if let Some(driver_id) = input.driver_id {
            require_driver(&txn, driver_id).await?;
        }
        if let Some(vehicle_id) = input.vehicle_id.as_deref() {
            require_vehicle(&txn, vehicle_id).await?;
        }

        let today = Utc::now().date_naive();
        let delivery_id = IdentifierAllocator::allocate(&txn, IdKind::Delivery, today, "").await?;

        let mut active = delivery::ActiveModel {
            delivery_id: Set(delivery_id),
            order_id: Set(input.order_id.clone()),
            driver_id: Set(input.driver_id),
            vehicle_id: Set(input.vehicle_id),
            delivery_date: Set(input.delivery_date),
            date_delivered: Set(None),
            status: Set(DeliveryStatus::Pending),
        };
        apply_status(&mut active, None, status, today);
        let model = insert_delivery(&txn, active, &input.order_id).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(delivery_id = %model.delivery_id, "delivery scheduled");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_delivery(&self, delivery_id: &str) -> Result<DeliveryView, ServiceError> {
        let db = &*self.db_pool;
        let (delivery, driver) = delivery::Entity::find_by_id(delivery_id.to_string())
            .find_also_related(staff_profile::Entity)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(delivery_id))?;
        Ok(DeliveryView {
            delivery,
            driver_name: driver.and_then(|d| d.name),
        })
    }

    /// Lists deliveries, newest identifier first
    #[instrument(skip(self))]
    pub async fn list_deliveries(
        &self,
        status: Option<String>,
        driver_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<DeliveryView>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = delivery::Entity::find();
        if let Some(raw) = status {
            let status: DeliveryStatus = parse_status("delivery", &raw)?;
            query = query.filter(delivery::Column::Status.eq(status));
        }
        if let Some(driver_id) = driver_id {
            query = query.filter(delivery::Column::DriverId.eq(driver_id));
        }

        let paginator = query
            .order_by_desc(delivery::Column::DeliveryId)
            .find_also_related(staff_profile::Entity)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((
            rows.into_iter()
                .map(|(delivery, driver)| DeliveryView {
                    delivery,
                    driver_name: driver.and_then(|d| d.name),
                })
                .collect(),
            total,
        ))
    }

    #[instrument(skip(self, input))]
    pub async fn update_delivery(
        &self,
        delivery_id: &str,
        input: UpdateDelivery,
    ) -> Result<delivery::Model, ServiceError> {
        input.validate()?;
        let status = input
            .status
            .as_deref()
            .map(|raw| parse_status::<DeliveryStatus>("delivery", raw))
            .transpose()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let existing = load_delivery(&txn, delivery_id).await?;
        if let Some(driver_id) = input.driver_id {
            require_driver(&txn, driver_id).await?;
        }
        if let Some(vehicle_id) = input.vehicle_id.as_deref() {
            require_vehicle(&txn, vehicle_id).await?;
        }

        let delivered = existing.date_delivered;
        let mut active: delivery::ActiveModel = existing.into();
        if input.driver_id.is_some() {
            active.driver_id = Set(input.driver_id);
        }
        if input.vehicle_id.is_some() {
            active.vehicle_id = Set(input.vehicle_id);
        }
        if input.delivery_date.is_some() {
            active.delivery_date = Set(input.delivery_date);
        }
        if let Some(status) = status {
            apply_status(&mut active, delivered, status, Utc::now().date_naive());
        }

        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(delivery_id, status = %updated.status, "delivery updated");
        Ok(updated)
    }

    /// Changes only the status. Unknown labels leave the delivery untouched.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        delivery_id: &str,
        raw_status: &str,
    ) -> Result<delivery::Model, ServiceError> {
        let status: DeliveryStatus = parse_status("delivery", raw_status)?;
        let db = &*self.db_pool;
        let existing = load_delivery(db, delivery_id).await?;

        let delivered = existing.date_delivered;
        let mut active: delivery::ActiveModel = existing.into();
        apply_status(&mut active, delivered, status, Utc::now().date_naive());
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(delivery_id, status = %updated.status, "delivery status changed");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_delivery(&self, delivery_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let result = delivery::Entity::delete_by_id(delivery_id.to_string())
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(not_found(delivery_id));
        }
        info!(delivery_id, "delivery deleted");
        Ok(())
    }
}

async fn load_delivery<C: ConnectionTrait>(
    conn: &C,
    delivery_id: &str,
) -> Result<delivery::Model, ServiceError> {
    delivery::Entity::find_by_id(delivery_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| not_found(delivery_id))
}
