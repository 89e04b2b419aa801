use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::identifiers::{IdKind, IdentifierAllocator};
use super::validators::not_blank;
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        delivery, staff_profile,
        status::{parse_status, LifecycleStatus, VehicleStatus, VehicleType},
        vehicle,
    },
};

const PLATE_TAKEN: &str = "A vehicle with this plate number already exists";

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateVehicle {
    #[validate(length(min = 1, max = 20), custom = "not_blank")]
    pub plate_number: String,
    #[serde(rename = "model")]
    #[validate(length(min = 1, max = 100))]
    pub model_name: String,
    #[validate(length(min = 1, max = 100))]
    pub brand: String,
    pub year_manufactured: i32,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "Van")]
    pub vehicle_type: VehicleType,
    #[schema(value_type = Option<String>, example = "Active")]
    pub status: Option<VehicleStatus>,
    pub date_acquired: NaiveDate,
    pub assigned_driver: Option<Uuid>,
    pub last_maintenance: Option<NaiveDate>,
    pub insurance_expiry: NaiveDate,
    pub registration_expiry: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateVehicle {
    #[validate(length(min = 1, max = 20), custom = "not_blank")]
    pub plate_number: Option<String>,
    #[serde(rename = "model")]
    #[validate(length(min = 1, max = 100))]
    pub model_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,
    pub year_manufactured: Option<i32>,
    #[serde(rename = "type")]
    #[schema(value_type = Option<String>)]
    pub vehicle_type: Option<VehicleType>,
    #[schema(value_type = Option<String>)]
    pub status: Option<VehicleStatus>,
    pub date_acquired: Option<NaiveDate>,
    pub assigned_driver: Option<Uuid>,
    pub last_maintenance: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
    pub registration_expiry: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleView {
    #[serde(flatten)]
    pub vehicle: vehicle::Model,
    pub assigned_driver_name: Option<String>,
}

/// The date and year fields that are checked against each other.
#[derive(Debug, Clone, Copy)]
pub struct VehicleDates {
    pub year_manufactured: i32,
    pub date_acquired: NaiveDate,
    pub last_maintenance: Option<NaiveDate>,
    pub insurance_expiry: NaiveDate,
    pub registration_expiry: NaiveDate,
}

impl VehicleDates {
    pub fn check(&self, today: NaiveDate) -> Result<(), ServiceError> {
        let invalid = |msg: &str| Err(ServiceError::ValidationError(msg.to_string()));
        if self.year_manufactured < 1900 || self.year_manufactured > today.year() {
            return invalid("Year manufactured must be between 1900 and the current year");
        }
        if self.date_acquired > today {
            return invalid("Date acquired cannot be in the future");
        }
        if self.last_maintenance.map_or(false, |d| d > today) {
            return invalid("Last maintenance cannot be in the future");
        }
        if self.insurance_expiry <= self.date_acquired {
            return invalid("Insurance expiry must be after the acquisition date");
        }
        if self.registration_expiry <= self.date_acquired {
            return invalid("Registration expiry must be after the acquisition date");
        }
        Ok(())
    }
}

async fn require_active_driver<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), ServiceError> {
    let staff = staff_profile::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::ValidationError(format!("Driver '{}' does not exist", id)))?;
    if !staff.is_driver() || staff.status != LifecycleStatus::Active {
        return Err(ServiceError::ValidationError(
            "Assigned driver must be an active staff member with the Driver role".to_string(),
        ));
    }
    Ok(())
}

fn not_found(vehicle_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Vehicle {} not found", vehicle_id))
}

/// Service for the delivery fleet
#[derive(Clone)]
pub struct VehicleService {
    db_pool: Arc<DbPool>,
}

impl VehicleService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(plate = %input.plate_number))]
    pub async fn create_vehicle(
        &self,
        input: CreateVehicle,
        updated_by: Option<Uuid>,
    ) -> Result<vehicle::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        VehicleDates {
            year_manufactured: input.year_manufactured,
            date_acquired: input.date_acquired,
            last_maintenance: input.last_maintenance,
            insurance_expiry: input.insurance_expiry,
            registration_expiry: input.registration_expiry,
        }
        .check(now.date_naive())?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        if let Some(driver) = input.assigned_driver {
            require_active_driver(&txn, driver).await?;
        }

        let vehicle_id =
            IdentifierAllocator::allocate(&txn, IdKind::Vehicle, now.date_naive(), "").await?;
        let model = vehicle::ActiveModel {
            vehicle_id: Set(vehicle_id),
            plate_number: Set(input.plate_number.trim().to_uppercase()),
            model_name: Set(input.model_name),
            brand: Set(input.brand),
            year_manufactured: Set(input.year_manufactured),
            vehicle_type: Set(input.vehicle_type),
            status: Set(input.status.unwrap_or(VehicleStatus::Active)),
            date_acquired: Set(input.date_acquired),
            assigned_driver: Set(input.assigned_driver),
            last_maintenance: Set(input.last_maintenance),
            insurance_expiry: Set(input.insurance_expiry),
            registration_expiry: Set(input.registration_expiry),
            created_at: Set(now),
            updated_at: Set(now),
            updated_by: Set(updated_by),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_unique(e, PLATE_TAKEN))?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(vehicle_id = %model.vehicle_id, "vehicle registered");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_vehicle(&self, vehicle_id: &str) -> Result<VehicleView, ServiceError> {
        let db = &*self.db_pool;
        let (vehicle, driver) = vehicle::Entity::find_by_id(vehicle_id.to_string())
            .find_also_related(staff_profile::Entity)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(vehicle_id))?;
        Ok(VehicleView {
            vehicle,
            assigned_driver_name: driver.and_then(|d| d.name),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_vehicles(
        &self,
        status: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<VehicleView>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = vehicle::Entity::find();
        if let Some(raw) = status {
            let status: VehicleStatus = parse_status("vehicle", &raw)?;
            query = query.filter(vehicle::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_asc(vehicle::Column::VehicleId)
            .find_also_related(staff_profile::Entity)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((
            rows.into_iter()
                .map(|(vehicle, driver)| VehicleView {
                    vehicle,
                    assigned_driver_name: driver.and_then(|d| d.name),
                })
                .collect(),
            total,
        ))
    }

    #[instrument(skip(self, input))]
    pub async fn update_vehicle(
        &self,
        vehicle_id: &str,
        input: UpdateVehicle,
        updated_by: Option<Uuid>,
    ) -> Result<vehicle::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let existing = vehicle::Entity::find_by_id(vehicle_id.to_string())
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(vehicle_id))?;

        let now = Utc::now();
        VehicleDates {
            year_manufactured: input.year_manufactured.unwrap_or(existing.year_manufactured),
            date_acquired: input.date_acquired.unwrap_or(existing.date_acquired),
            last_maintenance: input.last_maintenance.or(existing.last_maintenance),
            insurance_expiry: input.insurance_expiry.unwrap_or(existing.insurance_expiry),
            registration_expiry: input
                .registration_expiry
                .unwrap_or(existing.registration_expiry),
        }
        .check(now.date_naive())?;
        if let Some(driver) = input.assigned_driver {
            require_active_driver(&txn, driver).await?;
        }

        let mut active: vehicle::ActiveModel = existing.into();
        if let Some(plate) = input.plate_number {
            active.plate_number = Set(plate.trim().to_uppercase());
        }
        if let Some(model_name) = input.model_name {
            active.model_name = Set(model_name);
        }
        if let Some(brand) = input.brand {
            active.brand = Set(brand);
        }
        if let Some(year) = input.year_manufactured {
            active.year_manufactured = Set(year);
        }
        if let Some(vehicle_type) = input.vehicle_type {
            active.vehicle_type = Set(vehicle_type);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(date) = input.date_acquired {
            active.date_acquired = Set(date);
        }
        if input.assigned_driver.is_some() {
            active.assigned_driver = Set(input.assigned_driver);
        }
        if input.last_maintenance.is_some() {
            active.last_maintenance = Set(input.last_maintenance);
        }
        if let Some(date) = input.insurance_expiry {
            active.insurance_expiry = Set(date);
        }
        if let Some(date) = input.registration_expiry {
            active.registration_expiry = Set(date);
        }
        active.updated_at = Set(now);
        active.updated_by = Set(updated_by);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::from_unique(e, PLATE_TAKEN))?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(vehicle_id, "vehicle updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        vehicle_id: &str,
        raw_status: &str,
        updated_by: Option<Uuid>,
    ) -> Result<vehicle::Model, ServiceError> {
        let status: VehicleStatus = parse_status("vehicle", raw_status)?;
        let db = &*self.db_pool;
        let existing = vehicle::Entity::find_by_id(vehicle_id.to_string())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(vehicle_id))?;

        let mut active: vehicle::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.updated_by = Set(updated_by);
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(vehicle_id, status = %status, "vehicle status changed");
        Ok(updated)
    }

    /// Removes a vehicle. Deliveries that used it keep their record without a vehicle.
    #[instrument(skip(self))]
    pub async fn delete_vehicle(&self, vehicle_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        delivery::Entity::update_many()
            .col_expr(delivery::Column::VehicleId, Expr::value(Option::<String>::None))
            .filter(delivery::Column::VehicleId.eq(vehicle_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let result = vehicle::Entity::delete_by_id(vehicle_id.to_string())
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(not_found(vehicle_id));
        }

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(vehicle_id, "vehicle deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates() -> VehicleDates {
        VehicleDates {
            year_manufactured: 2020,
            date_acquired: date(2021, 5, 1),
            last_maintenance: Some(date(2024, 1, 10)),
            insurance_expiry: date(2025, 5, 1),
            registration_expiry: date(2025, 6, 1),
        }
    }

    #[test]
    fn consistent_dates_pass() {
        assert!(dates().check(date(2024, 6, 1)).is_ok());
    }

    #[rstest]
    #[case::too_old(VehicleDates { year_manufactured: 1899, ..dates() })]
    #[case::from_the_future(VehicleDates { year_manufactured: 2025, ..dates() })]
    #[case::acquired_tomorrow(VehicleDates { date_acquired: date(2024, 6, 2), ..dates() })]
    #[case::maintained_tomorrow(VehicleDates { last_maintenance: Some(date(2024, 6, 2)), ..dates() })]
    #[case::insurance_before_acquisition(VehicleDates { insurance_expiry: date(2021, 5, 1), ..dates() })]
    #[case::registration_before_acquisition(VehicleDates { registration_expiry: date(2020, 1, 1), ..dates() })]
    fn inconsistent_dates_fail(#[case] input: VehicleDates) {
        assert_matches!(
            input.check(date(2024, 6, 1)),
            Err(ServiceError::ValidationError(_))
        );
    }
}
