use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::identifiers::{IdKind, IdentifierAllocator};
use super::validators::{normalize_phone, validate_phone};
use crate::{
    auth::identity::IdentityProvider,
    db::DbPool,
    errors::ServiceError,
    models::{
        staff_profile,
        status::{parse_status, LifecycleStatus, StaffRole},
    },
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateStaff {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub contact: String,
    pub address: Option<String>,
    #[schema(example = "Driver")]
    pub role: Option<String>,
    #[validate(length(max = 50))]
    pub license_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateStaff {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub contact: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
    #[validate(length(max = 50))]
    pub license_number: Option<String>,
    pub status: Option<String>,
}

fn parse_role(raw: &str) -> Result<StaffRole, ServiceError> {
    raw.trim()
        .parse::<StaffRole>()
        .map_err(|_| ServiceError::ValidationError(format!("'{}' is not a valid staff role", raw)))
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Staff profile {} not found", id))
}

/// Service for staff accounts
#[derive(Clone)]
pub struct StaffService {
    db_pool: Arc<DbPool>,
    identity: Arc<dyn IdentityProvider>,
}

impl StaffService {
    pub fn new(db_pool: Arc<DbPool>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { db_pool, identity }
    }

    /// Invites the staff member through the identity provider, then stores
    /// their profile under the user id it returns
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_staff(
        &self,
        input: CreateStaff,
    ) -> Result<staff_profile::Model, ServiceError> {
        input.validate()?;
        let role = input.role.as_deref().map(parse_role).transpose()?;

        let db = &*self.db_pool;
        let taken = staff_profile::Entity::find()
            .filter(
                staff_profile::Column::Email
                    .eq(input.email.clone())
                    .or(staff_profile::Column::Username.eq(input.username.clone())),
            )
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(
                "A staff member with this email or username already exists".to_string(),
            ));
        }

        let metadata = json!({
            "username": input.username,
            "name": input.name,
            "role": role.map(|r| r.to_string()),
        });
        let user = self.identity.invite_user(&input.email, metadata).await?;

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let now = Utc::now();
        let staff_id =
            IdentifierAllocator::allocate(&txn, IdKind::Staff, now.date_naive(), "").await?;

        let model = staff_profile::ActiveModel {
            id: Set(user.id),
            staff_id: Set(Some(staff_id.clone())),
            email: Set(input.email),
            username: Set(input.username),
            name: Set(input.name),
            contact: Set(normalize_phone(&input.contact)),
            address: Set(input.address),
            role: Set(role),
            license_number: Set(input.license_number),
            created_at: Set(now),
            status: Set(LifecycleStatus::Active),
            deactivated_at: Set(None),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(user_id = %user.id, "invited user has no profile: {}", e);
            ServiceError::from_insert(e, &staff_id)
        })?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(id = %model.id, staff_id = %staff_id, "staff member invited");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_staff(&self, id: Uuid) -> Result<staff_profile::Model, ServiceError> {
        let db = &*self.db_pool;
        staff_profile::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(id))
    }

    /// Looks up a profile without failing when it does not exist
    pub async fn find_staff(&self, id: Uuid) -> Result<Option<staff_profile::Model>, ServiceError> {
        let db = &*self.db_pool;
        staff_profile::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Lists staff. Deleted accounts are hidden unless `status` asks for them.
    #[instrument(skip(self))]
    pub async fn list_staff(
        &self,
        status: Option<String>,
        role: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<staff_profile::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = staff_profile::Entity::find();
        query = match status {
            Some(raw) => {
                let status: LifecycleStatus = parse_status("account", &raw)?;
                query.filter(staff_profile::Column::Status.eq(status))
            }
            None => query.filter(staff_profile::Column::Status.ne(LifecycleStatus::Deleted)),
        };
        if let Some(raw) = role {
            query = query.filter(staff_profile::Column::Role.eq(parse_role(&raw)?));
        }

        let paginator = query
            .order_by_asc(staff_profile::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let staff = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((staff, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_staff(
        &self,
        id: Uuid,
        input: UpdateStaff,
    ) -> Result<staff_profile::Model, ServiceError> {
        input.validate()?;
        let role = input.role.as_deref().map(parse_role).transpose()?;
        let status = input
            .status
            .as_deref()
            .map(|raw| parse_status::<LifecycleStatus>("account", raw))
            .transpose()?;

        let existing = self.get_staff(id).await?;
        if let Some(next) = status {
            existing.status.ensure_transition(next)?;
        }

        let (deactivated_at, deleted_at) = (existing.deactivated_at, existing.deleted_at);
        let mut active: staff_profile::ActiveModel = existing.into();
        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if input.name.is_some() {
            active.name = Set(input.name);
        }
        if let Some(contact) = input.contact {
            active.contact = Set(normalize_phone(&contact));
        }
        if input.address.is_some() {
            active.address = Set(input.address);
        }
        if role.is_some() {
            active.role = Set(role);
        }
        if input.license_number.is_some() {
            active.license_number = Set(input.license_number);
        }
        if let Some(next) = status {
            let (deactivated, deleted) = next.stamps(deactivated_at, deleted_at, Utc::now());
            active.status = Set(next);
            active.deactivated_at = Set(deactivated);
            active.deleted_at = Set(deleted);
        }

        let db = &*self.db_pool;
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::from_unique(e, "Username is already taken"))?;
        info!(%id, status = %updated.status, "staff profile updated");
        Ok(updated)
    }

    /// Moves an account through its lifecycle
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: Uuid,
        next: LifecycleStatus,
    ) -> Result<staff_profile::Model, ServiceError> {
        let existing = self.get_staff(id).await?;
        existing.status.ensure_transition(next)?;

        let (deactivated, deleted) =
            next.stamps(existing.deactivated_at, existing.deleted_at, Utc::now());
        let mut active: staff_profile::ActiveModel = existing.into();
        active.status = Set(next);
        active.deactivated_at = Set(deactivated);
        active.deleted_at = Set(deleted);

        let db = &*self.db_pool;
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(%id, status = %next, "staff status changed");
        Ok(updated)
    }

    /// Logical delete
    pub async fn delete_staff(&self, id: Uuid) -> Result<staff_profile::Model, ServiceError> {
        self.set_status(id, LifecycleStatus::Deleted).await
    }

    /// Sends the invitation e-mail again
    #[instrument(skip(self))]
    pub async fn resend_invite(&self, id: Uuid) -> Result<staff_profile::Model, ServiceError> {
        let staff = self.get_staff(id).await?;
        if let Some(err) = staff.status.access_error() {
            return Err(err);
        }
        self.identity
            .invite_user(
                &staff.email,
                json!({
                    "username": staff.username,
                    "name": staff.name,
                    "role": staff.role.map(|r| r.to_string()),
                }),
            )
            .await?;
        info!(%id, "staff invite re-sent");
        Ok(staff)
    }
}
