use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::identifiers::{IdKind, IdentifierAllocator};
use super::validators::{normalize_phone, not_blank, validate_phone};
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        customer_profile,
        status::{parse_status, LifecycleStatus},
    },
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCustomer {
    /// Identity-provider user id; generated when omitted.
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom = "validate_phone")]
    pub contact: String,
    #[validate(length(max = 255))]
    pub company: Option<String>,
    #[serde(alias = "shippingAddress")]
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCustomer {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "validate_phone")]
    pub contact: Option<String>,
    #[validate(length(max = 255))]
    pub company: Option<String>,
    #[serde(alias = "shippingAddress")]
    pub shipping_address: Option<String>,
}

/// Body of `PATCH /customers/:id`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CustomerAction {
    Activate,
    Deactivate,
}

impl CustomerAction {
    pub fn target(self) -> LifecycleStatus {
        match self {
            CustomerAction::Activate => LifecycleStatus::Active,
            CustomerAction::Deactivate => LifecycleStatus::Deactivated,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CustomerActionRequest {
    pub action: CustomerAction,
}

fn not_found(key: &str) -> ServiceError {
    ServiceError::NotFound(format!("Customer {} not found", key))
}

/// Service for customer profiles
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(
        &self,
        input: CreateCustomer,
    ) -> Result<customer_profile::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let now = Utc::now();
        let customer_id =
            IdentifierAllocator::allocate(&txn, IdKind::Customer, now.date_naive(), "").await?;

        let model = customer_profile::ActiveModel {
            id: Set(input.id.unwrap_or_else(Uuid::new_v4)),
            customer_id: Set(Some(customer_id.clone())),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email),
            contact: Set(normalize_phone(&input.contact)),
            company: Set(input.company),
            shipping_address: Set(input.shipping_address),
            created_at: Set(now),
            status: Set(LifecycleStatus::Active),
            deactivated_at: Set(None),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_unique(e, "A customer with this email already exists"))?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(customer_id = %customer_id, "customer created");
        Ok(model)
    }

    /// Finds a customer by profile UUID or by `CUS-` identifier
    #[instrument(skip(self))]
    pub async fn get_customer(&self, key: &str) -> Result<customer_profile::Model, ServiceError> {
        let db = &*self.db_pool;
        let query = match Uuid::parse_str(key) {
            Ok(id) => customer_profile::Entity::find_by_id(id),
            Err(_) => customer_profile::Entity::find()
                .filter(customer_profile::Column::CustomerId.eq(key)),
        };
        query
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(key))
    }

    pub async fn find_customer(
        &self,
        id: Uuid,
    ) -> Result<Option<customer_profile::Model>, ServiceError> {
        let db = &*self.db_pool;
        customer_profile::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Lists customers. Deleted profiles are hidden unless `status` asks for them.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        status: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<customer_profile::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let query = match status {
            Some(raw) => {
                let status: LifecycleStatus = parse_status("account", &raw)?;
                customer_profile::Entity::find()
                    .filter(customer_profile::Column::Status.eq(status))
            }
            None => customer_profile::Entity::find()
                .filter(customer_profile::Column::Status.ne(LifecycleStatus::Deleted)),
        };
        let paginator = query
            .order_by_asc(customer_profile::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let customers = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((customers, total))
    }

    /// Updates contact details. Account status only changes through [`Self::set_status`].
    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        key: &str,
        input: UpdateCustomer,
    ) -> Result<customer_profile::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_customer(key).await?;
        let mut active: customer_profile::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(contact) = input.contact {
            active.contact = Set(normalize_phone(&contact));
        }
        if input.company.is_some() {
            active.company = Set(input.company);
        }
        if input.shipping_address.is_some() {
            active.shipping_address = Set(input.shipping_address);
        }

        let db = &*self.db_pool;
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::from_unique(e, "A customer with this email already exists"))?;
        info!(key, "customer updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        key: &str,
        next: LifecycleStatus,
    ) -> Result<customer_profile::Model, ServiceError> {
        let existing = self.get_customer(key).await?;
        existing.status.ensure_transition(next)?;

        let (deactivated, deleted) =
            next.stamps(existing.deactivated_at, existing.deleted_at, Utc::now());
        let mut active: customer_profile::ActiveModel = existing.into();
        active.status = Set(next);
        active.deactivated_at = Set(deactivated);
        active.deleted_at = Set(deleted);

        let db = &*self.db_pool;
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(key, status = %next, "customer status changed");
        Ok(updated)
    }

    /// Logical delete
    pub async fn delete_customer(&self, key: &str) -> Result<customer_profile::Model, ServiceError> {
        self.set_status(key, LifecycleStatus::Deleted).await
    }
}
