use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::identifiers::{IdKind, IdentifierAllocator};
use super::purchase_orders::delete_orders;
use super::validators::{normalize_phone, not_blank, validate_phone};
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{inventory_item, purchase_order, stock_in_record, supplier},
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateSupplier {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub supplier_name: String,
    #[validate(custom = "validate_phone")]
    #[schema(example = "09171234567")]
    pub contact_no: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateSupplier {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub supplier_name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub contact_no: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
}

fn not_found(supplier_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
}

/// Service for suppliers
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates a supplier with the next `SUI-` identifier
    #[instrument(skip(self, input), fields(supplier_name = %input.supplier_name))]
    pub async fn create_supplier(
        &self,
        input: CreateSupplier,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let now = Utc::now();
        let supplier_id =
            IdentifierAllocator::allocate(&txn, IdKind::Supplier, now.date_naive(), "").await?;

        let model = supplier::ActiveModel {
            supplier_id: Set(supplier_id.clone()),
            supplier_name: Set(input.supplier_name.trim().to_string()),
            contact_no: Set(normalize_phone(&input.contact_no)),
            email: Set(input.email),
            address: Set(input.address),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_insert(e, &supplier_id))?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(supplier_id = %model.supplier_id, "supplier created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, supplier_id: &str) -> Result<supplier::Model, ServiceError> {
        let db = &*self.db_pool;
        supplier::Entity::find_by_id(supplier_id.to_string())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(supplier_id))
    }

    /// Lists suppliers by identifier, optionally filtered by name
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        search: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = supplier::Entity::find();
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(supplier::Column::SupplierName.like(format!("%{}%", term.trim())));
        }
        let paginator = query
            .order_by_asc(supplier::Column::SupplierId)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let suppliers = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((suppliers, total))
    }

    /// Updates contact details; the identifier never changes
    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        supplier_id: &str,
        input: UpdateSupplier,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_supplier(supplier_id).await?;

        let mut active: supplier::ActiveModel = existing.into();
        if let Some(name) = input.supplier_name {
            active.supplier_name = Set(name.trim().to_string());
        }
        if let Some(contact_no) = input.contact_no {
            active.contact_no = Set(normalize_phone(&contact_no));
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }

        let db = &*self.db_pool;
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(supplier_id, "supplier updated");
        Ok(updated)
    }

    /// Deletes a supplier along with its purchase orders and stock-in records.
    /// Inventory items it supplied are kept and lose the reference.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, supplier_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        supplier::Entity::find_by_id(supplier_id.to_string())
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(supplier_id))?;

        let po_ids: Vec<String> = purchase_order::Entity::find()
            .select_only()
            .column(purchase_order::Column::PoId)
            .filter(purchase_order::Column::SupplierId.eq(supplier_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        stock_in_record::Entity::delete_many()
            .filter(stock_in_record::Column::SupplierId.eq(supplier_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        delete_orders(&txn, po_ids).await?;
        inventory_item::Entity::update_many()
            .col_expr(
                inventory_item::Column::SupplierId,
                Expr::value(Option::<String>::None),
            )
            .filter(inventory_item::Column::SupplierId.eq(supplier_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        supplier::Entity::delete_by_id(supplier_id.to_string())
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(supplier_id, "supplier deleted");
        Ok(())
    }
}
