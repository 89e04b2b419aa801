use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::identifiers::{IdKind, IdentifierAllocator, StockInIdFormat};
use super::inventory::{require_item, require_supplier, InventoryMutator};
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{inventory_item, purchase_order, staff_profile, stock_in_record, supplier},
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateStockIn {
    #[serde(alias = "item")]
    #[validate(length(min = 1))]
    pub item_id: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 20))]
    pub uom: String,
    #[serde(alias = "supplier")]
    #[validate(length(min = 1))]
    pub supplier_id: String,
    pub stocked_by: Option<Uuid>,
    #[serde(alias = "purchase_order")]
    pub purchase_order_id: Option<String>,
    #[serde(default)]
    pub remarks: String,
}

/// Editable fields of a stock-in record. Item and quantity are fixed once the
/// stock has been received.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateStockIn {
    #[validate(length(min = 1, max = 20))]
    pub uom: Option<String>,
    #[serde(alias = "supplier")]
    pub supplier_id: Option<String>,
    pub stocked_by: Option<Uuid>,
    #[serde(alias = "purchase_order")]
    pub purchase_order_id: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockInView {
    #[serde(flatten)]
    pub record: stock_in_record::Model,
    pub item_name: Option<String>,
    pub supplier_name: Option<String>,
    pub stocked_by_name: Option<String>,
}

/// Adds a freshly inserted record's quantity to its item.
pub async fn apply_stock_in<C>(
    conn: &C,
    record: &stock_in_record::Model,
) -> Result<inventory_item::Model, ServiceError>
where
    C: ConnectionTrait,
{
    InventoryMutator::increase(conn, &record.item_id, record.quantity).await
}

async fn require_purchase_order<C: ConnectionTrait>(conn: &C, po_id: &str) -> Result<(), ServiceError> {
    purchase_order::Entity::find_by_id(po_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("Purchase order '{}' does not exist", po_id))
        })
}

async fn require_staff<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<staff_profile::Model, ServiceError> {
    staff_profile::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::ValidationError(format!("Staff member '{}' does not exist", id)))
}

/// Service for stock-in records
#[derive(Clone)]
pub struct StockInService {
    db_pool: Arc<DbPool>,
    id_format: StockInIdFormat,
}

impl StockInService {
    pub fn new(db_pool: Arc<DbPool>, id_format: StockInIdFormat) -> Self {
        Self { db_pool, id_format }
    }

    /// Records received stock and increments the item's quantity in the same
    /// transaction
    #[instrument(skip(self, input), fields(item_id = %input.item_id, quantity = input.quantity))]
    pub async fn create_stock_in(
        &self,
        input: CreateStockIn,
        current_staff: Option<Uuid>,
    ) -> Result<stock_in_record::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        require_item(&txn, &input.item_id).await?;
        require_supplier(&txn, &input.supplier_id).await?;
        if let Some(po_id) = input.purchase_order_id.as_deref() {
            require_purchase_order(&txn, po_id).await?;
        }
        let stocked_by = match input.stocked_by.or(current_staff) {
            Some(id) => Some(require_staff(&txn, id).await?),
            None => None,
        };
        let initials = stocked_by
            .as_ref()
            .map(staff_profile::Model::initials)
            .unwrap_or_default();

        let now = Utc::now();
        let stockin_id = IdentifierAllocator::allocate(
            &txn,
            IdKind::StockIn(self.id_format),
            now.date_naive(),
            &initials,
        )
        .await?;

        let record = stock_in_record::ActiveModel {
            stockin_id: Set(stockin_id.clone()),
            item_id: Set(input.item_id),
            quantity: Set(input.quantity),
            uom: Set(input.uom),
            supplier_id: Set(input.supplier_id),
            stocked_by: Set(stocked_by.map(|s| s.id)),
            purchase_order_id: Set(input.purchase_order_id),
            remarks: Set(input.remarks),
            date_stocked: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_insert(e, &stockin_id))?;

        let item = apply_stock_in(&txn, &record).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            stockin_id = %record.stockin_id,
            item_id = %item.item_id,
            new_quantity = item.quantity,
            "stock received"
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn get_stock_in(&self, stockin_id: &str) -> Result<StockInView, ServiceError> {
        let db = &*self.db_pool;
        let record = load_record(db, stockin_id).await?;
        self.enrich(vec![record])
            .await?
            .pop()
            .ok_or_else(|| not_found(stockin_id))
    }

    /// Lists stock-in records, most recent first
    #[instrument(skip(self))]
    pub async fn list_stock_ins(
        &self,
        item_id: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<StockInView>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = stock_in_record::Entity::find();
        if let Some(item_id) = item_id {
            query = query.filter(stock_in_record::Column::ItemId.eq(item_id));
        }
        let paginator = query
            .order_by_desc(stock_in_record::Column::DateStocked)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let records = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((self.enrich(records).await?, total))
    }

    /// Updates bookkeeping fields only; inventory is not touched.
    #[instrument(skip(self, input))]
    pub async fn update_stock_in(
        &self,
        stockin_id: &str,
        input: UpdateStockIn,
    ) -> Result<stock_in_record::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let existing = load_record(&txn, stockin_id).await?;

        if let Some(supplier_id) = input.supplier_id.as_deref() {
            require_supplier(&txn, supplier_id).await?;
        }
        if let Some(po_id) = input.purchase_order_id.as_deref() {
            require_purchase_order(&txn, po_id).await?;
        }
        if let Some(id) = input.stocked_by {
            require_staff(&txn, id).await?;
        }

        let mut active: stock_in_record::ActiveModel = existing.into();
        if let Some(uom) = input.uom {
            active.uom = Set(uom);
        }
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(supplier_id);
        }
        if input.stocked_by.is_some() {
            active.stocked_by = Set(input.stocked_by);
        }
        if input.purchase_order_id.is_some() {
            active.purchase_order_id = Set(input.purchase_order_id);
        }
        if let Some(remarks) = input.remarks {
            active.remarks = Set(remarks);
        }

        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(stockin_id, "stock-in record updated");
        Ok(updated)
    }

    /// Removes the record. Received stock stays on hand.
    #[instrument(skip(self))]
    pub async fn delete_stock_in(&self, stockin_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let result = stock_in_record::Entity::delete_by_id(stockin_id.to_string())
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(not_found(stockin_id));
        }
        info!(stockin_id, "stock-in record deleted");
        Ok(())
    }

    async fn enrich(
        &self,
        records: Vec<stock_in_record::Model>,
    ) -> Result<Vec<StockInView>, ServiceError> {
        let db = &*self.db_pool;
        let item_ids: Vec<String> = records.iter().map(|r| r.item_id.clone()).collect();
        let supplier_ids: Vec<String> = records.iter().map(|r| r.supplier_id.clone()).collect();
        let staff_ids: Vec<Uuid> = records.iter().filter_map(|r| r.stocked_by).collect();

        let items = inventory_item::Entity::find()
            .filter(inventory_item::Column::ItemId.is_in(item_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let suppliers = supplier::Entity::find()
            .filter(supplier::Column::SupplierId.is_in(supplier_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let staff = staff_profile::Entity::find()
            .filter(staff_profile::Column::Id.is_in(staff_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(records
            .into_iter()
            .map(|record| StockInView {
                item_name: items
                    .iter()
                    .find(|i| i.item_id == record.item_id)
                    .map(|i| i.item_name.clone()),
                supplier_name: suppliers
                    .iter()
                    .find(|s| s.supplier_id == record.supplier_id)
                    .map(|s| s.supplier_name.clone()),
                stocked_by_name: record.stocked_by.and_then(|id| {
                    staff
                        .iter()
                        .find(|s| s.id == id)
                        .and_then(|s| s.name.clone().or_else(|| Some(s.username.clone())))
                }),
                record,
            })
            .collect())
    }
}

fn not_found(stockin_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Stock-in record {} not found", stockin_id))
}

async fn load_record<C: ConnectionTrait>(
    conn: &C,
    stockin_id: &str,
) -> Result<stock_in_record::Model, ServiceError> {
    stock_in_record::Entity::find_by_id(stockin_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| not_found(stockin_id))
}
