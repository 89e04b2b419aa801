use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use super::identifiers::{IdKind, IdentifierAllocator};
use super::purchase_orders::recompute_total;
use super::validators::{non_negative, not_blank};
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{inventory_item, purchase_order_item, stock_in_record, supplier},
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateInventoryItem {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub item_name: String,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(max = 50))]
    pub size: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 50))]
    pub uom: String,
    #[schema(value_type = String, example = "120.00")]
    #[validate(custom = "non_negative")]
    pub cost_price: Decimal,
    #[schema(value_type = String, example = "150.00")]
    #[validate(custom = "non_negative")]
    pub selling_price: Decimal,
    #[serde(alias = "supplier")]
    pub supplier_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateInventoryItem {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub item_name: Option<String>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 50))]
    pub size: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub uom: Option<String>,
    #[schema(value_type = Option<String>)]
    #[validate(custom = "non_negative")]
    pub cost_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    #[validate(custom = "non_negative")]
    pub selling_price: Option<Decimal>,
    #[serde(alias = "supplier")]
    pub supplier_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct DecreaseQuantity {
    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub quantity: i32,
    pub reason: Option<String>,
}

/// An inventory item with its supplier's display name.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryItemView {
    #[serde(flatten)]
    pub item: inventory_item::Model,
    pub supplier_name: Option<String>,
}

impl InventoryItemView {
    fn new(item: inventory_item::Model, supplier: Option<supplier::Model>) -> Self {
        Self {
            item,
            supplier_name: supplier.map(|s| s.supplier_name),
        }
    }
}

/// Result of a clamped decrement.
#[derive(Debug, Clone, Serialize)]
pub struct DecreaseOutcome {
    pub item: inventory_item::Model,
    pub requested: i32,
    pub applied: i32,
    /// Portion of the request that could not be taken because stock ran out.
    pub shortfall: i32,
}

/// Atomic adjustments of on-hand quantity.
pub struct InventoryMutator;

impl InventoryMutator {
    /// Adds `amount` to the item's quantity in one SQL statement.
    ///
    /// The update only matches while the sum still fits an `i32`, so an
    /// overflowing increment is refused without touching the row.
    #[instrument(skip(conn))]
    pub async fn increase<C>(
        conn: &C,
        item_id: &str,
        amount: i32,
    ) -> Result<inventory_item::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        ensure_positive(amount)?;
        let result = inventory_item::Entity::update_many()
            .col_expr(
                inventory_item::Column::Quantity,
                Expr::col(inventory_item::Column::Quantity).add(amount),
            )
            .filter(inventory_item::Column::ItemId.eq(item_id))
            .filter(inventory_item::Column::Quantity.lte(i32::MAX - amount))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            let item = load_item(conn, item_id).await?;
            return Err(ServiceError::ValidationError(format!(
                "Adding {} to item {} would exceed the maximum quantity of {} (currently {})",
                amount,
                item_id,
                i32::MAX,
                item.quantity
            )));
        }
        load_item(conn, item_id).await
    }

    /// Subtracts up to `amount`, stopping at zero.
    ///
    /// Running short is not an error; the outcome reports how much was applied.
    #[instrument(skip(conn))]
    pub async fn decrease<C>(
        conn: &C,
        item_id: &str,
        amount: i32,
    ) -> Result<DecreaseOutcome, ServiceError>
    where
        C: ConnectionTrait,
    {
        ensure_positive(amount)?;
        let before = load_item(conn, item_id).await?;

        let clamped: SimpleExpr = Expr::case(
            Expr::col(inventory_item::Column::Quantity).gt(amount),
            Expr::col(inventory_item::Column::Quantity).sub(amount),
        )
        .finally(Expr::val(0))
        .into();

        inventory_item::Entity::update_many()
            .col_expr(inventory_item::Column::Quantity, clamped)
            .filter(inventory_item::Column::ItemId.eq(item_id))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;

        let item = load_item(conn, item_id).await?;
        let applied = (before.quantity - item.quantity).clamp(0, amount);
        let shortfall = amount - applied;
        if shortfall > 0 {
            warn!(item_id, requested = amount, applied, "decrement truncated at zero");
        }

        Ok(DecreaseOutcome {
            item,
            requested: amount,
            applied,
            shortfall,
        })
    }
}

fn ensure_positive(amount: i32) -> Result<(), ServiceError> {
    if amount < 1 {
        return Err(ServiceError::ValidationError(
            "Quantity must be at least 1.".to_string(),
        ));
    }
    Ok(())
}

fn item_not_found(item_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Inventory item {} not found", item_id))
}

async fn load_item<C: ConnectionTrait>(
    conn: &C,
    item_id: &str,
) -> Result<inventory_item::Model, ServiceError> {
    inventory_item::Entity::find_by_id(item_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| item_not_found(item_id))
}

/// Fails with a validation error when a referenced supplier is missing.
pub(crate) async fn require_supplier<C: ConnectionTrait>(
    conn: &C,
    supplier_id: &str,
) -> Result<supplier::Model, ServiceError> {
    supplier::Entity::find_by_id(supplier_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("Supplier '{}' does not exist", supplier_id))
        })
}

/// Fails with a validation error when a referenced inventory item is missing.
pub(crate) async fn require_item<C: ConnectionTrait>(
    conn: &C,
    item_id: &str,
) -> Result<inventory_item::Model, ServiceError> {
    inventory_item::Entity::find_by_id(item_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::ValidationError(format!("Item '{}' does not exist", item_id)))
}

/// Service for inventory items
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates an item with the next `IT-` identifier
    #[instrument(skip(self, input), fields(item_name = %input.item_name))]
    pub async fn create_item(
        &self,
        input: CreateInventoryItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        if let Some(supplier_id) = input.supplier_id.as_deref() {
            require_supplier(&txn, supplier_id).await?;
        }

        let now = Utc::now();
        let item_id =
            IdentifierAllocator::allocate(&txn, IdKind::InventoryItem, now.date_naive(), "")
                .await?;

        let model = inventory_item::ActiveModel {
            item_id: Set(item_id.clone()),
            item_name: Set(input.item_name.trim().to_string()),
            brand: Set(input.brand),
            category: Set(input.category),
            size: Set(input.size),
            quantity: Set(input.quantity),
            uom: Set(input.uom),
            cost_price: Set(input.cost_price),
            selling_price: Set(input.selling_price),
            supplier_id: Set(input.supplier_id),
            stock_in_date: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_insert(e, &item_id))?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(item_id = %model.item_id, "inventory item created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: &str) -> Result<InventoryItemView, ServiceError> {
        let db = &*self.db_pool;
        let (item, supplier) = inventory_item::Entity::find_by_id(item_id.to_string())
            .find_also_related(supplier::Entity)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| item_not_found(item_id))?;
        Ok(InventoryItemView::new(item, supplier))
    }

    /// Lists items ordered by identifier, optionally filtered by name or category
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        search: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<InventoryItemView>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = inventory_item::Entity::find();
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", term.trim());
            query = query.filter(
                inventory_item::Column::ItemName
                    .like(pattern.clone())
                    .or(inventory_item::Column::Category.like(pattern)),
            );
        }

        let paginator = query
            .order_by_asc(inventory_item::Column::ItemId)
            .find_also_related(supplier::Entity)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((
            rows.into_iter()
                .map(|(item, supplier)| InventoryItemView::new(item, supplier))
                .collect(),
            total,
        ))
    }

    /// Items at or below `threshold` units on hand, lowest first
    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let db = &*self.db_pool;
        inventory_item::Entity::find()
            .filter(inventory_item::Column::Quantity.lte(threshold))
            .order_by_asc(inventory_item::Column::Quantity)
            .order_by_asc(inventory_item::Column::ItemId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        item_id: &str,
        input: UpdateInventoryItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let existing = load_item(&txn, item_id).await?;
        if let Some(supplier_id) = input.supplier_id.as_deref() {
            require_supplier(&txn, supplier_id).await?;
        }

        let mut active: inventory_item::ActiveModel = existing.into();
        if let Some(name) = input.item_name {
            active.item_name = Set(name.trim().to_string());
        }
        if input.brand.is_some() {
            active.brand = Set(input.brand);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if input.size.is_some() {
            active.size = Set(input.size);
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(uom) = input.uom {
            active.uom = Set(uom);
        }
        if let Some(cost_price) = input.cost_price {
            active.cost_price = Set(cost_price);
        }
        if let Some(selling_price) = input.selling_price {
            active.selling_price = Set(selling_price);
        }
        if input.supplier_id.is_some() {
            active.supplier_id = Set(input.supplier_id);
        }

        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(item_id, "inventory item updated");
        Ok(updated)
    }

    /// Deletes an item together with its purchase-order lines and stock-in history.
    /// Purchase orders that lose lines get their totals recomputed.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        load_item(&txn, item_id).await?;

        let affected_orders: HashSet<String> = purchase_order_item::Entity::find()
            .filter(purchase_order_item::Column::ItemId.eq(item_id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|line| line.po_id)
            .collect();

        purchase_order_item::Entity::delete_many()
            .filter(purchase_order_item::Column::ItemId.eq(item_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        stock_in_record::Entity::delete_many()
            .filter(stock_in_record::Column::ItemId.eq(item_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        inventory_item::Entity::delete_by_id(item_id.to_string())
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        for po_id in &affected_orders {
            recompute_total(&txn, po_id).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(item_id, purchase_orders = affected_orders.len(), "inventory item deleted");
        Ok(())
    }

    /// Administrative stock correction.
    #[instrument(skip(self, input))]
    pub async fn decrease_quantity(
        &self,
        item_id: &str,
        input: DecreaseQuantity,
    ) -> Result<DecreaseOutcome, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let outcome = InventoryMutator::decrease(&txn, item_id, input.quantity).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(
            item_id,
            applied = outcome.applied,
            reason = input.reason.as_deref().unwrap_or(""),
            "inventory decreased"
        );
        Ok(outcome)
    }
}
