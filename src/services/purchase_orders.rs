use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::identifiers::{IdKind, IdentifierAllocator};
use super::inventory::{require_item, require_supplier};
use super::validators::{non_negative, MAX_TOTAL};
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        purchase_order, purchase_order_item, stock_in_record, supplier,
        status::{parse_status, stamp_once, PurchaseOrderStatus},
    },
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct PurchaseOrderLineInput {
    #[serde(alias = "item")]
    #[validate(length(min = 1))]
    pub item_id: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub uom: String,
    #[serde(default)]
    #[schema(value_type = String, example = "10.00")]
    #[validate(custom = "non_negative")]
    pub unit_price: Decimal,
    #[validate(range(min = 0))]
    pub checked_quantity: Option<i32>,
    #[validate(length(max = 20))]
    pub checked_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderLine {
    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub quantity: Option<i32>,
    #[validate(length(max = 20))]
    pub uom: Option<String>,
    #[schema(value_type = Option<String>)]
    #[validate(custom = "non_negative")]
    pub unit_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub checked_quantity: Option<i32>,
    #[validate(length(max = 20))]
    pub checked_status: Option<String>,
}

/// New purchase order. A `total_cost` in the body is ignored.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreatePurchaseOrder {
    #[serde(alias = "supplier")]
    #[validate(length(min = 1))]
    pub supplier_id: String,
    pub ordered_by: Option<Uuid>,
    pub expected_delivery: Option<NaiveDate>,
    pub status: Option<String>,
    pub remarks: Option<String>,
    #[serde(default)]
    #[validate]
    pub items: Vec<PurchaseOrderLineInput>,
}

/// Partial update. When `items` is present the order's lines are replaced.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrder {
    #[serde(alias = "supplier")]
    pub supplier_id: Option<String>,
    pub ordered_by: Option<Uuid>,
    pub expected_delivery: Option<NaiveDate>,
    pub status: Option<String>,
    pub remarks: Option<String>,
    pub items: Option<Vec<PurchaseOrderLineInput>>,
}

/// A purchase order with its lines and supplier name.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderView {
    #[serde(flatten)]
    pub order: purchase_order::Model,
    pub supplier_name: Option<String>,
    pub items: Vec<purchase_order_item::Model>,
}

/// Recomputes every line total of a purchase order and stores their sum as
/// the order's `total_cost`. Returns the new total.
#[instrument(skip(conn))]
pub async fn recompute_total<C>(conn: &C, po_id: &str) -> Result<Decimal, ServiceError>
where
    C: ConnectionTrait,
{
    let lines = purchase_order_item::Entity::find()
        .filter(purchase_order_item::Column::PoId.eq(po_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut total = Decimal::ZERO;
    for line in lines {
        let line_total = line_total(line.quantity, line.unit_price)?;
        if line.total_price != line_total {
            let mut active: purchase_order_item::ActiveModel = line.into();
            active.total_price = Set(line_total);
            active.update(conn).await.map_err(ServiceError::db_error)?;
        }
        total = total
            .checked_add(line_total)
            .filter(|sum| *sum <= MAX_TOTAL)
            .ok_or_else(total_too_large)?;
    }

    purchase_order::Entity::update_many()
        .col_expr(
            purchase_order::Column::TotalCost,
            sea_orm::sea_query::Expr::value(total),
        )
        .filter(purchase_order::Column::PoId.eq(po_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    debug!(po_id, %total, "purchase order total recomputed");
    Ok(total)
}

fn total_too_large() -> ServiceError {
    ServiceError::ValidationError(format!(
        "Purchase order total must not exceed {}",
        MAX_TOTAL
    ))
}

fn line_total(quantity: i32, unit_price: Decimal) -> Result<Decimal, ServiceError> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(|total| total.round_dp(2))
        .filter(|total| *total <= MAX_TOTAL)
        .ok_or_else(total_too_large)
}

fn order_not_found(po_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Purchase order {} not found", po_id))
}

async fn load_order<C: ConnectionTrait>(
    conn: &C,
    po_id: &str,
) -> Result<purchase_order::Model, ServiceError> {
    purchase_order::Entity::find_by_id(po_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| order_not_found(po_id))
}

async fn insert_line<C: ConnectionTrait>(
    conn: &C,
    po_id: &str,
    line: PurchaseOrderLineInput,
) -> Result<purchase_order_item::Model, ServiceError> {
    require_item(conn, &line.item_id).await?;
    purchase_order_item::ActiveModel {
        po_id: Set(po_id.to_string()),
        item_id: Set(line.item_id),
        quantity: Set(line.quantity),
        uom: Set(line.uom),
        unit_price: Set(line.unit_price),
        total_price: Set(line_total(line.quantity, line.unit_price)?),
        checked_quantity: Set(line.checked_quantity),
        checked_status: Set(line.checked_status),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)
}

/// Applies a status, stamping `date_delivered` on the first move into Completed.
fn apply_status(
    active: &mut purchase_order::ActiveModel,
    current_delivered: Option<NaiveDate>,
    status: PurchaseOrderStatus,
    today: NaiveDate,
) {
    active.status = Set(status);
    if status == PurchaseOrderStatus::Completed {
        active.date_delivered = Set(stamp_once(current_delivered, today));
    }
}

/// Service for purchase orders and their lines
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates a purchase order and its lines in one transaction
    #[instrument(skip(self, input), fields(supplier_id = %input.supplier_id))]
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrder,
        ordered_by: Option<Uuid>,
    ) -> Result<PurchaseOrderView, ServiceError> {
        input.validate()?;
        let status = match input.status.as_deref() {
            Some(raw) => parse_status::<PurchaseOrderStatus>("purchase order", raw)?,
            None => PurchaseOrderStatus::Pending,
        };

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        require_supplier(&txn, &input.supplier_id).await?;

        let now = Utc::now();
        let po_id =
            IdentifierAllocator::allocate(&txn, IdKind::PurchaseOrder, now.date_naive(), "")
                .await?;

        let mut active = purchase_order::ActiveModel {
            po_id: Set(po_id.clone()),
            supplier_id: Set(input.supplier_id),
            ordered_by: Set(input.ordered_by.or(ordered_by)),
            status: Set(PurchaseOrderStatus::Pending),
            date_ordered: Set(now),
            expected_delivery: Set(input.expected_delivery),
            date_delivered: Set(None),
            remarks: Set(input.remarks),
            total_cost: Set(Decimal::ZERO),
        };
        apply_status(&mut active, None, status, now.date_naive());
        active
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::from_insert(e, &po_id))?;

        for line in input.items {
            insert_line(&txn, &po_id, line).await?;
        }
        recompute_total(&txn, &po_id).await?;

        let view = self.view_in(&txn, &po_id).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(po_id = %po_id, total_cost = %view.order.total_cost, "purchase order created");
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(&self, po_id: &str) -> Result<PurchaseOrderView, ServiceError> {
        self.view_in(&*self.db_pool, po_id).await
    }

    async fn view_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        po_id: &str,
    ) -> Result<PurchaseOrderView, ServiceError> {
        let order = load_order(conn, po_id).await?;
        let supplier_name = order
            .find_related(supplier::Entity)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .map(|s| s.supplier_name);
        let items = purchase_order_item::Entity::find()
            .filter(purchase_order_item::Column::PoId.eq(po_id))
            .order_by_asc(purchase_order_item::Column::Id)
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(PurchaseOrderView {
            order,
            supplier_name,
            items,
        })
    }

    /// Lists purchase orders, newest identifier first
    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        status: Option<String>,
        supplier_id: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = purchase_order::Entity::find();
        if let Some(raw) = status {
            let status: PurchaseOrderStatus = parse_status("purchase order", &raw)?;
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        if let Some(supplier_id) = supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }

        let paginator = query
            .order_by_desc(purchase_order::Column::PoId)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((orders, total))
    }

    /// Updates header fields (and optionally replaces lines); the total is
    /// always recomputed from the stored lines.
    #[instrument(skip(self, input))]
    pub async fn update_purchase_order(
        &self,
        po_id: &str,
        input: UpdatePurchaseOrder,
    ) -> Result<PurchaseOrderView, ServiceError> {
        input.validate()?;
        for line in input.items.iter().flatten() {
            line.validate()?;
        }
        let status = input
            .status
            .as_deref()
            .map(|raw| parse_status::<PurchaseOrderStatus>("purchase order", raw))
            .transpose()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let existing = load_order(&txn, po_id).await?;
        if let Some(supplier_id) = input.supplier_id.as_deref() {
            require_supplier(&txn, supplier_id).await?;
        }

        let delivered = existing.date_delivered;
        let mut active: purchase_order::ActiveModel = existing.into();
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(supplier_id);
        }
        if input.ordered_by.is_some() {
            active.ordered_by = Set(input.ordered_by);
        }
        if input.expected_delivery.is_some() {
            active.expected_delivery = Set(input.expected_delivery);
        }
        if input.remarks.is_some() {
            active.remarks = Set(input.remarks);
        }
        if let Some(status) = status {
            apply_status(&mut active, delivered, status, Utc::now().date_naive());
        }
        active.update(&txn).await.map_err(ServiceError::db_error)?;

        if let Some(lines) = input.items {
            purchase_order_item::Entity::delete_many()
                .filter(purchase_order_item::Column::PoId.eq(po_id))
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            for line in lines {
                insert_line(&txn, po_id, line).await?;
            }
        }
        recompute_total(&txn, po_id).await?;

        let view = self.view_in(&txn, po_id).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(po_id, status = %view.order.status, "purchase order updated");
        Ok(view)
    }

    /// Changes only the status. Unknown labels leave the order untouched.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        po_id: &str,
        raw_status: &str,
    ) -> Result<purchase_order::Model, ServiceError> {
        let status: PurchaseOrderStatus = parse_status("purchase order", raw_status)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let existing = load_order(&txn, po_id).await?;
        let delivered = existing.date_delivered;
        let mut active: purchase_order::ActiveModel = existing.into();
        apply_status(&mut active, delivered, status, Utc::now().date_naive());
        active.update(&txn).await.map_err(ServiceError::db_error)?;
        recompute_total(&txn, po_id).await?;

        let updated = load_order(&txn, po_id).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(po_id, status = %updated.status, "purchase order status changed");
        Ok(updated)
    }

    /// Deletes a purchase order with its lines; stock-ins keep their history
    /// but lose the reference.
    #[instrument(skip(self))]
    pub async fn delete_purchase_order(&self, po_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        load_order(&txn, po_id).await?;
        delete_orders(&txn, vec![po_id.to_string()]).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(po_id, "purchase order deleted");
        Ok(())
    }

    #[instrument(skip(self, line))]
    pub async fn add_line(
        &self,
        po_id: &str,
        line: PurchaseOrderLineInput,
    ) -> Result<PurchaseOrderView, ServiceError> {
        line.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        load_order(&txn, po_id).await?;
        insert_line(&txn, po_id, line).await?;
        recompute_total(&txn, po_id).await?;
        let view = self.view_in(&txn, po_id).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        Ok(view)
    }

    #[instrument(skip(self, input))]
    pub async fn update_line(
        &self,
        po_id: &str,
        line_id: i32,
        input: UpdatePurchaseOrderLine,
    ) -> Result<PurchaseOrderView, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let line = load_line(&txn, po_id, line_id).await?;

        let mut active: purchase_order_item::ActiveModel = line.clone().into();
        let quantity = input.quantity.unwrap_or(line.quantity);
        let unit_price = input.unit_price.unwrap_or(line.unit_price);
        active.quantity = Set(quantity);
        active.unit_price = Set(unit_price);
        active.total_price = Set(line_total(quantity, unit_price)?);
        if let Some(uom) = input.uom {
            active.uom = Set(uom);
        }
        if input.checked_quantity.is_some() {
            active.checked_quantity = Set(input.checked_quantity);
        }
        if input.checked_status.is_some() {
            active.checked_status = Set(input.checked_status);
        }
        active.update(&txn).await.map_err(ServiceError::db_error)?;

        recompute_total(&txn, po_id).await?;
        let view = self.view_in(&txn, po_id).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn remove_line(
        &self,
        po_id: &str,
        line_id: i32,
    ) -> Result<PurchaseOrderView, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let line = load_line(&txn, po_id, line_id).await?;
        line.delete(&txn).await.map_err(ServiceError::db_error)?;
        recompute_total(&txn, po_id).await?;
        let view = self.view_in(&txn, po_id).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;
        Ok(view)
    }
}

async fn load_line<C: ConnectionTrait>(
    conn: &C,
    po_id: &str,
    line_id: i32,
) -> Result<purchase_order_item::Model, ServiceError> {
    load_order(conn, po_id).await?;
    purchase_order_item::Entity::find_by_id(line_id)
        .filter(purchase_order_item::Column::PoId.eq(po_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Line {} not found on purchase order {}", line_id, po_id))
        })
}

/// Removes purchase orders and their lines, detaching any stock-in records.
pub(crate) async fn delete_orders<C: ConnectionTrait>(
    conn: &C,
    po_ids: Vec<String>,
) -> Result<(), ServiceError> {
    if po_ids.is_empty() {
        return Ok(());
    }
    stock_in_record::Entity::update_many()
        .col_expr(
            stock_in_record::Column::PurchaseOrderId,
            sea_orm::sea_query::Expr::value(Option::<String>::None),
        )
        .filter(stock_in_record::Column::PurchaseOrderId.is_in(po_ids.clone()))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    purchase_order_item::Entity::delete_many()
        .filter(purchase_order_item::Column::PoId.is_in(po_ids.clone()))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    purchase_order::Entity::delete_many()
        .filter(purchase_order::Column::PoId.is_in(po_ids))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::services::inventory::{CreateInventoryItem, InventoryService};
    use crate::services::suppliers::{CreateSupplier, SupplierService};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    async fn seeded() -> PurchaseOrderService {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        };
        let db = Arc::new(establish_connection_with_config(&config).await.unwrap());
        run_migrations(&db).await.unwrap();

        SupplierService::new(db.clone())
            .create_supplier(CreateSupplier {
                supplier_name: "Acme Hardware".into(),
                contact_no: "09171234567".into(),
                email: "sales@acme.test".into(),
                address: "12 Wharf Road".into(),
            })
            .await
            .unwrap();
        InventoryService::new(db.clone())
            .create_item(CreateInventoryItem {
                item_name: "Hex bolt".into(),
                brand: None,
                category: "Hardware".into(),
                size: None,
                quantity: 10,
                uom: "pcs".into(),
                cost_price: dec!(5),
                selling_price: dec!(8),
                supplier_id: Some("SUI-0001".into()),
            })
            .await
            .unwrap();
        PurchaseOrderService::new(db)
    }

    fn line(quantity: i32, unit_price: Decimal) -> PurchaseOrderLineInput {
        PurchaseOrderLineInput {
            item_id: "IT-0001".into(),
            quantity,
            uom: "box".into(),
            unit_price,
            checked_quantity: None,
            checked_status: None,
        }
    }

    fn order(items: Vec<PurchaseOrderLineInput>) -> CreatePurchaseOrder {
        CreatePurchaseOrder {
            supplier_id: "SUI-0001".into(),
            ordered_by: None,
            expected_delivery: None,
            status: None,
            remarks: None,
            items,
        }
    }

    #[test]
    fn line_totals_round_to_cents() {
        assert_eq!(line_total(3, dec!(0.333)).unwrap(), dec!(1.00));
        assert_eq!(line_total(4, dec!(10)).unwrap(), dec!(40));
    }

    #[test]
    fn oversized_line_totals_are_rejected() {
        assert_matches!(
            line_total(3, dec!(50000000000000000000000000000)),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            line_total(i32::MAX, dec!(99999999.99)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn oversized_unit_price_fails_validation() {
        let svc = seeded().await;
        assert_matches!(
            svc.create_purchase_order(order(vec![line(3, dec!(50000000000000000000000000000))]), None)
                .await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn lines_added_to_an_empty_order_sum_into_the_total() {
        let svc = seeded().await;
        let view = svc.create_purchase_order(order(vec![]), None).await.unwrap();
        assert_eq!(view.order.total_cost, Decimal::ZERO);

        let po_id = view.order.po_id;
        svc.add_line(&po_id, line(3, dec!(10.00))).await.unwrap();
        let view = svc.add_line(&po_id, line(2, dec!(5.00))).await.unwrap();

        assert_eq!(view.items.len(), 2);
        assert_eq!(view.order.total_cost, dec!(40.00));
    }

    #[tokio::test]
    async fn total_follows_line_changes() {
        let svc = seeded().await;
        let view = svc
            .create_purchase_order(order(vec![line(4, dec!(10.00))]), None)
            .await
            .unwrap();
        assert_eq!(view.order.total_cost, dec!(40));

        let line_id = view.items[0].id;
        let view = svc
            .update_line(
                &view.order.po_id,
                line_id,
                UpdatePurchaseOrderLine {
                    quantity: Some(6),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.order.total_cost, dec!(60));

        let view = svc.remove_line(&view.order.po_id, line_id).await.unwrap();
        assert_eq!(view.order.total_cost, Decimal::ZERO);
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn completion_date_is_kept_once_set() {
        let svc = seeded().await;
        let view = svc.create_purchase_order(order(vec![]), None).await.unwrap();
        let po_id = view.order.po_id;

        let completed = svc.update_status(&po_id, "Completed").await.unwrap();
        let delivered = completed.date_delivered;
        assert!(delivered.is_some());

        let cancelled = svc.update_status(&po_id, "Cancelled").await.unwrap();
        assert_eq!(cancelled.status, PurchaseOrderStatus::Cancelled);
        assert_eq!(cancelled.date_delivered, delivered);

        let err = svc.update_status(&po_id, "Shipped").await.unwrap_err();
        assert_matches!(err, ServiceError::InvalidStatus(_));
    }

    #[tokio::test]
    async fn lines_must_reference_known_items() {
        let svc = seeded().await;
        let mut bad = line(1, dec!(1));
        bad.item_id = "IT-9999".into();
        let err = svc
            .create_purchase_order(order(vec![bad]), None)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }
}
