use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::identifiers::{IdKind, IdentifierAllocator};
use super::validators::{non_negative, normalize_phone, not_blank, validate_phone};
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        delivery, order,
        status::{stamp_once, OrderStatus, OrderStatusVocabulary},
    },
};

fn json_array(value: &Value) -> Result<(), ValidationError> {
    if value.is_array() {
        Ok(())
    } else {
        let mut err = ValidationError::new("array");
        err.message = Some("Must be a list of items.".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateOrder {
    #[validate(custom = "validate_phone")]
    #[schema(example = "09171234567")]
    pub contact: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub customer_name: String,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub company: String,
    #[validate(length(min = 1))]
    pub shipping_address: String,
    #[schema(value_type = Vec<Object>)]
    #[validate(custom = "json_array")]
    pub items: Value,
    #[schema(value_type = String, example = "1250.00")]
    #[validate(custom = "non_negative")]
    pub total_amount: Decimal,
    pub status: Option<String>,
    pub placed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateOrder {
    #[validate(custom = "validate_phone")]
    pub contact: Option<String>,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub customer_name: Option<String>,
    #[validate(length(max = 255))]
    pub company: Option<String>,
    #[validate(length(min = 1))]
    pub shipping_address: Option<String>,
    #[schema(value_type = Option<Vec<Object>>)]
    #[validate(custom = "json_array")]
    pub items: Option<Value>,
    #[schema(value_type = Option<String>)]
    #[validate(custom = "non_negative")]
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
    pub placed_by: Option<String>,
}

/// Sets the status and stamps the matching timestamp if it is still empty.
fn apply_status(
    active: &mut order::ActiveModel,
    current: &order::Model,
    status: OrderStatus,
    now: DateTime<Utc>,
) {
    active.status = Set(status);
    match status {
        OrderStatus::Pending => {}
        OrderStatus::OrderConfirmed => {
            active.confirmed_at = Set(stamp_once(current.confirmed_at, now));
        }
        OrderStatus::Packed => active.packed_at = Set(stamp_once(current.packed_at, now)),
        OrderStatus::InTransit => {
            active.in_transit_at = Set(stamp_once(current.in_transit_at, now));
        }
        OrderStatus::Delivered => {
            active.delivered_at = Set(stamp_once(current.delivered_at, now));
        }
        OrderStatus::Cancelled => {
            active.cancelled_at = Set(stamp_once(current.cancelled_at, now));
        }
    }
}

fn not_found(order_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Order {} not found", order_id))
}

/// Service for customer orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    vocabulary: OrderStatusVocabulary,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, vocabulary: OrderStatusVocabulary) -> Self {
        Self {
            db_pool,
            vocabulary,
        }
    }

    pub fn vocabulary(&self) -> OrderStatusVocabulary {
        self.vocabulary
    }

    #[instrument(skip(self, input), fields(customer_email = %input.customer_email))]
    pub async fn create_order(
        &self,
        input: CreateOrder,
        updated_by: Option<Uuid>,
    ) -> Result<order::Model, ServiceError> {
        input.validate()?;
        let status = match input.status.as_deref() {
            Some(raw) => self.vocabulary.parse(raw)?,
            None => OrderStatus::Pending,
        };

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let now = Utc::now();
        let order_id =
            IdentifierAllocator::allocate(&txn, IdKind::Order, now.date_naive(), "").await?;

        let blank = order::Model {
            order_id: order_id.clone(),
            contact: normalize_phone(&input.contact),
            customer_email: input.customer_email,
            customer_name: input.customer_name.trim().to_string(),
            company: input.company,
            shipping_address: input.shipping_address,
            items: input.items,
            total_amount: input.total_amount,
            status: OrderStatus::Pending,
            date_ordered: Some(now),
            confirmed_at: None,
            packed_at: None,
            in_transit_at: None,
            delivered_at: None,
            cancelled_at: None,
            placed_by: input.placed_by,
            updated_by,
        };
        let mut active: order::ActiveModel = blank.clone().into();
        apply_status(&mut active, &blank, status, now);
        let model = active
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::from_insert(e, &order_id))?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(order_id = %model.order_id, status = %model.status, "order created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: &str) -> Result<order::Model, ServiceError> {
        let db = &*self.db_pool;
        order::Entity::find_by_id(order_id.to_string())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(order_id))
    }

    /// Lists orders, newest first
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = order::Entity::find();
        if let Some(raw) = status {
            query = query.filter(order::Column::Status.eq(self.vocabulary.parse(&raw)?));
        }
        let paginator = query
            .order_by_desc(order::Column::DateOrdered)
            .order_by_desc(order::Column::OrderId)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((orders, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_order(
        &self,
        order_id: &str,
        input: UpdateOrder,
        updated_by: Option<Uuid>,
    ) -> Result<order::Model, ServiceError> {
        input.validate()?;
        let status = input
            .status
            .as_deref()
            .map(|raw| self.vocabulary.parse(raw))
            .transpose()?;
        let existing = self.get_order(order_id).await?;

        let mut active: order::ActiveModel = existing.clone().into();
        if let Some(contact) = input.contact {
            active.contact = Set(normalize_phone(&contact));
        }
        if let Some(email) = input.customer_email {
            active.customer_email = Set(email);
        }
        if let Some(name) = input.customer_name {
            active.customer_name = Set(name.trim().to_string());
        }
        if let Some(company) = input.company {
            active.company = Set(company);
        }
        if let Some(address) = input.shipping_address {
            active.shipping_address = Set(address);
        }
        if let Some(items) = input.items {
            active.items = Set(items);
        }
        if let Some(total) = input.total_amount {
            active.total_amount = Set(total);
        }
        if input.placed_by.is_some() {
            active.placed_by = Set(input.placed_by);
        }
        if let Some(status) = status {
            apply_status(&mut active, &existing, status, Utc::now());
        }
        active.updated_by = Set(updated_by.or(existing.updated_by));

        let db = &*self.db_pool;
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(order_id, "order updated");
        Ok(updated)
    }

    /// Changes only the status. Unknown labels leave the order untouched.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: &str,
        raw_status: &str,
        updated_by: Option<Uuid>,
    ) -> Result<order::Model, ServiceError> {
        let status = self.vocabulary.parse(raw_status)?;
        let existing = self.get_order(order_id).await?;

        let mut active: order::ActiveModel = existing.clone().into();
        apply_status(&mut active, &existing, status, Utc::now());
        active.updated_by = Set(updated_by.or(existing.updated_by));

        let db = &*self.db_pool;
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(order_id, status = %updated.status, "order status changed");
        Ok(updated)
    }

    /// Deletes an order and its delivery
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        delivery::Entity::delete_many()
            .filter(delivery::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let result = order::Entity::delete_by_id(order_id.to_string())
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(not_found(order_id));
        }
        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(order_id, "order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    async fn service(vocabulary: OrderStatusVocabulary) -> OrderService {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        };
        let db = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&db).await.unwrap();
        OrderService::new(Arc::new(db), vocabulary)
    }

    fn new_order() -> CreateOrder {
        CreateOrder {
            contact: "09171234567".into(),
            customer_email: "buyer@example.com".into(),
            customer_name: "Maria Santos".into(),
            company: "Santos Hardware".into(),
            shipping_address: "12 Rizal St, Quezon City".into(),
            items: json!([{ "item_id": "IT-0001", "quantity": 2 }]),
            total_amount: dec!(500.00),
            status: None,
            placed_by: Some("Maria Santos".into()),
        }
    }

    #[tokio::test]
    async fn status_changes_stamp_once() {
        let svc = service(OrderStatusVocabulary::Fulfillment).await;
        let created = svc.create_order(new_order(), None).await.unwrap();
        assert_eq!(created.order_id, "ORD-0001");
        assert!(created.date_ordered.is_some());

        let packed = svc.update_status(&created.order_id, "Packed", None).await.unwrap();
        let first_stamp = packed.packed_at.unwrap();
        svc.update_status(&created.order_id, "In Transit", None).await.unwrap();
        let repacked = svc.update_status(&created.order_id, "Packed", None).await.unwrap();
        assert_eq!(repacked.packed_at, Some(first_stamp));
        assert!(repacked.in_transit_at.is_some());
    }

    #[tokio::test]
    async fn statuses_outside_vocabulary_are_rejected() {
        let svc = service(OrderStatusVocabulary::Confirmation).await;
        let created = svc.create_order(new_order(), None).await.unwrap();

        assert_matches!(
            svc.update_status(&created.order_id, "In Transit", None).await,
            Err(ServiceError::InvalidStatus(_))
        );
        assert_eq!(svc.get_order(&created.order_id).await.unwrap().status, OrderStatus::Pending);

        let confirmed = svc
            .update_status(&created.order_id, "Order Confirmed", None)
            .await
            .unwrap();
        assert!(confirmed.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn items_must_be_a_list() {
        let svc = service(OrderStatusVocabulary::Fulfillment).await;
        let mut input = new_order();
        input.items = json!({ "item_id": "IT-0001" });
        assert_matches!(
            svc.create_order(input, None).await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn contact_must_be_a_mobile_number() {
        let svc = service(OrderStatusVocabulary::Fulfillment).await;
        let mut input = new_order();
        input.contact = "call the front desk".into();
        assert_matches!(
            svc.create_order(input, None).await,
            Err(ServiceError::ValidationError(_))
        );

        let created = svc.create_order(new_order(), None).await.unwrap();
        assert_eq!(created.contact, "+63 917 123 4567");

        let update = UpdateOrder {
            contact: Some("12345".into()),
            ..Default::default()
        };
        assert_matches!(
            svc.update_order(&created.order_id, update, None).await,
            Err(ServiceError::ValidationError(_))
        );
    }
}
