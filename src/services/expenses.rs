use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
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
use super::validators::{not_blank, positive};
use crate::{db::DbPool, errors::ServiceError, models::expense};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateExpense {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub category: String,
    #[schema(value_type = String, example = "1500.00")]
    #[validate(custom = "positive")]
    pub amount: Decimal,
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub paid_to: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateExpense {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub category: Option<String>,
    #[schema(value_type = Option<String>)]
    #[validate(custom = "positive")]
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub paid_to: Option<String>,
    pub description: Option<String>,
}

fn not_found(expense_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Expense {} not found", expense_id))
}

/// Service for operating expenses
#[derive(Clone)]
pub struct ExpenseService {
    db_pool: Arc<DbPool>,
}

impl ExpenseService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(category = %input.category))]
    pub async fn create_expense(
        &self,
        input: CreateExpense,
        created_by: Option<Uuid>,
    ) -> Result<expense::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let now = Utc::now();
        let expense_id =
            IdentifierAllocator::allocate(&txn, IdKind::Expense, now.date_naive(), "").await?;
        let model = expense::ActiveModel {
            expense_id: Set(expense_id.clone()),
            category: Set(input.category.trim().to_string()),
            amount: Set(input.amount),
            date: Set(input.date),
            paid_to: Set(input.paid_to.trim().to_string()),
            description: Set(input.description),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_insert(e, &expense_id))?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(expense_id = %model.expense_id, amount = %model.amount, "expense recorded");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_expense(&self, expense_id: &str) -> Result<expense::Model, ServiceError> {
        let db = &*self.db_pool;
        expense::Entity::find_by_id(expense_id.to_string())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| not_found(expense_id))
    }

    /// Lists expenses, most recent date first
    #[instrument(skip(self))]
    pub async fn list_expenses(
        &self,
        category: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<expense::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = expense::Entity::find();
        if let Some(category) = category {
            query = query.filter(expense::Column::Category.eq(category));
        }
        let paginator = query
            .order_by_desc(expense::Column::Date)
            .order_by_desc(expense::Column::ExpenseId)
            .paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let expenses = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((expenses, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_expense(
        &self,
        expense_id: &str,
        input: UpdateExpense,
    ) -> Result<expense::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_expense(expense_id).await?;

        let mut active: expense::ActiveModel = existing.into();
        if let Some(category) = input.category {
            active.category = Set(category.trim().to_string());
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(paid_to) = input.paid_to {
            active.paid_to = Set(paid_to.trim().to_string());
        }
        if input.description.is_some() {
            active.description = Set(input.description);
        }
        active.updated_at = Set(Utc::now());

        let db = &*self.db_pool;
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(expense_id, "expense updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_expense(&self, expense_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let result = expense::Entity::delete_by_id(expense_id.to_string())
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(not_found(expense_id));
        }
        info!(expense_id, "expense deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    async fn service() -> ExpenseService {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        };
        let db = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&db).await.unwrap();
        ExpenseService::new(Arc::new(db))
    }

    fn fuel(amount: Decimal) -> CreateExpense {
        CreateExpense {
            category: "Fuel".into(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            paid_to: "Petron".into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn expenses_get_sequential_ids() {
        let svc = service().await;
        let first = svc.create_expense(fuel(dec!(1500.00)), None).await.unwrap();
        let second = svc.create_expense(fuel(dec!(820.50)), None).await.unwrap();
        assert_eq!(first.expense_id, "EXP-001");
        assert_eq!(second.expense_id, "EXP-002");
        assert_eq!(second.amount, dec!(820.50));
    }

    #[tokio::test]
    async fn amount_must_be_positive() {
        let svc = service().await;
        assert_matches!(
            svc.create_expense(fuel(Decimal::ZERO), None).await,
            Err(ServiceError::ValidationError(_))
        );

        let created = svc.create_expense(fuel(dec!(10)), None).await.unwrap();
        let update = UpdateExpense {
            amount: Some(dec!(-5)),
            ..Default::default()
        };
        assert_matches!(
            svc.update_expense(&created.expense_id, update).await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn deleting_unknown_expense_is_not_found() {
        let svc = service().await;
        assert_matches!(
            svc.delete_expense("EXP-999").await,
            Err(ServiceError::NotFound(_))
        );
    }
}
