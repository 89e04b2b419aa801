//! Human-readable key allocation.
//!
//! Every generated key is backed by a row in `id_sequences`, one per scope.
//! Allocation is an atomic `last_value = last_value + 1` inside the caller's
//! transaction, so two concurrent creations never observe the same value. The
//! first allocation in a scope seeds the counter from the highest well-formed
//! key already stored, which keeps numbering continuous for imported data.

use chrono::NaiveDate;
use sea_orm::{
    sea_query::{Alias, Expr, OnConflict, Query},
    ActiveValue::Set,
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{errors::ServiceError, models::id_sequence};

/// Shape of stock-in record identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockInIdFormat {
    /// `SI-001<DDMMYYYY><initials>`; the counter is global, the date is informative.
    #[default]
    Dated,
    /// `STI-0001`
    Sequential,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdKind {
    Supplier,
    InventoryItem,
    PurchaseOrder,
    StockIn(StockInIdFormat),
    Staff,
    Customer,
    Order,
    Delivery,
    Expense,
    Vehicle,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Supplier => "SUI",
            IdKind::InventoryItem => "IT",
            IdKind::PurchaseOrder => "PO",
            IdKind::StockIn(StockInIdFormat::Dated) => "SI",
            IdKind::StockIn(StockInIdFormat::Sequential) => "STI",
            IdKind::Staff => "EMP",
            IdKind::Customer => "CUS",
            IdKind::Order => "ORD",
            IdKind::Delivery => "DEL",
            IdKind::Expense => "EXP",
            IdKind::Vehicle => "VIN",
        }
    }

    /// Minimum digits of the sequence part; larger values simply widen.
    pub fn width(self) -> usize {
        match self {
            IdKind::StockIn(StockInIdFormat::Dated) | IdKind::Expense | IdKind::Vehicle => 3,
            _ => 4,
        }
    }

    /// Table and column holding keys of this kind.
    fn source(self) -> (&'static str, &'static str) {
        match self {
            IdKind::Supplier => ("suppliers", "supplier_id"),
            IdKind::InventoryItem => ("inventory_items", "item_id"),
            IdKind::PurchaseOrder => ("purchase_orders", "po_id"),
            IdKind::StockIn(_) => ("stock_in_records", "stockin_id"),
            IdKind::Staff => ("staff_profiles", "staff_id"),
            IdKind::Customer => ("profiles", "customer_id"),
            IdKind::Order => ("orders", "order_id"),
            IdKind::Delivery => ("deliveries", "delivery_id"),
            IdKind::Expense => ("expenses", "expense_id"),
            IdKind::Vehicle => ("vehicles", "vehicle_id"),
        }
    }

    /// Counter row name. Deliveries restart every day.
    pub fn scope(self, date: NaiveDate) -> String {
        match self {
            IdKind::Delivery => format!("{}-{}", self.prefix(), date.format("%Y%m%d")),
            _ => self.prefix().to_string(),
        }
    }

    /// Key prefix shared by every id in `scope`, used when seeding.
    fn scope_prefix(self, date: NaiveDate) -> String {
        format!("{}-", self.scope(date))
    }

    /// Renders `<PREFIX>-<zero padded seq>`.
    pub fn format(self, seq: i64) -> String {
        format!("{}-{:0width$}", self.prefix(), seq, width = self.width())
    }

    /// Renders the full key, including the date and initials used by dated kinds.
    pub fn render(self, seq: i64, date: NaiveDate, initials: &str) -> String {
        match self {
            IdKind::Delivery => format!(
                "{}-{:0width$}",
                self.scope(date),
                seq,
                width = self.width()
            ),
            IdKind::StockIn(StockInIdFormat::Dated) => format!(
                "{}-{:0width$}{}{}",
                self.prefix(),
                seq,
                date.format("%d%m%Y"),
                initials,
                width = self.width()
            ),
            _ => self.format(seq),
        }
    }
}

/// Extracts the sequence number from a key of the given kind.
///
/// Returns `None` for a different prefix or a malformed suffix.
pub fn parse_sequence(kind: IdKind, id: &str) -> Option<i64> {
    let rest = id.strip_prefix(kind.prefix())?.strip_prefix('-')?;
    match kind {
        IdKind::Delivery => {
            let (date, seq) = rest.split_once('-')?;
            if date.len() != 8 || !all_digits(date) {
                return None;
            }
            parse_digits(seq)
        }
        IdKind::StockIn(StockInIdFormat::Dated) => {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (digits, initials) = rest.split_at(digits_end);
            if digits.len() <= 8 || !initials.chars().all(|c| c.is_ascii_alphabetic()) {
                return None;
            }
            parse_digits(&digits[..digits.len() - 8])
        }
        _ => parse_digits(rest),
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn parse_digits(s: &str) -> Option<i64> {
    if all_digits(s) {
        s.parse().ok()
    } else {
        None
    }
}

pub struct IdentifierAllocator;

impl IdentifierAllocator {
    /// Reserves the next sequence value for `kind`.
    #[instrument(skip(conn))]
    pub async fn next_sequence<C>(
        conn: &C,
        kind: IdKind,
        date: NaiveDate,
    ) -> Result<i64, ServiceError>
    where
        C: ConnectionTrait,
    {
        let scope = kind.scope(date);

        if !Self::bump(conn, &scope).await? {
            let seed = Self::highest_existing(conn, kind, date).await?;
            let inserted = id_sequence::Entity::insert(id_sequence::ActiveModel {
                scope: Set(scope.clone()),
                last_value: Set(seed + 1),
            })
            .on_conflict(
                OnConflict::column(id_sequence::Column::Scope)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(ServiceError::db_error)?;

            // Another writer created the row first.
            if inserted == 0 && !Self::bump(conn, &scope).await? {
                return Err(ServiceError::InternalError(format!(
                    "id sequence {} could not be advanced",
                    scope
                )));
            }
        }

        let row = id_sequence::Entity::find_by_id(scope.clone())
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("id sequence {} vanished", scope))
            })?;

        debug!(scope = %scope, value = row.last_value, "allocated sequence value");
        Ok(row.last_value)
    }

    /// Allocates and renders a complete key.
    pub async fn allocate<C>(
        conn: &C,
        kind: IdKind,
        date: NaiveDate,
        initials: &str,
    ) -> Result<String, ServiceError>
    where
        C: ConnectionTrait,
    {
        let seq = Self::next_sequence(conn, kind, date).await?;
        Ok(kind.render(seq, date, initials))
    }

    async fn bump<C: ConnectionTrait>(conn: &C, scope: &str) -> Result<bool, ServiceError> {
        let result = id_sequence::Entity::update_many()
            .col_expr(
                id_sequence::Column::LastValue,
                Expr::col(id_sequence::Column::LastValue).add(1),
            )
            .filter(id_sequence::Column::Scope.eq(scope))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(result.rows_affected > 0)
    }

    /// Numeric maximum of well-formed keys in the scope, or 0 when none exist.
    async fn highest_existing<C: ConnectionTrait>(
        conn: &C,
        kind: IdKind,
        date: NaiveDate,
    ) -> Result<i64, ServiceError> {
        let (table, column) = kind.source();
        let stmt = Query::select()
            .column(Alias::new(column))
            .from(Alias::new(table))
            .and_where(Expr::col(Alias::new(column)).like(format!("{}%", kind.scope_prefix(date))))
            .to_owned();

        let rows = conn
            .query_all(conn.get_database_backend().build(&stmt))
            .await
            .map_err(ServiceError::db_error)?;

        let mut highest = 0;
        for row in rows {
            let key: Option<String> = row.try_get("", column).map_err(ServiceError::db_error)?;
            if let Some(seq) = key.as_deref().and_then(|k| parse_sequence(kind, k)) {
                highest = highest.max(seq);
            }
        }
        Ok(highest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::models::supplier;
    use chrono::Utc;
    use proptest::prelude::*;
    use rstest::rstest;
    use sea_orm::{DatabaseConnection, TransactionTrait};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    async fn memory_db() -> DatabaseConnection {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        };
        let db = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&db).await.unwrap();
        db
    }

    #[rstest]
    #[case(IdKind::Supplier, 1, "SUI-0001")]
    #[case(IdKind::PurchaseOrder, 42, "PO-0042")]
    #[case(IdKind::Expense, 7, "EXP-007")]
    #[case(IdKind::Vehicle, 1234, "VIN-1234")]
    #[case(IdKind::StockIn(StockInIdFormat::Sequential), 9, "STI-0009")]
    fn plain_formats(#[case] kind: IdKind, #[case] seq: i64, #[case] expected: &str) {
        assert_eq!(kind.format(seq), expected);
    }

    #[test]
    fn dated_formats() {
        assert_eq!(IdKind::Delivery.render(3, day(), ""), "DEL-20240307-0003");
        assert_eq!(
            IdKind::StockIn(StockInIdFormat::Dated).render(12, day(), "JD"),
            "SI-01207032024JD"
        );
    }

    #[rstest]
    #[case(IdKind::Supplier, "SUI-0010", Some(10))]
    #[case(IdKind::Supplier, "SUI-10000", Some(10000))]
    #[case(IdKind::Supplier, "SUI-00A1", None)]
    #[case(IdKind::Supplier, "IT-0001", None)]
    #[case(IdKind::Delivery, "DEL-20240307-0005", Some(5))]
    #[case(IdKind::Delivery, "DEL-2024037-0005", None)]
    #[case(IdKind::StockIn(StockInIdFormat::Dated), "SI-01207032024JD", Some(12))]
    #[case(IdKind::StockIn(StockInIdFormat::Dated), "SI-1234507032024", Some(12345))]
    #[case(IdKind::StockIn(StockInIdFormat::Dated), "SI-07032024JD", None)]
    fn parses_sequences(#[case] kind: IdKind, #[case] id: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_sequence(kind, id), expected);
    }

    proptest! {
        #[test]
        fn rendered_ids_parse_back(seq in 1i64..10_000_000, initials in "[A-Z]{0,2}") {
            for kind in [
                IdKind::Supplier,
                IdKind::Delivery,
                IdKind::StockIn(StockInIdFormat::Dated),
                IdKind::Expense,
            ] {
                prop_assert_eq!(parse_sequence(kind, &kind.render(seq, day(), &initials)), Some(seq));
            }
        }
    }

    #[tokio::test]
    async fn sequences_increase_and_restart_per_day() {
        let db = memory_db().await;
        let txn = db.begin().await.unwrap();
        assert_eq!(IdentifierAllocator::next_sequence(&txn, IdKind::Order, day()).await.unwrap(), 1);
        assert_eq!(IdentifierAllocator::next_sequence(&txn, IdKind::Order, day()).await.unwrap(), 2);

        let first = IdentifierAllocator::allocate(&txn, IdKind::Delivery, day(), "")
            .await
            .unwrap();
        let next_day = day().succ_opt().unwrap();
        let second = IdentifierAllocator::allocate(&txn, IdKind::Delivery, next_day, "")
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(first, "DEL-20240307-0001");
        assert_eq!(second, "DEL-20240308-0001");
    }

    #[tokio::test]
    async fn first_allocation_seeds_from_numeric_maximum() {
        let db = memory_db().await;
        for id in ["SUI-0009", "SUI-0010", "SUI-00X7", "SUI-0002"] {
            supplier::Entity::insert(supplier::ActiveModel {
                supplier_id: Set(id.to_string()),
                supplier_name: Set("Acme".into()),
                contact_no: Set("+63 917 123 4567".into()),
                email: Set("acme@example.com".into()),
                address: Set("Manila".into()),
                created_at: Set(Utc::now()),
            })
            .exec_without_returning(&db)
            .await
            .unwrap();
        }

        let id = IdentifierAllocator::allocate(&db, IdKind::Supplier, day(), "")
            .await
            .unwrap();
        assert_eq!(id, "SUI-0011");
    }
}
