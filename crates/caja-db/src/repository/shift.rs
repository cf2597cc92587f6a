//! # Shift Repository
//!
//! Cash-drawer shifts. A shift is inserted open and updated exactly once,
//! when it is closed. Shifts are never reopened or deleted.
//!
//! The partial unique index `idx_shifts_single_open` backs the
//! "at most one open shift" rule; losing that race surfaces as
//! `DbError::Conflict { kind: ShiftOpen, .. }`.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use crate::error::{ConflictKind, DbError, DbResult};
use caja_core::{Money, PaymentBreakdown, Shift, ShiftStatus, ShiftType};

#[derive(Debug, Clone, sqlx::FromRow)]
struct ShiftRow {
    id: String,
    seller: Option<String>,
    shift_type: Option<String>,
    start_time: String,
    end_time: Option<String>,
    status: Option<String>,
    initial_cash: Option<i64>,
    cash_expected: Option<i64>,
    cash_counted: Option<i64>,
    difference: Option<i64>,
    total_sales: Option<i64>,
    tickets: Option<i64>,
    payments_breakdown: Option<String>,
}

impl ShiftRow {
    fn into_shift(self) -> Option<Shift> {
        let start = parse_timestamp(&self.start_time)?;
        let end = parse_optional_timestamp(self.end_time.as_deref());
        let money = |v: Option<i64>| v.map(Money::from_minor);

        Some(Shift {
            id: self.id,
            seller: self.seller.unwrap_or_default(),
            shift_type: ShiftType::parse_lenient(self.shift_type.as_deref()),
            start,
            status: ShiftStatus::parse_lenient(self.status.as_deref(), end.is_some()),
            end,
            initial_cash: money(self.initial_cash),
            cash_expected: money(self.cash_expected),
            cash_counted: money(self.cash_counted),
            difference: money(self.difference),
            total_sales: money(self.total_sales),
            ticket_count: self.tickets,
            payments_breakdown: self
                .payments_breakdown
                .as_deref()
                .and_then(|json| serde_json::from_str::<PaymentBreakdown>(json).ok()),
        })
    }
}

const SELECT_SHIFT: &str = r#"
    SELECT id, seller, shift_type, start_time, end_time, status, initial_cash,
           cash_expected, cash_counted, difference, total_sales, tickets, payments_breakdown
    FROM shifts
"#;

#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// All shifts, newest start first.
    pub async fn list_all(&self) -> DbResult<Vec<Shift>> {
        let sql = format!("{} ORDER BY start_time DESC", SELECT_SHIFT);
        let rows = sqlx::query_as::<_, ShiftRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let total = rows.len();
        let shifts: Vec<Shift> = rows.into_iter().filter_map(ShiftRow::into_shift).collect();
        if shifts.len() < total {
            warn!(skipped = total - shifts.len(), "Skipped shift rows with unreadable start time");
        }
        Ok(shifts)
    }

    /// The open shift, if any.
    pub async fn find_open(&self) -> DbResult<Option<Shift>> {
        let sql = format!(
            "{} WHERE status = 'open' OR (status IS NULL AND end_time IS NULL) ORDER BY start_time DESC LIMIT 1",
            SELECT_SHIFT
        );
        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(ShiftRow::into_shift))
    }

    /// Inserts a newly opened shift.
    pub async fn insert_open(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, seller = %shift.seller, "Opening shift");

        let result = sqlx::query(
            r#"
            INSERT INTO shifts (id, seller, shift_type, start_time, status, initial_cash)
            VALUES (?, ?, ?, ?, 'open', ?)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.seller)
        .bind(shift.shift_type.as_str())
        .bind(format_timestamp(&shift.start))
        .bind(shift.initial_cash.map(|m| m.minor()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(id = %shift.id, "Shift opened");
                Ok(())
            }
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { .. } => Err(DbError::conflict(
                    ConflictKind::ShiftOpen,
                    "Shift",
                    &shift.id,
                    "another shift is already open",
                )),
                other => Err(other),
            },
        }
    }

    /// Freezes the close-out figures onto an open shift.
    pub async fn close(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, "Closing shift");

        let breakdown = shift
            .payments_breakdown
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE shifts
            SET status = 'closed', end_time = ?, cash_expected = ?, cash_counted = ?,
                difference = ?, total_sales = ?, tickets = ?, payments_breakdown = ?
            WHERE id = ? AND (status = 'open' OR status IS NULL)
            "#,
        )
        .bind(shift.end.as_ref().map(format_timestamp))
        .bind(shift.cash_expected.map(|m| m.minor()))
        .bind(shift.cash_counted.map(|m| m.minor()))
        .bind(shift.difference.map(|m| m.minor()))
        .bind(shift.total_sales.map(|m| m.minor()))
        .bind(shift.ticket_count)
        .bind(breakdown)
        .bind(&shift.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                ConflictKind::State,
                "Shift",
                &shift.id,
                "shift is not open",
            ));
        }

        info!(
            id = %shift.id,
            difference = ?shift.difference.map(|m| m.minor()),
            "Shift closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use caja_core::shift::{close_shift, open_shift, OpenShiftRequest};
    use caja_core::Sale;
    use chrono::Utc;

    fn request(seller: &str) -> OpenShiftRequest {
        OpenShiftRequest {
            seller: seller.to_string(),
            shift_type: ShiftType::Day,
            initial_cash: Some(Money::from_minor(50000)),
        }
    }

    #[tokio::test]
    async fn test_open_find_close() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.shifts();

        let shift = open_shift(&[], &request("Ana"), Utc::now()).unwrap();
        repo.insert_open(&shift).await.unwrap();

        let open = repo.find_open().await.unwrap().unwrap();
        assert_eq!(open.id, shift.id);
        assert_eq!(open.initial_cash, Some(Money::from_minor(50000)));

        let no_sales: Vec<Sale> = Vec::new();
        let closed = close_shift(&open, &no_sales, Money::from_minor(49000), Utc::now()).unwrap();
        repo.close(&closed).await.unwrap();

        assert!(repo.find_open().await.unwrap().is_none());
        let all = repo.list_all().await.unwrap();
        assert_eq!(all[0].status, ShiftStatus::Closed);
        assert_eq!(all[0].difference, Some(Money::from_minor(-1000)));
        assert_eq!(all[0].payments_breakdown, Some(PaymentBreakdown::default()));

        let err = repo.close(&closed).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { kind: ConflictKind::State, .. }));
    }

    #[tokio::test]
    async fn test_second_open_shift_conflicts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.shifts();

        let first = open_shift(&[], &request("Ana"), Utc::now()).unwrap();
        repo.insert_open(&first).await.unwrap();

        // Built from a stale cache that did not see the first shift.
        let second = open_shift(&[], &request("Luis"), Utc::now()).unwrap();
        let err = repo.insert_open(&second).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { kind: ConflictKind::ShiftOpen, .. }));
    }
}
