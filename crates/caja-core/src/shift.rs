//! # Shift Reconciliation
//!
//! Running totals of the open shift and the cash variance at close.
//!
//! ## Lifecycle
//! ```text
//! ┌──────────┐   open_shift()    ┌──────────┐   close_shift()   ┌──────────┐
//! │  (none)  │ ────────────────► │   OPEN   │ ────────────────► │  CLOSED  │
//! └──────────┘  no other open    └──────────┘  counted ≥ 0      └──────────┘
//!                seller, float ≥ 0       │       summary frozen        never
//!                                        │                             reopened
//!                                        ▼
//!                             summarize() on demand
//! ```
//!
//! ## Close-Out Math
//! ```text
//! cash_expected = initial_cash (0 when untracked) + by_payment.cash
//! difference    = cash_counted - cash_expected
//!                 > 0 surplus, < 0 shortage
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentBreakdown, Sale, SaleKind, Shift, ShiftStatus, ShiftType};
use crate::validation::{validate_non_negative_money, validate_seller};

// =============================================================================
// Summary
// =============================================================================

/// Running totals of one shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    /// Sales minus returns.
    pub total: Money,
    /// Sale tickets only; returns never count.
    pub tickets: i64,
    pub by_payment: PaymentBreakdown,
}

impl ShiftSummary {
    /// Folds one record into the summary.
    pub fn apply(&mut self, sale: &Sale) {
        match sale.kind {
            SaleKind::Sale => {
                self.total += sale.total;
                self.tickets += 1;
                self.by_payment.add(sale.payment_method, sale.total);
            }
            SaleKind::Return => {
                self.total -= sale.total;
                self.by_payment.add(sale.payment_method, -sale.total);
            }
        }
    }
}

/// Summary of every record belonging to `shift_id`.
///
/// Order-independent; zero records give the zero summary.
pub fn summarize<'a>(sales: impl IntoIterator<Item = &'a Sale>, shift_id: &str) -> ShiftSummary {
    sales
        .into_iter()
        .filter(|s| s.shift_id.as_deref() == Some(shift_id))
        .fold(ShiftSummary::default(), |mut acc, sale| {
            acc.apply(sale);
            acc
        })
}

/// The one shift with status open, if any.
pub fn find_open_shift(shifts: &[Shift]) -> Option<&Shift> {
    shifts.iter().find(|s| s.is_open())
}

// =============================================================================
// Open
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftRequest {
    pub seller: String,
    pub shift_type: ShiftType,
    /// `None` disables float tracking for this shift.
    pub initial_cash: Option<Money>,
}

/// Builds a new open shift, provided no other shift is open.
pub fn open_shift(
    shifts: &[Shift],
    request: &OpenShiftRequest,
    now: DateTime<Utc>,
) -> CoreResult<Shift> {
    if let Some(open) = find_open_shift(shifts) {
        return Err(CoreError::ShiftAlreadyOpen {
            shift_id: open.id.clone(),
        });
    }

    let seller = validate_seller(&request.seller)?;
    if let Some(initial) = request.initial_cash {
        validate_non_negative_money("initial cash", initial)?;
    }

    Ok(Shift {
        id: Uuid::new_v4().to_string(),
        seller,
        shift_type: request.shift_type,
        start: now,
        end: None,
        status: ShiftStatus::Open,
        initial_cash: request.initial_cash,
        cash_expected: None,
        cash_counted: None,
        difference: None,
        total_sales: None,
        ticket_count: None,
        payments_breakdown: None,
    })
}

// =============================================================================
// Close
// =============================================================================

/// Expected drawer cash for a summary.
pub fn expected_cash(initial_cash: Option<Money>, summary: &ShiftSummary) -> Money {
    initial_cash.unwrap_or_default() + summary.by_payment.cash
}

/// Freezes the summary onto `shift` and marks it closed.
pub fn close_shift<'a>(
    shift: &Shift,
    sales: impl IntoIterator<Item = &'a Sale>,
    cash_counted: Money,
    now: DateTime<Utc>,
) -> CoreResult<Shift> {
    if !shift.is_open() {
        return Err(CoreError::NoOpenShift);
    }
    validate_non_negative_money("cash counted", cash_counted)?;

    let summary = summarize(sales, &shift.id);
    let expected = expected_cash(shift.initial_cash, &summary);

    Ok(Shift {
        end: Some(now),
        status: ShiftStatus::Closed,
        cash_expected: Some(expected),
        cash_counted: Some(cash_counted),
        difference: Some(cash_counted - expected),
        total_sales: Some(summary.total),
        ticket_count: Some(summary.tickets),
        payments_breakdown: Some(summary.by_payment),
        ..shift.clone()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use proptest::prelude::*;

    fn record(kind: SaleKind, method: PaymentMethod, total: i64, shift: &str) -> Sale {
        Sale {
            id: Uuid::new_v4().to_string(),
            ticket: "000001".to_string(),
            kind,
            total: Money::from_minor(total),
            payment_method: method,
            cash_received: None,
            change: None,
            shift_id: Some(shift.to_string()),
            seller: Some("Ana".to_string()),
            created_at: Utc::now(),
            items: Vec::new(),
            notes: None,
        }
    }

    fn request(initial: Option<i64>) -> OpenShiftRequest {
        OpenShiftRequest {
            seller: "Ana".to_string(),
            shift_type: ShiftType::Day,
            initial_cash: initial.map(Money::from_minor),
        }
    }

    #[test]
    fn test_summary_nets_returns() {
        let sales = vec![
            record(SaleKind::Sale, PaymentMethod::Cash, 2000, "s-1"),
            record(SaleKind::Sale, PaymentMethod::Card, 1500, "s-1"),
            record(SaleKind::Return, PaymentMethod::Cash, 500, "s-1"),
            record(SaleKind::Sale, PaymentMethod::Cash, 9999, "other"),
        ];

        let summary = summarize(&sales, "s-1");
        assert_eq!(summary.total.minor(), 3000);
        assert_eq!(summary.tickets, 2);
        assert_eq!(summary.by_payment.cash.minor(), 1500);
        assert_eq!(summary.by_payment.card.minor(), 1500);
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        assert_eq!(summarize(&[], "s-1"), ShiftSummary::default());
    }

    #[test]
    fn test_open_requires_no_open_shift() {
        let first = open_shift(&[], &request(Some(50000)), Utc::now()).unwrap();
        assert!(first.is_open());

        let err = open_shift(&[first.clone()], &request(Some(0)), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::ShiftAlreadyOpen { shift_id } if shift_id == first.id));
    }

    #[test]
    fn test_open_validates_input() {
        let mut bad = request(Some(-1));
        assert!(open_shift(&[], &bad, Utc::now()).is_err());
        bad.initial_cash = None;
        bad.seller = "  ".to_string();
        assert!(open_shift(&[], &bad, Utc::now()).is_err());
    }

    #[test]
    fn test_close_difference_sign() {
        let shift = open_shift(&[], &request(Some(50000)), Utc::now()).unwrap();
        let sales = vec![record(SaleKind::Sale, PaymentMethod::Cash, 2000, &shift.id)];

        let exact = close_shift(&shift, &sales, Money::from_minor(52000), Utc::now()).unwrap();
        assert_eq!(exact.cash_expected, Some(Money::from_minor(52000)));
        assert_eq!(exact.difference, Some(Money::zero()));
        assert_eq!(exact.status, ShiftStatus::Closed);
        assert!(exact.end.is_some());
        assert_eq!(exact.ticket_count, Some(1));

        let over = close_shift(&shift, &sales, Money::from_minor(52500), Utc::now()).unwrap();
        assert_eq!(over.difference, Some(Money::from_minor(500)));

        let under = close_shift(&shift, &sales, Money::from_minor(51000), Utc::now()).unwrap();
        assert_eq!(under.difference, Some(Money::from_minor(-1000)));
    }

    #[test]
    fn test_close_without_float() {
        let shift = open_shift(&[], &request(None), Utc::now()).unwrap();
        let sales = vec![record(SaleKind::Sale, PaymentMethod::Cash, 2000, &shift.id)];
        let closed = close_shift(&shift, &sales, Money::from_minor(2000), Utc::now()).unwrap();
        assert_eq!(closed.cash_expected, Some(Money::from_minor(2000)));
    }

    #[test]
    fn test_close_rejects_closed_shift() {
        let shift = open_shift(&[], &request(Some(0)), Utc::now()).unwrap();
        let closed = close_shift(&shift, &[], Money::zero(), Utc::now()).unwrap();
        assert!(matches!(
            close_shift(&closed, &[], Money::zero(), Utc::now()),
            Err(CoreError::NoOpenShift)
        ));
    }

    fn arb_record() -> impl Strategy<Value = Sale> {
        (any::<bool>(), 0usize..5, 1i64..100_000).prop_map(|(is_return, m, total)| {
            let kind = if is_return { SaleKind::Return } else { SaleKind::Sale };
            record(kind, PaymentMethod::ALL[m], total, "s-1")
        })
    }

    proptest! {
        #[test]
        fn prop_summary_is_order_independent(
            sales in prop::collection::vec(arb_record(), 0..30),
            seed in any::<u64>(),
        ) {
            let forward = summarize(&sales, "s-1");

            let mut reversed = sales.clone();
            reversed.reverse();
            prop_assert_eq!(summarize(&reversed, "s-1"), forward);

            let mut rotated = sales.clone();
            if !rotated.is_empty() {
                let k = (seed as usize) % rotated.len();
                rotated.rotate_left(k);
            }
            prop_assert_eq!(summarize(&rotated, "s-1"), forward);
        }
    }
}
