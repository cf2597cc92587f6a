//! # Checkout
//!
//! Decides whether a cart may be paid with a given tender and, if so,
//! builds everything the database must write.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart + Tender                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cart empty? ──────────────────────────────► EmptyCart                  │
//! │       │                                                                 │
//! │       ▼  one validator per tender tag                                   │
//! │  ┌──────────┬──────────┬──────────┬──────────────┬──────────────┐      │
//! │  │  Cash    │  Card    │ Transfer │  Fiado       │  Staff       │      │
//! │  │ received │    -     │    -     │ client auth  │ open shift   │      │
//! │  │ ≥ total  │          │          │ + limit      │              │      │
//! │  └──────────┴──────────┴──────────┴──────────────┴──────────────┘      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalePosting { sale, stock deltas, fiado charge }                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  caja-db posts it in ONE transaction                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::credit::{charge_fiado, purchase_description, FiadoCharge};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    Client, FiadoNote, PaymentMethod, Sale, SaleKind, SaleNotes, Shift,
};
use crate::TICKET_DIGITS;

// =============================================================================
// Tender
// =============================================================================

/// The chosen payment method plus whatever it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Tender {
    Cash {
        received: Option<Money>,
    },
    Card,
    Transfer,
    Fiado {
        #[serde(rename = "clientId")]
        client_id: Option<String>,
    },
    Staff,
}

impl Tender {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Tender::Cash { .. } => PaymentMethod::Cash,
            Tender::Card => PaymentMethod::Card,
            Tender::Transfer => PaymentMethod::Transfer,
            Tender::Fiado { .. } => PaymentMethod::Fiado,
            Tender::Staff => PaymentMethod::Staff,
        }
    }
}

/// What a validated tender adds to the sale.
#[derive(Debug, Clone, PartialEq)]
struct TenderOutcome {
    cash_received: Option<Money>,
    change: Option<Money>,
    fiado: Option<FiadoCharge>,
}

impl TenderOutcome {
    fn plain() -> Self {
        TenderOutcome {
            cash_received: None,
            change: None,
            fiado: None,
        }
    }
}

/// Cash: received must be present, positive and cover the total.
///
/// Returns `(received, change)`.
pub fn validate_cash(received: Option<Money>, total: Money) -> CoreResult<(Money, Money)> {
    let received = match received {
        Some(r) if r.is_positive() => r,
        _ => return Err(CoreError::CashRequired),
    };

    if received < total {
        return Err(CoreError::InsufficientCash { total, received });
    }

    Ok((received, received - total))
}

/// Fiado: a known, authorized client with room under the limit.
pub fn validate_fiado(
    client_id: Option<&str>,
    clients: &[Client],
    total: Money,
    ticket: &str,
    now: DateTime<Utc>,
) -> CoreResult<FiadoCharge> {
    let client_id = client_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(CoreError::ClientRequired)?;

    let client = clients
        .iter()
        .find(|c| c.id == client_id)
        .ok_or_else(|| CoreError::ClientNotFound(client_id.to_string()))?;

    charge_fiado(client, total, ticket, now)
}

/// Staff consumption: only while a shift is open.
pub fn validate_staff(open_shift: Option<&Shift>) -> CoreResult<()> {
    match open_shift {
        Some(shift) if shift.is_open() => Ok(()),
        _ => Err(CoreError::NoOpenShift),
    }
}

fn validate_tender(
    tender: &Tender,
    total: Money,
    ctx: &CheckoutContext<'_>,
) -> CoreResult<TenderOutcome> {
    match tender {
        Tender::Cash { received } => {
            let (received, change) = validate_cash(*received, total)?;
            Ok(TenderOutcome {
                cash_received: Some(received),
                change: Some(change),
                fiado: None,
            })
        }
        Tender::Card | Tender::Transfer => Ok(TenderOutcome::plain()),
        Tender::Fiado { client_id } => {
            let charge = validate_fiado(
                client_id.as_deref(),
                ctx.clients,
                total,
                &ctx.ticket,
                ctx.now,
            )?;
            Ok(TenderOutcome {
                fiado: Some(charge),
                ..TenderOutcome::plain()
            })
        }
        Tender::Staff => {
            validate_staff(ctx.open_shift)?;
            Ok(TenderOutcome::plain())
        }
    }
}

// =============================================================================
// Ticket Numbers
// =============================================================================

/// Next ticket: highest numeric ticket + 1, zero-padded.
///
/// Non-numeric tickets (returns, legacy text) are ignored.
///
/// ## Example
/// ```rust
/// use caja_core::checkout::next_ticket_number;
///
/// assert_eq!(next_ticket_number(["000041", "R-000040", "000039"]), "000042");
/// assert_eq!(next_ticket_number(Vec::<&str>::new()), "000001");
/// ```
pub fn next_ticket_number<'a>(tickets: impl IntoIterator<Item = &'a str>) -> String {
    let highest = tickets
        .into_iter()
        .filter_map(|t| t.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    format!("{:0width$}", highest + 1, width = TICKET_DIGITS)
}

// =============================================================================
// Posting
// =============================================================================

/// Stock change for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
}

/// Everything a checkout writes.
#[derive(Debug, Clone, PartialEq)]
pub struct SalePosting {
    pub sale: Sale,
    /// Units to take out of stock.
    pub stock: Vec<StockDelta>,
    pub fiado: Option<FiadoCharge>,
}

impl SalePosting {
    /// Replaces the ticket, e.g. when the database has moved on since the
    /// cache was read.
    pub fn assign_ticket(&mut self, ticket: String) {
        if let Some(charge) = self.fiado.as_mut() {
            charge.movement.description = purchase_description(&ticket);
        }
        self.sale.ticket = ticket;
    }
}

/// Inputs the ledger provides for one checkout.
#[derive(Debug, Clone)]
pub struct CheckoutContext<'a> {
    pub open_shift: Option<&'a Shift>,
    pub clients: &'a [Client],
    /// Seller recorded when no shift is open.
    pub counter_seller: &'a str,
    pub ticket: String,
    pub now: DateTime<Utc>,
}

/// Validates the cart and tender and builds the posting.
///
/// Nothing is written here. Any error means no state changes.
pub fn checkout(cart: &Cart, tender: &Tender, ctx: CheckoutContext<'_>) -> CoreResult<SalePosting> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let total = cart.total();
    let outcome = validate_tender(tender, total, &ctx)?;
    let method = tender.method();

    let (shift_id, seller) = match ctx.open_shift.filter(|s| s.is_open()) {
        Some(shift) => (Some(shift.id.clone()), shift.seller.clone()),
        None => (None, ctx.counter_seller.to_string()),
    };

    let notes = outcome.fiado.as_ref().map(|charge| {
        SaleNotes::Fiado(FiadoNote {
            client_id: charge.client_id.clone(),
        })
    });

    let stock = cart
        .lines()
        .iter()
        .map(|l| StockDelta {
            product_id: l.product_id.clone(),
            name: l.name.clone(),
            quantity: l.quantity,
        })
        .collect();

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        ticket: ctx.ticket,
        kind: SaleKind::Sale,
        total,
        payment_method: method,
        cash_received: outcome.cash_received,
        change: outcome.change,
        shift_id,
        seller: Some(seller),
        created_at: ctx.now,
        items: cart.to_sale_items(),
        notes,
    };

    Ok(SalePosting {
        sale,
        stock,
        fiado: outcome.fiado,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Product, ShiftStatus, ShiftType};
    use proptest::prelude::*;

    fn cart_with(price: i64, qty: i64) -> Cart {
        let product = Product::new("p-1", "Pan", "Panaderia", Money::from_minor(price), 100);
        let mut cart = Cart::new();
        cart.add(&product, qty).unwrap();
        cart
    }

    fn open_shift() -> Shift {
        Shift {
            id: "s-1".to_string(),
            seller: "Ana".to_string(),
            shift_type: ShiftType::Day,
            start: Utc::now(),
            end: None,
            status: ShiftStatus::Open,
            initial_cash: Some(Money::from_minor(50000)),
            cash_expected: None,
            cash_counted: None,
            difference: None,
            total_sales: None,
            ticket_count: None,
            payments_breakdown: None,
        }
    }

    fn ctx<'a>(shift: Option<&'a Shift>, clients: &'a [Client]) -> CheckoutContext<'a> {
        CheckoutContext {
            open_shift: shift,
            clients,
            counter_seller: "Mostrador",
            ticket: "000001".to_string(),
            now: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = checkout(&Cart::new(), &Tender::Card, ctx(None, &[])).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_cash_change() {
        let shift = open_shift();
        let posting = checkout(
            &cart_with(1000, 2),
            &Tender::Cash {
                received: Some(Money::from_minor(5000)),
            },
            ctx(Some(&shift), &[]),
        )
        .unwrap();

        assert_eq!(posting.sale.total.minor(), 2000);
        assert_eq!(posting.sale.change, Some(Money::from_minor(3000)));
        assert_eq!(posting.sale.shift_id.as_deref(), Some("s-1"));
        assert_eq!(posting.sale.seller.as_deref(), Some("Ana"));
        assert_eq!(posting.stock[0].quantity, 2);
    }

    #[test]
    fn test_cash_required_and_insufficient() {
        let cart = cart_with(1000, 2);
        assert!(matches!(
            checkout(&cart, &Tender::Cash { received: None }, ctx(None, &[])),
            Err(CoreError::CashRequired)
        ));
        assert!(matches!(
            checkout(
                &cart,
                &Tender::Cash {
                    received: Some(Money::from_minor(1500))
                },
                ctx(None, &[])
            ),
            Err(CoreError::InsufficientCash { .. })
        ));
    }

    #[test]
    fn test_counter_seller_without_shift() {
        let posting = checkout(&cart_with(1000, 1), &Tender::Transfer, ctx(None, &[])).unwrap();
        assert_eq!(posting.sale.seller.as_deref(), Some("Mostrador"));
        assert_eq!(posting.sale.shift_id, None);
        assert_eq!(posting.sale.cash_received, None);
    }

    #[test]
    fn test_staff_requires_open_shift() {
        let cart = cart_with(1000, 1);
        assert!(matches!(
            checkout(&cart, &Tender::Staff, ctx(None, &[])),
            Err(CoreError::NoOpenShift)
        ));
        let shift = open_shift();
        assert!(checkout(&cart, &Tender::Staff, ctx(Some(&shift), &[])).is_ok());
    }

    #[test]
    fn test_fiado_posting() {
        let clients = vec![Client {
            id: "c-1".to_string(),
            name: "Rosa".to_string(),
            authorized: true,
            balance: Money::zero(),
            credit_limit: Money::from_minor(10000),
            updated_at: None,
        }];

        assert!(matches!(
            checkout(
                &cart_with(7000, 1),
                &Tender::Fiado { client_id: None },
                ctx(None, &clients)
            ),
            Err(CoreError::ClientRequired)
        ));

        let mut posting = checkout(
            &cart_with(7000, 1),
            &Tender::Fiado {
                client_id: Some("c-1".to_string()),
            },
            ctx(None, &clients),
        )
        .unwrap();

        assert_eq!(posting.sale.fiado_client_id(), Some("c-1"));
        let charge = posting.fiado.as_ref().unwrap();
        assert_eq!(charge.balance_after.minor(), 7000);

        posting.assign_ticket("000009".to_string());
        assert_eq!(posting.sale.ticket, "000009");
        assert_eq!(
            posting.fiado.as_ref().unwrap().movement.description,
            "Compra ticket #000009"
        );
    }

    #[test]
    fn test_next_ticket_number() {
        assert_eq!(next_ticket_number(["000001"]), "000002");
        assert_eq!(next_ticket_number(["000009", "R-000009", "abc"]), "000010");
        assert_eq!(next_ticket_number(["999999"]), "1000000");
    }

    #[test]
    fn test_tender_serde() {
        let tender: Tender = serde_json::from_str(r#"{"method":"fiado","clientId":"c-1"}"#).unwrap();
        assert_eq!(
            tender,
            Tender::Fiado {
                client_id: Some("c-1".to_string())
            }
        );
    }

    proptest! {
        #[test]
        fn prop_cash_change_is_received_minus_total(
            price in 0i64..10_000,
            qty in 1i64..20,
            extra in 0i64..50_000,
        ) {
            let total = price * qty;
            let received = Money::from_minor(total + extra);
            prop_assume!(received.is_positive());

            let posting = checkout(
                &cart_with(price, qty),
                &Tender::Cash { received: Some(received) },
                ctx(None, &[]),
            ).unwrap();

            prop_assert_eq!(posting.sale.change, Some(Money::from_minor(extra)));
        }

        #[test]
        fn prop_cash_below_total_is_rejected(
            price in 1i64..10_000,
            qty in 1i64..20,
            short in 1i64..10_000,
        ) {
            let total = price * qty;
            prop_assume!(short <= total);
            let received = Money::from_minor(total - short);

            let result = checkout(
                &cart_with(price, qty),
                &Tender::Cash { received: Some(received) },
                ctx(None, &[]),
            );
            prop_assert!(result.is_err());
        }
    }
}
