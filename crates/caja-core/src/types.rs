//! # Domain Types
//!
//! Core domain types used throughout Caja POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │     Shift       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  ticket         │   │  seller         │       │
//! │  │  price          │   │  kind           │   │  status         │       │
//! │  │  stock          │   │  items (JSON)   │   │  breakdown      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Client       │   │ ClientMovement  │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  authorized     │   │  amount         │   │  Cash  Card     │       │
//! │  │  balance        │   │  type           │   │  Transfer       │       │
//! │  │  credit_limit   │   │  balance_after  │   │  Fiado Staff    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stored Labels
//! Enum wire labels match what is stored in the database columns
//! (`"cash"`, `"return"`, `"dia"`, `"pago-total"`). Every enum exposes
//! `as_str()` for binding and `parse_lenient()` for the tolerant read path.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::DEFAULT_MIN_STOCK;

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// Each method has its own checkout precondition, see `checkout::Tender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash, change is computed.
    Cash,
    /// Card on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
    /// Store credit charged to an authorized client.
    Fiado,
    /// Staff consumption, requires an open shift.
    Staff,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Fiado,
        PaymentMethod::Staff,
    ];

    /// Stored label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Fiado => "fiado",
            PaymentMethod::Staff => "staff",
        }
    }

    /// Parses a stored label, falling back to `Cash` for unknown values.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(PaymentMethod::Cash)
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            "fiado" => Ok(PaymentMethod::Fiado),
            "staff" => Ok(PaymentMethod::Staff),
            other => Err(ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("unknown method '{}'", other),
            }),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale Kind
// =============================================================================

/// Whether a sale record is a sale or a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleKind {
    Sale,
    Return,
}

impl SaleKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleKind::Sale => "sale",
            SaleKind::Return => "return",
        }
    }

    /// Unknown or missing kinds read as `Sale`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("return") => SaleKind::Return,
            _ => SaleKind::Sale,
        }
    }
}

impl Default for SaleKind {
    fn default() -> Self {
        SaleKind::Sale
    }
}

// =============================================================================
// Refund Method
// =============================================================================

/// How the customer is refunded on a return.
///
/// Independent of the original payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RefundMethod {
    Cash,
    Card,
    /// Product exchange; no money leaves the drawer.
    Exchange,
}

impl RefundMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RefundMethod::Cash => "cash",
            RefundMethod::Card => "card",
            RefundMethod::Exchange => "exchange",
        }
    }
}

impl Default for RefundMethod {
    fn default() -> Self {
        RefundMethod::Cash
    }
}

// =============================================================================
// Shift Type / Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ShiftType {
    #[serde(rename = "dia")]
    Day,
    #[serde(rename = "noche")]
    Night,
}

impl ShiftType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Day => "dia",
            ShiftType::Night => "noche",
        }
    }

    /// Unknown or missing types read as `Day`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("noche") => ShiftType::Night,
            _ => ShiftType::Day,
        }
    }
}

impl Default for ShiftType {
    fn default() -> Self {
        ShiftType::Day
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Open,
    Closed,
}

impl ShiftStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "open",
            ShiftStatus::Closed => "closed",
        }
    }

    /// A row without a status is closed when it has an end time.
    pub fn parse_lenient(value: Option<&str>, has_end: bool) -> Self {
        match value.map(str::trim) {
            Some("open") => ShiftStatus::Open,
            Some("closed") => ShiftStatus::Closed,
            _ if has_end => ShiftStatus::Closed,
            _ => ShiftStatus::Open,
        }
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// Kind of change recorded on a client's credit balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum MovementType {
    /// Fiado purchase, balance goes up.
    #[serde(rename = "fiado")]
    Fiado,
    /// Partial payment.
    #[serde(rename = "abono")]
    Abono,
    /// Full settlement, balance forced to zero.
    #[serde(rename = "pago-total")]
    PagoTotal,
}

impl MovementType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Fiado => "fiado",
            MovementType::Abono => "abono",
            MovementType::PagoTotal => "pago-total",
        }
    }

    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("abono") => MovementType::Abono,
            Some("pago-total") => MovementType::PagoTotal,
            _ => MovementType::Fiado,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Free-form category used for search and grouping.
    pub category: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Current unit price.
    pub price: Money,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Reorder threshold.
    pub min_stock: i64,

    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Checks if the requested quantity is on hand.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.stock
    }

    /// At or under the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Builds a product with default threshold and no timestamps.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Money,
        stock: i64,
    ) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            barcode: None,
            price,
            stock,
            min_stock: DEFAULT_MIN_STOCK,
            created_at: None,
            updated_at: None,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// A credit (fiado) account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Only authorized clients may buy on fiado.
    pub authorized: bool,
    /// Outstanding debt. Never negative.
    pub balance: Money,
    pub credit_limit: Money,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Client {
    /// Whether `amount` more fits under the limit.
    pub fn fits_limit(&self, amount: Money) -> bool {
        self.balance
            .checked_add(amount)
            .is_some_and(|total| total <= self.credit_limit)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line on a ticket.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price at time of sale (frozen).
    pub price: Money,
    pub quantity: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale Notes
// =============================================================================

/// Link from a fiado sale to the charged client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FiadoNote {
    pub client_id: String,
}

/// Why and against what a return was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnNote {
    pub reason: String,
    pub original_ticket: String,
    /// Missing on returns recorded before the id was stored.
    #[serde(default)]
    pub original_sale_id: Option<String>,
    pub original_payment_method: PaymentMethod,
    pub refund_method: RefundMethod,
}

/// Free-form notes column on a sale record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum SaleNotes {
    Return(ReturnNote),
    Fiado(FiadoNote),
}

// =============================================================================
// Sale
// =============================================================================

/// A sale or return record. Immutable once posted, except for the
/// payment method correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// "000042" for sales, "R-000042" for returns.
    pub ticket: String,
    pub kind: SaleKind,
    /// Always positive; returns are netted by the consumer.
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub cash_received: Option<Money>,
    pub change: Option<Money>,
    pub shift_id: Option<String>,
    pub seller: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItem>,
    pub notes: Option<SaleNotes>,
}

impl Sale {
    #[inline]
    pub fn is_return(&self) -> bool {
        self.kind == SaleKind::Return
    }

    pub fn fiado_client_id(&self) -> Option<&str> {
        match &self.notes {
            Some(SaleNotes::Fiado(note)) => Some(note.client_id.as_str()),
            _ => None,
        }
    }

    pub fn return_note(&self) -> Option<&ReturnNote> {
        match &self.notes {
            Some(SaleNotes::Return(note)) => Some(note),
            _ => None,
        }
    }

    /// Sold quantity of one product on this ticket.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .sum()
    }
}

// =============================================================================
// Payment Breakdown
// =============================================================================

/// Amount per payment method. All five are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentBreakdown {
    #[serde(default)]
    pub cash: Money,
    #[serde(default)]
    pub card: Money,
    #[serde(default)]
    pub transfer: Money,
    #[serde(default)]
    pub fiado: Money,
    #[serde(default)]
    pub staff: Money,
}

impl PaymentBreakdown {
    pub fn get(&self, method: PaymentMethod) -> Money {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Card => self.card,
            PaymentMethod::Transfer => self.transfer,
            PaymentMethod::Fiado => self.fiado,
            PaymentMethod::Staff => self.staff,
        }
    }

    /// Adds `amount` (may be negative) to one method.
    pub fn add(&mut self, method: PaymentMethod, amount: Money) {
        let slot = match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Card => &mut self.card,
            PaymentMethod::Transfer => &mut self.transfer,
            PaymentMethod::Fiado => &mut self.fiado,
            PaymentMethod::Staff => &mut self.staff,
        };
        *slot += amount;
    }

    /// `(method, amount)` pairs in display order.
    pub fn entries(&self) -> impl Iterator<Item = (PaymentMethod, Money)> + '_ {
        PaymentMethod::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

// =============================================================================
// Shift
// =============================================================================

/// A cash-drawer session. Close-out fields are populated only when closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub seller: String,
    pub shift_type: ShiftType,
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end: Option<DateTime<Utc>>,
    pub status: ShiftStatus,
    /// `None` means the drawer float is not tracked.
    pub initial_cash: Option<Money>,
    pub cash_expected: Option<Money>,
    pub cash_counted: Option<Money>,
    pub difference: Option<Money>,
    pub total_sales: Option<Money>,
    pub ticket_count: Option<i64>,
    pub payments_breakdown: Option<PaymentBreakdown>,
}

impl Shift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// End time, or start time for shifts that never recorded one.
    pub fn sort_time(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }
}

// =============================================================================
// Client Movement
// =============================================================================

/// Append-only audit entry for a client's balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientMovement {
    pub id: String,
    pub client_id: String,
    pub amount: Money,
    pub movement_type: MovementType,
    pub description: String,
    /// Balance right after this movement.
    pub balance_after: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_labels() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::parse_lenient(Some("cheque")), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::parse_lenient(None), PaymentMethod::Cash);
    }

    #[test]
    fn test_lenient_enum_parsing() {
        assert_eq!(SaleKind::parse_lenient(Some("return")), SaleKind::Return);
        assert_eq!(SaleKind::parse_lenient(Some("refund")), SaleKind::Sale);
        assert_eq!(ShiftType::parse_lenient(Some("noche")), ShiftType::Night);
        assert_eq!(ShiftStatus::parse_lenient(None, true), ShiftStatus::Closed);
        assert_eq!(ShiftStatus::parse_lenient(None, false), ShiftStatus::Open);
        assert_eq!(
            MovementType::parse_lenient(Some("pago-total")),
            MovementType::PagoTotal
        );
    }

    #[test]
    fn test_stored_labels_match_serde() {
        assert_eq!(
            serde_json::to_string(&MovementType::PagoTotal).unwrap(),
            "\"pago-total\""
        );
        assert_eq!(serde_json::to_string(&ShiftType::Day).unwrap(), "\"dia\"");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transfer).unwrap(),
            "\"transfer\""
        );
    }

    #[test]
    fn test_sale_notes_untagged() {
        let fiado: SaleNotes = serde_json::from_str(r#"{"clientId":"c-1"}"#).unwrap();
        assert_eq!(
            fiado,
            SaleNotes::Fiado(FiadoNote {
                client_id: "c-1".to_string()
            })
        );

        let json = r#"{"reason":"roto","originalTicket":"000007","originalPaymentMethod":"card","refundMethod":"exchange"}"#;
        let ret: SaleNotes = serde_json::from_str(json).unwrap();
        match ret {
            SaleNotes::Return(note) => {
                assert_eq!(note.original_ticket, "000007");
                assert_eq!(note.original_sale_id, None);
                assert_eq!(note.refund_method, RefundMethod::Exchange);
            }
            other => panic!("expected return note, got {:?}", other),
        }
    }

    #[test]
    fn test_breakdown_add_and_get() {
        let mut breakdown = PaymentBreakdown::default();
        breakdown.add(PaymentMethod::Cash, Money::from_minor(2000));
        breakdown.add(PaymentMethod::Cash, Money::from_minor(-500));
        breakdown.add(PaymentMethod::Staff, Money::from_minor(300));

        assert_eq!(breakdown.get(PaymentMethod::Cash).minor(), 1500);
        assert_eq!(breakdown.get(PaymentMethod::Staff).minor(), 300);
        assert_eq!(breakdown.entries().count(), 5);
    }

    #[test]
    fn test_client_limit() {
        let client = Client {
            id: "c-1".to_string(),
            name: "Rosa".to_string(),
            authorized: true,
            balance: Money::from_minor(7000),
            credit_limit: Money::from_minor(10000),
            updated_at: None,
        };
        assert!(client.fits_limit(Money::from_minor(3000)));
        assert!(!client.fits_limit(Money::from_minor(4000)));
        assert!(!client.fits_limit(Money::from_minor(i64::MAX)));
    }

    #[test]
    fn test_product_stock_checks() {
        let product = Product::new("p-1", "Pan", "Panaderia", Money::from_minor(1000), 5);
        assert!(product.can_sell(5));
        assert!(!product.can_sell(6));
        assert!(product.is_low_stock());
    }
}
