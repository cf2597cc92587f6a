//! # caja-core: Pure Ledger Logic for Caja POS
//!
//! This crate is the **heart** of Caja POS. Every rule that decides whether a
//! sale, return, shift close or credit payment may happen lives here, as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caja POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard UI (out of tree)                      │   │
//! │  │    Catalog ──► Cart ──► Checkout ──► Shifts ──► Reports         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ user intents                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                caja-ledger (session orchestration)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caja-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ checkout │ │ returns  │ │  shift   │ │  credit  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │   cart   │ │ catalog  │ │  report  │ │dashboard │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    caja-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Client, Sale, Shift, ClientMovement)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validators
//! - [`cart`] - Session cart
//! - [`catalog`] - Product creation, edits, search, low stock
//! - [`checkout`] - Tender validation and sale construction
//! - [`returns`] - Return construction against an original sale
//! - [`shift`] - Shift summary fold, open and close
//! - [`credit`] - Fiado clients, charges and payments
//! - [`report`] - Report windows and aggregation
//! - [`dashboard`] - Active-shift dashboard and shift history
//!
//! ## Example Usage
//!
//! ```rust
//! use caja_core::money::Money;
//!
//! let price = Money::from_minor(1000);
//! let line = price.multiply_quantity(2);
//! assert_eq!(line.minor(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod credit;
pub mod dashboard;
pub mod error;
pub mod money;
pub mod report;
pub mod returns;
pub mod shift;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
pub use validation::ValidationResult;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest single amount accepted in minor units: a price, credit limit,
/// payment or cash count.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Seller recorded on sales made while no shift is open.
pub const COUNTER_SELLER: &str = "Mostrador";

/// Ticket numbers are zero-padded to this many digits.
pub const TICKET_DIGITS: usize = 6;

/// Reorder threshold applied when a product row has none.
pub const DEFAULT_MIN_STOCK: i64 = 5;
