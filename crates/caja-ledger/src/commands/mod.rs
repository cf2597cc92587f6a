//! # Ledger Commands
//!
//! One async method on [`Ledger`](crate::Ledger) per user intent, grouped
//! by screen.
//!
//! ## Command Categories
//! - **Catalog**: products, search, low stock, create, edit, add stock
//! - **Checkout**: cart editing, change preview, checkout, method correction
//! - **Returns**: returnable quantities, process a return
//! - **Shift**: open, close, live summary, dashboard, history
//! - **Credit**: clients, authorization, payments, movement history
//! - **Report**: sales reports over a time window
//!
//! Admin-only commands check the session gate before touching anything.

pub mod catalog;
pub mod checkout;
pub mod credit;
pub mod report;
pub mod returns;
pub mod shift;
