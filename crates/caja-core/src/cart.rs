//! # Cart
//!
//! Transient, per-session list of lines. Never persisted; cleared after a
//! successful checkout.
//!
//! ## Rules
//! ```text
//! add(product, 2)      ──► new line, or +2 on the existing line
//! set_quantity(p, 0)   ──► line removed
//! quantity > stock     ──► InsufficientStock, cart unchanged
//! ```
//!
//! Each line captures the product's name and price when it is first added.
//! Those captured values become the ticket's snapshot at checkout.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, SaleItem};
use crate::validation::{validate_cart_size, validate_price, validate_quantity};

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl CartLine {
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Adds `quantity` units of `product`, merging with an existing line.
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        validate_price(product.price)?;

        let current = self.line(&product.id).map(|l| l.quantity).unwrap_or(0);
        let wanted = current + quantity;
        validate_quantity(wanted)?;
        ensure_stock(product, wanted)?;

        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity = wanted,
            None => {
                validate_cart_size(self.lines.len())?;
                self.lines.push(CartLine {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity: wanted,
                });
            }
        }

        Ok(())
    }

    /// Sets the quantity of a line. Zero or less removes it.
    ///
    /// Setting a quantity for a product not in the cart adds it.
    pub fn set_quantity(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove(&product.id);
            return Ok(());
        }

        validate_quantity(quantity)?;
        validate_price(product.price)?;
        ensure_stock(product, quantity)?;

        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity = quantity,
            None => {
                validate_cart_size(self.lines.len())?;
                self.lines.push(CartLine {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity,
                });
            }
        }

        Ok(())
    }

    /// Removes a line. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Σ unit price × quantity.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Change to hand back for `received` cash. Never negative.
    pub fn change_preview(&self, received: Money) -> Money {
        received.saturating_sub_floor(self.total())
    }

    /// Ticket lines with the captured name and price.
    pub fn to_sale_items(&self) -> Vec<SaleItem> {
        self.lines
            .iter()
            .map(|l| SaleItem {
                product_id: l.product_id.clone(),
                name: l.name.clone(),
                price: l.unit_price,
                quantity: l.quantity,
            })
            .collect()
    }
}

fn ensure_stock(product: &Product, wanted: i64) -> CoreResult<()> {
    if !product.can_sell(wanted) {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
            requested: wanted,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
