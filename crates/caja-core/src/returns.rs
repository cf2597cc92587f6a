//! # Returns
//!
//! Turns a subset of a prior sale's lines into a return record.
//!
//! ```text
//! Sale 000007: Pan ×3 @ $1000
//!      │  return Pan ×1, reason "vencido", refund cash
//!      ▼
//! Return R-000007: Pan ×1 @ $1000 (original snapshot), total $1000
//!      │
//!      └──► stock +1
//! ```
//!
//! The original sale record is never modified. A fiado balance is not
//! reversed when a fiado sale is returned.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::checkout::StockDelta;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, RefundMethod, ReturnNote, Sale, SaleItem, SaleKind, SaleNotes};

/// Quantity to return for one product of the original ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLine {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub sale_id: String,
    pub lines: Vec<ReturnLine>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub refund_method: RefundMethod,
}

/// Everything a return writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPosting {
    pub sale: Sale,
    /// Units to put back into stock.
    pub restock: Vec<StockDelta>,
}

/// Payment method recorded on the return record.
///
/// Cash and card refunds hit those methods; an exchange nets against the
/// method the original sale was paid with.
pub fn refund_payment_method(refund: RefundMethod, original: PaymentMethod) -> PaymentMethod {
    match refund {
        RefundMethod::Cash => PaymentMethod::Cash,
        RefundMethod::Card => PaymentMethod::Card,
        RefundMethod::Exchange => original,
    }
}

/// Units of each product already returned against `original`.
pub fn already_returned<'a>(
    original: &Sale,
    sales: impl IntoIterator<Item = &'a Sale>,
) -> HashMap<String, i64> {
    let mut returned: HashMap<String, i64> = HashMap::new();

    for sale in sales {
        let Some(note) = sale.return_note() else {
            continue;
        };
        let matches = match &note.original_sale_id {
            Some(id) => *id == original.id,
            None => note.original_ticket == original.ticket,
        };
        if !matches {
            continue;
        }
        for item in &sale.items {
            *returned.entry(item.product_id.clone()).or_insert(0) += item.quantity;
        }
    }

    returned
}

/// Builds a return against `original`.
///
/// `returned` is the output of [`already_returned`]; a line may not exceed
/// what was sold minus what has already come back.
pub fn prepare_return(
    original: &Sale,
    request: &ReturnRequest,
    returned: &HashMap<String, i64>,
    now: DateTime<Utc>,
) -> CoreResult<ReturnPosting> {
    if original.is_return() {
        return Err(CoreError::InvalidReturn {
            reason: format!("ticket {} is already a return", original.ticket),
        });
    }

    let mut requested: HashMap<&str, i64> = HashMap::new();
    for line in &request.lines {
        if line.quantity < 0 {
            return Err(ValidationError::Negative {
                field: "return quantity".to_string(),
            }
            .into());
        }
        if original.quantity_of(&line.product_id) == 0 {
            return Err(CoreError::InvalidReturn {
                reason: format!(
                    "product {} is not on ticket {}",
                    line.product_id, original.ticket
                ),
            });
        }
        *requested.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
    }

    let mut items: Vec<SaleItem> = Vec::new();
    for item in &original.items {
        // Consume per product so duplicate lines are not returned twice.
        let Some(wanted) = requested.remove(item.product_id.as_str()) else {
            continue;
        };
        if wanted == 0 {
            continue;
        }

        let sold = original.quantity_of(&item.product_id);
        let back = returned.get(&item.product_id).copied().unwrap_or(0);
        let returnable = (sold - back).max(0);
        if wanted > returnable {
            return Err(CoreError::ReturnQuantityExceeded {
                product: item.name.clone(),
                returnable,
                requested: wanted,
            });
        }

        items.push(SaleItem {
            quantity: wanted,
            ..item.clone()
        });
    }

    if items.is_empty() {
        return Err(CoreError::NothingToReturn);
    }

    let total: Money = items.iter().map(SaleItem::line_total).sum();
    if !total.is_positive() {
        return Err(CoreError::InvalidReturn {
            reason: "refund total must be positive".to_string(),
        });
    }

    let restock = items
        .iter()
        .map(|i| StockDelta {
            product_id: i.product_id.clone(),
            name: i.name.clone(),
            quantity: i.quantity,
        })
        .collect();

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        ticket: format!("R-{}", original.ticket),
        kind: SaleKind::Return,
        total,
        payment_method: refund_payment_method(request.refund_method, original.payment_method),
        cash_received: None,
        change: None,
        shift_id: original.shift_id.clone(),
        seller: original.seller.clone(),
        created_at: now,
        items,
        notes: Some(SaleNotes::Return(ReturnNote {
            reason: request.reason.trim().to_string(),
            original_ticket: original.ticket.clone(),
            original_sale_id: Some(original.id.clone()),
            original_payment_method: original.payment_method,
            refund_method: request.refund_method,
        })),
    };

    Ok(ReturnPosting { sale, restock })
}

// =============================================================================
// Unit Tests
// =============================================================================
