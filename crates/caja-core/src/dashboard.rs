//! # Dashboard
//!
//! Active-shift dashboard and closed-shift history.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::report::{product_sales, ProductSales};
use crate::shift::{summarize, ShiftSummary};
use crate::types::{Client, PaymentMethod, Product, Sale, SaleKind, Shift, ShiftStatus};

const TOP_LIMIT: usize = 5;
const LOW_STOCK_LIMIT: usize = 5;
const DEBTOR_LIMIT: usize = 5;
const LATEST_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDashboard {
    pub shift: Shift,
    pub summary: ShiftSummary,
    pub sales_count: usize,
    pub returns_count: usize,
    pub returns_total: Money,
    pub fiado_total: Money,
    pub staff_total: Money,
    /// By revenue.
    pub top_products: Vec<ProductSales>,
    pub low_stock: Vec<Product>,
    pub clients_with_debt: Vec<Client>,
    /// Newest first.
    pub latest_operations: Vec<Sale>,
}

pub fn build_dashboard(
    shift: &Shift,
    sales: &[Sale],
    products: &[Product],
    clients: &[Client],
) -> ShiftDashboard {
    let mut shift_sales: Vec<&Sale> = sales
        .iter()
        .filter(|s| s.shift_id.as_deref() == Some(shift.id.as_str()))
        .collect();
    shift_sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let sales_only: Vec<&Sale> = shift_sales
        .iter()
        .copied()
        .filter(|s| s.kind == SaleKind::Sale)
        .collect();
    let returns: Vec<&Sale> = shift_sales
        .iter()
        .copied()
        .filter(|s| s.kind == SaleKind::Return)
        .collect();

    let method_total = |method: PaymentMethod| -> Money {
        sales_only
            .iter()
            .filter(|s| s.payment_method == method)
            .map(|s| s.total)
            .sum()
    };

    let mut top_products = product_sales(sales_only.iter().copied());
    top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    top_products.truncate(TOP_LIMIT);

    let mut low_stock: Vec<Product> = products.iter().filter(|p| p.is_low_stock()).cloned().collect();
    low_stock.sort_by_key(|p| p.stock);
    low_stock.truncate(LOW_STOCK_LIMIT);

    let mut clients_with_debt: Vec<Client> = clients
        .iter()
        .filter(|c| c.balance.is_positive())
        .cloned()
        .collect();
    clients_with_debt.sort_by(|a, b| b.balance.cmp(&a.balance));
    clients_with_debt.truncate(DEBTOR_LIMIT);

    ShiftDashboard {
        shift: shift.clone(),
        summary: summarize(sales, &shift.id),
        sales_count: sales_only.len(),
        returns_count: returns.len(),
        returns_total: returns.iter().map(|s| s.total).sum(),
        fiado_total: method_total(PaymentMethod::Fiado),
        staff_total: method_total(PaymentMethod::Staff),
        top_products,
        low_stock,
        clients_with_debt,
        latest_operations: shift_sales.iter().take(LATEST_LIMIT).map(|s| (*s).clone()).collect(),
    }
}

// =============================================================================
// Shift History
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftHistory {
    /// Closed shifts, most recently ended first.
    pub shifts: Vec<Shift>,
    pub closed_count: usize,
    pub total_sales: Money,
    pub total_difference: Money,
    pub average_sales: Money,
}

pub fn shift_history(shifts: &[Shift]) -> ShiftHistory {
    let mut closed: Vec<Shift> = shifts
        .iter()
        .filter(|s| s.status == ShiftStatus::Closed)
        .cloned()
        .collect();
    closed.sort_by(|a, b| b.sort_time().cmp(&a.sort_time()));

    let total_sales: Money = closed.iter().filter_map(|s| s.total_sales).sum();
    let total_difference: Money = closed.iter().filter_map(|s| s.difference).sum();
    let average_sales = if closed.is_empty() {
        Money::zero()
    } else {
        Money::from_minor(total_sales.minor() / closed.len() as i64)
    };

    ShiftHistory {
        closed_count: closed.len(),
        shifts: closed,
        total_sales,
        total_difference,
        average_sales,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
