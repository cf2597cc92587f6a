//! # Reports
//!
//! Read-only summaries of sale records over a time window.
//!
//! ## Windows
//! ```text
//! All       no filter
//! Today     [00:00 today, 00:00 tomorrow)
//! Week      [Sunday 00:00, next Sunday 00:00)
//! Month     [1st 00:00, 1st of next month 00:00)
//! Custom    [from, to]   either side optional, both inclusive
//! ```
//! Calendar windows are computed in the caller's time zone and stored as
//! UTC instants.
//!
//! Returns are excluded from report totals.

use std::collections::HashMap;
use std::ops::Bound;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentBreakdown, Sale, SaleKind};

/// Maximum rows in the top products list.
pub const TOP_PRODUCTS_LIMIT: usize = 20;

// =============================================================================
// Range & Window
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "range", rename_all = "lowercase")]
pub enum ReportRange {
    All,
    Today,
    Week,
    Month,
    Custom {
        #[ts(as = "Option<String>")]
        from: Option<DateTime<Utc>>,
        #[ts(as = "Option<String>")]
        to: Option<DateTime<Utc>>,
    },
}

impl Default for ReportRange {
    fn default() -> Self {
        ReportRange::Today
    }
}

/// A resolved time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Bound<DateTime<Utc>>,
}

impl ReportWindow {
    pub const fn unbounded() -> Self {
        ReportWindow {
            start: None,
            end: Bound::Unbounded,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if matches!(self.start, Some(start) if at < start) {
            return false;
        }
        match self.end {
            Bound::Included(end) => at <= end,
            Bound::Excluded(end) => at < end,
            Bound::Unbounded => true,
        }
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn half_open<Tz: TimeZone>(tz: &Tz, from: NaiveDate, to: NaiveDate) -> ReportWindow {
    ReportWindow {
        start: Some(local_midnight(tz, from)),
        end: Bound::Excluded(local_midnight(tz, to)),
    }
}

impl ReportRange {
    /// Resolves the range around `now`, in `now`'s time zone.
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> ReportWindow {
        let tz = now.timezone();
        let today = now.date_naive();

        match self {
            ReportRange::All => ReportWindow::unbounded(),
            ReportRange::Today => half_open(&tz, today, today + Duration::days(1)),
            ReportRange::Week => {
                let back = i64::from(today.weekday().num_days_from_sunday());
                let sunday = today - Duration::days(back);
                half_open(&tz, sunday, sunday + Duration::days(7))
            }
            ReportRange::Month => {
                let first = today.with_day(1).unwrap_or(today);
                match first.checked_add_months(Months::new(1)) {
                    Some(next) => half_open(&tz, first, next),
                    None => ReportWindow {
                        start: Some(local_midnight(&tz, first)),
                        end: Bound::Unbounded,
                    },
                }
            }
            ReportRange::Custom { from, to } => ReportWindow {
                start: *from,
                end: to.map_or(Bound::Unbounded, Bound::Included),
            },
        }
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SellerTotals {
    pub seller: String,
    pub total: Money,
    pub tickets: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub total: Money,
    pub tickets: i64,
    pub average_ticket: Money,
    pub by_payment: PaymentBreakdown,
    pub top_products: Vec<ProductSales>,
    pub by_seller: Vec<SellerTotals>,
}

/// Per-product quantity and revenue, in first-encountered order.
pub(crate) fn product_sales<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Vec<ProductSales> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<ProductSales> = Vec::new();

    for sale in sales {
        for item in &sale.items {
            let slot = *index.entry(item.product_id.as_str()).or_insert_with(|| {
                rows.push(ProductSales {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    quantity: 0,
                    revenue: Money::zero(),
                });
                rows.len() - 1
            });
            let row = &mut rows[slot];
            row.quantity += item.quantity;
            row.revenue += item.line_total();
        }
    }

    rows
}

/// Builds a report over the sale records inside `window`.
///
/// `counter_label` names sales recorded without a seller.
pub fn build_report(sales: &[Sale], window: &ReportWindow, counter_label: &str) -> Report {
    let filtered: Vec<&Sale> = sales
        .iter()
        .filter(|s| s.kind == SaleKind::Sale && window.contains(s.created_at))
        .collect();

    let mut total = Money::zero();
    let mut by_payment = PaymentBreakdown::default();
    let mut by_seller: Vec<SellerTotals> = Vec::new();

    for sale in &filtered {
        total += sale.total;
        by_payment.add(sale.payment_method, sale.total);

        let seller = sale.seller.as_deref().unwrap_or(counter_label);
        match by_seller.iter_mut().find(|s| s.seller == seller) {
            Some(entry) => {
                entry.total += sale.total;
                entry.tickets += 1;
            }
            None => by_seller.push(SellerTotals {
                seller: seller.to_string(),
                total: sale.total,
                tickets: 1,
            }),
        }
    }

    let mut top_products = product_sales(filtered.iter().copied());
    // sort_by is stable: ties keep first-encountered order.
    top_products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    top_products.truncate(TOP_PRODUCTS_LIMIT);

    let tickets = filtered.len() as i64;
    let average_ticket = if tickets > 0 {
        Money::from_minor(total.minor() / tickets)
    } else {
        Money::zero()
    };

    Report {
        total,
        tickets,
        average_ticket,
        by_payment,
        top_products,
        by_seller,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleItem};
    use chrono::FixedOffset;

    fn sale_at(at: DateTime<Utc>, kind: SaleKind, seller: Option<&str>, items: &[(&str, i64, i64)]) -> Sale {
        let items: Vec<SaleItem> = items
            .iter()
            .map(|(id, price, qty)| SaleItem {
                product_id: id.to_string(),
                name: id.to_uppercase(),
                price: Money::from_minor(*price),
                quantity: *qty,
            })
            .collect();
        Sale {
            id: format!("sale-{}", at.timestamp()),
            ticket: "000001".to_string(),
            kind,
            total: items.iter().map(SaleItem::line_total).sum(),
            payment_method: PaymentMethod::Cash,
            cash_received: None,
            change: None,
            shift_id: None,
            seller: seller.map(str::to_string),
            created_at: at,
            items,
            notes: None,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_today_window_is_half_open() {
        let now = utc(2026, 10, 14, 15);
        let w = ReportRange::Today.window(&now);
        assert!(w.contains(utc(2026, 10, 14, 0)));
        assert!(w.contains(utc(2026, 10, 14, 23)));
        assert!(!w.contains(utc(2026, 10, 15, 0)));
        assert!(!w.contains(utc(2026, 10, 13, 23)));
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 2026-10-14 is a Wednesday.
        let now = utc(2026, 10, 14, 12);
        let w = ReportRange::Week.window(&now);
        assert_eq!(w.start, Some(utc(2026, 10, 11, 0)));
        assert_eq!(w.end, Bound::Excluded(utc(2026, 10, 18, 0)));
    }

    #[test]
    fn test_month_window_in_local_zone() {
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 12, 20, 10, 0, 0).unwrap();
        let w = ReportRange::Month.window(&now);
        assert_eq!(w.start, Some(utc(2026, 12, 1, 3)));
        assert_eq!(w.end, Bound::Excluded(utc(2027, 1, 1, 3)));
    }

    #[test]
    fn test_custom_is_inclusive() {
        let w = ReportRange::Custom {
            from: Some(utc(2026, 1, 1, 0)),
            to: Some(utc(2026, 1, 31, 0)),
        }
        .window(&Utc::now());
        assert!(w.contains(utc(2026, 1, 31, 0)));
        assert!(!w.contains(utc(2026, 1, 31, 1)));
        assert!(ReportRange::All.window(&Utc::now()).contains(utc(1999, 1, 1, 0)));
    }

    #[test]
    fn test_product_keeps_first_seen_name() {
        let at = utc(2026, 10, 14, 12);
        let first = sale_at(at, SaleKind::Sale, None, &[("pan", 1000, 1)]);
        let mut renamed = sale_at(at, SaleKind::Sale, None, &[("pan", 1200, 2)]);
        renamed.items[0].name = "Pan amasado".to_string();

        let rows = product_sales([&first, &renamed]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "PAN");
        assert_eq!(rows[0].quantity, 3);
        assert_eq!(rows[0].revenue.minor(), 3400);
    }

    #[test]
    fn test_report_excludes_returns_and_groups_sellers() {
        let at = utc(2026, 10, 14, 12);
        let sales = vec![
            sale_at(at, SaleKind::Sale, Some("Ana"), &[("pan", 1000, 2)]),
            sale_at(at, SaleKind::Sale, None, &[("leche", 500, 1)]),
            sale_at(at, SaleKind::Return, Some("Ana"), &[("pan", 1000, 1)]),
            sale_at(at, SaleKind::Sale, Some("Ana"), &[("pan", 1000, 1)]),
        ];

        let report = build_report(&sales, &ReportWindow::unbounded(), "Mostrador");
        assert_eq!(report.total.minor(), 3500);
        assert_eq!(report.tickets, 3);
        assert_eq!(report.average_ticket.minor(), 1166);
        assert_eq!(report.by_payment.cash.minor(), 3500);
        assert_eq!(report.by_payment.fiado, Money::zero());

        assert_eq!(report.by_seller.len(), 2);
        assert_eq!(report.by_seller[0].seller, "Ana");
        assert_eq!(report.by_seller[0].tickets, 2);
        assert_eq!(report.by_seller[1].seller, "Mostrador");

        assert_eq!(report.top_products[0].product_id, "pan");
        assert_eq!(report.top_products[0].quantity, 3);
    }

    #[test]
    fn test_top_products_ties_keep_first_seen_order() {
        let at = utc(2026, 10, 14, 12);
        let sales = vec![
            sale_at(at, SaleKind::Sale, None, &[("b", 100, 1), ("a", 100, 1)]),
            sale_at(at, SaleKind::Sale, None, &[("c", 100, 2)]),
        ];
        let report = build_report(&sales, &ReportWindow::unbounded(), "Mostrador");
        let order: Vec<&str> = report.top_products.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_top_products_capped() {
        let at = utc(2026, 10, 14, 12);
        let names: Vec<String> = (0..30).map(|i| format!("p{}", i)).collect();
        let items: Vec<(&str, i64, i64)> = names.iter().map(|n| (n.as_str(), 10, 1)).collect();
        let sales = vec![sale_at(at, SaleKind::Sale, None, &items)];
        let report = build_report(&sales, &ReportWindow::unbounded(), "Mostrador");
        assert_eq!(report.top_products.len(), TOP_PRODUCTS_LIMIT);
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(&[], &ReportWindow::unbounded(), "Mostrador");
        assert_eq!(report.tickets, 0);
        assert!(report.average_ticket.is_zero());
        assert!(report.top_products.is_empty());
    }
}
