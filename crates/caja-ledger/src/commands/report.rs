//! # Report Commands

use chrono::{DateTime, TimeZone};
use tracing::debug;

use caja_core::report::{self, Report, ReportRange};

use crate::error::ApiResult;
use crate::Ledger;

impl Ledger {
    /// Sales report over `range`, resolved in `now`'s time zone. Admin only.
    ///
    /// Returns are left out of the totals.
    pub fn report<Tz: TimeZone>(&self, range: &ReportRange, now: &DateTime<Tz>) -> ApiResult<Report> {
        debug!(range = ?range, "report command");
        self.require_admin()?;

        let window = range.window(now);
        Ok(report::build_report(
            self.cache.sales.items(),
            &window,
            &self.config.counter_seller,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::tests::ledger;
    use crate::ErrorCode;
    use caja_core::catalog::NewProduct;
    use caja_core::checkout::Tender;
    use caja_core::report::ReportRange;
    use caja_core::Money;

    #[tokio::test]
    async fn test_report_requires_admin() {
        let ledger = ledger().await;
        let err = ledger.report(&ReportRange::All, &Utc::now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_today_report_counts_counter_sales() {
        let mut ledger = ledger().await;
        ledger.unlock_admin("admin").unwrap();
        let product = ledger
            .create_product(NewProduct {
                name: "Galletas".to_string(),
                category: "Snacks".to_string(),
                barcode: None,
                price: Money::from_minor(800),
                stock: 20,
                min_stock: None,
            })
            .await
            .unwrap();

        ledger.add_to_cart(&product.id, 3).unwrap();
        ledger.checkout(Tender::Card).await.unwrap();
        ledger.add_to_cart(&product.id, 1).unwrap();
        ledger
            .checkout(Tender::Cash {
                received: Some(Money::from_minor(1000)),
            })
            .await
            .unwrap();

        let now = Utc::now();
        let report = ledger.report(&ReportRange::Today, &now).unwrap();
        assert_eq!(report.total.minor(), 3200);
        assert_eq!(report.tickets, 2);
        assert_eq!(report.average_ticket.minor(), 1600);
        assert_eq!(report.top_products[0].quantity, 4);
        assert_eq!(report.by_seller[0].seller, "Mostrador");

        let past = ReportRange::Custom {
            from: None,
            to: Some(now - Duration::days(1)),
        };
        assert_eq!(ledger.report(&past, &now).unwrap().tickets, 0);
    }
}
