//! # Return Commands
//!
//! Returns against a posted ticket. Each line may come back at most up to
//! what was sold minus what earlier returns already took back.
//!
//! A return on a fiado ticket does not reduce the client's balance.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;

use caja_core::returns::{self, ReturnRequest};
use caja_core::{CoreError, Money, Sale};

use crate::error::ApiResult;
use crate::Ledger;

/// One line of the return form.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnableItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub sold: i64,
    pub already_returned: i64,
    pub returnable: i64,
}

impl Ledger {
    /// Lines of a sale with how many units can still come back.
    pub fn returnable_items(&self, sale_id: &str) -> ApiResult<Vec<ReturnableItem>> {
        debug!(sale_id = %sale_id, "returnable_items command");

        let sales = self.cache.sales.items();
        let original = sales
            .iter()
            .find(|s| s.id == sale_id)
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        let returned = returns::already_returned(original, sales);

        Ok(returnable_lines(original, &returned))
    }

    /// Posts a return and puts the units back into stock.
    pub async fn process_return(&mut self, request: ReturnRequest) -> ApiResult<Sale> {
        debug!(
            sale_id = %request.sale_id,
            lines = request.lines.len(),
            refund = request.refund_method.as_str(),
            "process_return command"
        );

        let original = self
            .db
            .sales()
            .get_by_id(&request.sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(request.sale_id.clone()))?;

        let history = self.db.sales().list_all().await?;
        let returned = returns::already_returned(&original, &history);
        let posting = returns::prepare_return(&original, &request, &returned, Utc::now())?;

        let sale = self.db.sales().post_return(posting).await?;

        self.refresh_sales().await;
        self.refresh_products().await;

        info!(
            ticket = %sale.ticket,
            total = %sale.total,
            original = %original.ticket,
            "Return processed"
        );
        Ok(sale)
    }
}

/// One row per product, in ticket order.
fn returnable_lines(original: &Sale, returned: &HashMap<String, i64>) -> Vec<ReturnableItem> {
    let mut lines: Vec<ReturnableItem> = Vec::new();

    for item in &original.items {
        if lines.iter().any(|l| l.product_id == item.product_id) {
            continue;
        }
        let sold = original.quantity_of(&item.product_id);
        let back = returned.get(&item.product_id).copied().unwrap_or(0);
        lines.push(ReturnableItem {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            sold,
            already_returned: back,
            returnable: (sold - back).max(0),
        });
    }

    lines
}

#[cfg(test)]
mod tests {
    use crate::tests::ledger;
    use crate::{ErrorCode, Ledger};
    use caja_core::catalog::NewProduct;
    use caja_core::checkout::Tender;
    use caja_core::returns::{ReturnLine, ReturnRequest};
    use caja_core::{Money, RefundMethod, Sale};

    async fn sold_three(ledger: &mut Ledger) -> Sale {
        ledger.unlock_admin("admin").unwrap();
        let product = ledger
            .create_product(NewProduct {
                name: "Bebida 1.5L".to_string(),
                category: "Bebidas".to_string(),
                barcode: None,
                price: Money::from_minor(1500),
                stock: 10,
                min_stock: None,
            })
            .await
            .unwrap();
        ledger.add_to_cart(&product.id, 3).unwrap();
        ledger.checkout(Tender::Card).await.unwrap()
    }

    fn request(sale: &Sale, quantity: i64) -> ReturnRequest {
        ReturnRequest {
            sale_id: sale.id.clone(),
            lines: vec![ReturnLine {
                product_id: sale.items[0].product_id.clone(),
                quantity,
            }],
            reason: "Vencido".to_string(),
            refund_method: RefundMethod::Cash,
        }
    }

    #[tokio::test]
    async fn test_returnable_items_shrink_after_each_return() {
        let mut ledger = ledger().await;
        let sale = sold_three(&mut ledger).await;

        let lines = ledger.returnable_items(&sale.id).unwrap();
        assert_eq!(lines[0].returnable, 3);

        let ret = ledger.process_return(request(&sale, 2)).await.unwrap();
        assert_eq!(ret.ticket, format!("R-{}", sale.ticket));
        assert_eq!(ret.total.minor(), 3000);

        let lines = ledger.returnable_items(&sale.id).unwrap();
        assert_eq!(lines[0].already_returned, 2);
        assert_eq!(lines[0].returnable, 1);

        let err = ledger.process_return(request(&sale, 2)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(ledger.products()[0].stock, 9);
    }

    #[tokio::test]
    async fn test_zero_quantity_return_is_rejected() {
        let mut ledger = ledger().await;
        let sale = sold_three(&mut ledger).await;

        let err = ledger.process_return(request(&sale, 0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(ledger.cache().sales.items().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_sale() {
        let mut ledger = ledger().await;
        let err = ledger.returnable_items("nope").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
