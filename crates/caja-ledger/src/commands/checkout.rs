//! # Checkout Commands
//!
//! Cart editing and the checkout itself.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart ──► checkout(tender)                                             │
//! │              │                                                          │
//! │              ├── caja_core::checkout::checkout   (validate, build)     │
//! │              │        └── rejected → nothing written, cart kept        │
//! │              │                                                          │
//! │              ├── SaleRepository::post_sale        (one transaction)    │
//! │              │        └── conflict → rolled back, cart kept            │
//! │              │                                                          │
//! │              └── clear cart, refresh sales + products                  │
//! │                  (+ clients + movements for fiado)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{debug, info};

use caja_core::cart::Cart;
use caja_core::checkout::{self, next_ticket_number, CheckoutContext, Tender};
use caja_core::{CoreError, Money, PaymentMethod, Product, Sale};

use crate::error::ApiResult;
use crate::Ledger;

impl Ledger {
    pub fn cart(&self) -> &Cart {
        self.session.cart()
    }

    /// Adds units of a cached product, merging with an existing line.
    pub fn add_to_cart(&mut self, product_id: &str, quantity: i64) -> ApiResult<&Cart> {
        debug!(product_id = %product_id, quantity = quantity, "add_to_cart command");
        let product = self.cached_product(product_id)?;
        self.session.cart_mut().add(&product, quantity)?;
        Ok(self.session.cart())
    }

    /// Sets a line's quantity. Zero or less removes the line.
    pub fn set_cart_quantity(&mut self, product_id: &str, quantity: i64) -> ApiResult<&Cart> {
        debug!(product_id = %product_id, quantity = quantity, "set_cart_quantity command");
        if quantity <= 0 {
            self.session.cart_mut().remove(product_id);
            return Ok(self.session.cart());
        }
        let product = self.cached_product(product_id)?;
        self.session.cart_mut().set_quantity(&product, quantity)?;
        Ok(self.session.cart())
    }

    pub fn remove_from_cart(&mut self, product_id: &str) -> &Cart {
        debug!(product_id = %product_id, "remove_from_cart command");
        self.session.cart_mut().remove(product_id);
        self.session.cart()
    }

    pub fn clear_cart(&mut self) {
        debug!("clear_cart command");
        self.session.cart_mut().clear();
    }

    /// Change for `received` cash against the current cart. Never negative.
    pub fn change_preview(&self, received: Money) -> Money {
        self.session.cart().change_preview(received)
    }

    /// Validates the cart against `tender` and posts the sale.
    ///
    /// The open shift is read from the database so a shift opened on
    /// another terminal is picked up. The ticket number comes from the
    /// cache and is re-checked inside the posting transaction.
    ///
    /// ## Errors
    /// - Cart or tender rejected by the business rules (nothing written)
    /// - Stock or credit taken by another terminal first (rolled back)
    /// - Storage failure, with the database message
    pub async fn checkout(&mut self, tender: Tender) -> ApiResult<Sale> {
        debug!(
            method = tender.method().as_str(),
            lines = self.session.cart().lines().len(),
            total = self.session.cart().total().minor(),
            "checkout command"
        );

        let open_shift = self.db.shifts().find_open().await?;
        let ticket = next_ticket_number(self.cache.sales.items().iter().map(|s| s.ticket.as_str()));

        let posting = checkout::checkout(
            self.session.cart(),
            &tender,
            CheckoutContext {
                open_shift: open_shift.as_ref(),
                clients: self.cache.clients.items(),
                counter_seller: &self.config.counter_seller,
                ticket,
                now: Utc::now(),
            },
        )?;

        let is_fiado = posting.fiado.is_some();
        let sale = self.db.sales().post_sale(posting).await?;

        self.session.cart_mut().clear();
        self.refresh_sales().await;
        self.refresh_products().await;
        if is_fiado {
            self.refresh_clients().await;
            self.refresh_movements().await;
        }

        info!(
            ticket = %sale.ticket,
            total = %sale.total,
            method = sale.payment_method.as_str(),
            "Checkout completed"
        );
        Ok(sale)
    }

    /// Corrects the payment method recorded on a sale. Admin only.
    ///
    /// Only the label changes: stock, balances and movements stay as they
    /// were posted.
    pub async fn reassign_payment_method(
        &mut self,
        sale_id: &str,
        method: PaymentMethod,
    ) -> ApiResult<()> {
        debug!(sale_id = %sale_id, method = method.as_str(), "reassign_payment_method command");
        self.require_admin()?;

        self.db.sales().update_payment_method(sale_id, method).await?;
        self.refresh_sales().await;

        info!(sale_id = %sale_id, "Sale corrected");
        Ok(())
    }

    fn cached_product(&self, product_id: &str) -> ApiResult<Product> {
        self.cache
            .products
            .items()
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::ledger;
    use crate::{ErrorCode, Ledger};
    use caja_core::catalog::NewProduct;
    use caja_core::checkout::Tender;
    use caja_core::{Money, PaymentMethod, Product};

    async fn with_product(ledger: &mut Ledger, price: i64, stock: i64) -> Product {
        ledger.unlock_admin("admin").unwrap();
        let product = ledger
            .create_product(NewProduct {
                name: "Pan amasado".to_string(),
                category: "Panaderia".to_string(),
                barcode: None,
                price: Money::from_minor(price),
                stock,
                min_stock: None,
            })
            .await
            .unwrap();
        ledger.lock_admin();
        product
    }

    #[tokio::test]
    async fn test_cart_editing() {
        let mut ledger = ledger().await;
        let pan = with_product(&mut ledger, 1000, 10).await;

        ledger.add_to_cart(&pan.id, 2).unwrap();
        ledger.add_to_cart(&pan.id, 1).unwrap();
        assert_eq!(ledger.cart().item_count(), 3);
        assert_eq!(ledger.change_preview(Money::from_minor(5000)).minor(), 2000);
        assert_eq!(ledger.change_preview(Money::from_minor(100)).minor(), 0);

        let err = ledger.set_cart_quantity(&pan.id, 11).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        ledger.set_cart_quantity(&pan.id, 0).unwrap();
        assert!(ledger.cart().is_empty());

        let err = ledger.add_to_cart("missing", 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_rejected_checkout_keeps_cart_and_writes_nothing() {
        let mut ledger = ledger().await;
        let pan = with_product(&mut ledger, 1000, 10).await;
        ledger.add_to_cart(&pan.id, 2).unwrap();

        let err = ledger
            .checkout(Tender::Cash {
                received: Some(Money::from_minor(1500)),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(ledger.cart().item_count(), 2);
        assert!(ledger.cache().sales.is_empty());
        assert_eq!(ledger.products()[0].stock, 10);
    }

    #[tokio::test]
    async fn test_tickets_increase_and_cart_clears() {
        let mut ledger = ledger().await;
        let pan = with_product(&mut ledger, 1000, 10).await;

        ledger.add_to_cart(&pan.id, 1).unwrap();
        let first = ledger.checkout(Tender::Card).await.unwrap();
        assert!(ledger.cart().is_empty());

        ledger.add_to_cart(&pan.id, 1).unwrap();
        let second = ledger.checkout(Tender::Transfer).await.unwrap();

        assert_eq!(first.ticket, "000001");
        assert_eq!(second.ticket, "000002");
        assert_eq!(first.seller.as_deref(), Some("Mostrador"));
        assert_eq!(ledger.products()[0].stock, 8);
        assert_eq!(ledger.cache().sales.items().len(), 2);
    }

    #[tokio::test]
    async fn test_staff_requires_open_shift() {
        let mut ledger = ledger().await;
        let pan = with_product(&mut ledger, 1000, 10).await;
        ledger.add_to_cart(&pan.id, 1).unwrap();

        let err = ledger.checkout(Tender::Staff).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ShiftError);
    }

    #[tokio::test]
    async fn test_reassign_payment_method() {
        let mut ledger = ledger().await;
        let pan = with_product(&mut ledger, 1000, 10).await;
        ledger.add_to_cart(&pan.id, 1).unwrap();
        let sale = ledger.checkout(Tender::Card).await.unwrap();

        let err = ledger
            .reassign_payment_method(&sale.id, PaymentMethod::Transfer)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        ledger.unlock_admin("admin").unwrap();
        ledger
            .reassign_payment_method(&sale.id, PaymentMethod::Transfer)
            .await
            .unwrap();
        assert_eq!(
            ledger.cache().sales.items()[0].payment_method,
            PaymentMethod::Transfer
        );
        assert_eq!(ledger.products()[0].stock, 9);
    }
}
