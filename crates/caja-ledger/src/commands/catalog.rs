//! # Catalog Commands
//!
//! Product listing for the sale screen and catalog maintenance for admins.

use chrono::Utc;
use tracing::{debug, info};

use caja_core::catalog::{self, NewProduct, ProductUpdate, StockAddition};
use caja_core::Product;

use crate::error::{ApiError, ApiResult};
use crate::Ledger;

impl Ledger {
    /// Cached catalog, by name.
    pub fn products(&self) -> &[Product] {
        self.cache.products.items()
    }

    /// Searches the cached catalog by name, category or barcode.
    pub fn search_products(&self, query: &str) -> ApiResult<Vec<Product>> {
        debug!(query = %query, "search_products command");
        let found = catalog::search(self.cache.products.items(), query)?;
        Ok(found.into_iter().cloned().collect())
    }

    /// Products at or under their reorder threshold, lowest stock first.
    pub fn low_stock_products(&self) -> Vec<Product> {
        catalog::low_stock(self.cache.products.items())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Creates a product. Admin only.
    pub async fn create_product(&mut self, input: NewProduct) -> ApiResult<Product> {
        debug!(name = %input.name, "create_product command");
        self.require_admin()?;

        let product = catalog::new_product(&input, Some(self.config.default_min_stock), Utc::now())?;
        self.db.products().insert(&product).await?;
        self.refresh_products().await;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Applies a partial edit. Admin only.
    ///
    /// Past tickets keep the name and price they were sold with.
    pub async fn update_product(&mut self, id: &str, update: ProductUpdate) -> ApiResult<Product> {
        debug!(id = %id, "update_product command");
        self.require_admin()?;

        if update.is_empty() {
            return Err(ApiError::validation("No fields to update"));
        }

        let current = self
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", id))?;

        let next = catalog::apply_update(&current, &update, Utc::now())?;
        self.db.products().update(&next).await?;
        self.refresh_products().await;

        info!(id = %id, "Product updated");
        Ok(next)
    }

    /// Adds units to stock. Admin only.
    pub async fn add_stock(&mut self, addition: StockAddition) -> ApiResult<Product> {
        debug!(
            product_id = %addition.product_id,
            quantity = addition.quantity,
            reason = %addition.reason,
            "add_stock command"
        );
        self.require_admin()?;
        addition.validate().map_err(caja_core::CoreError::from)?;

        let product = self
            .db
            .products()
            .add_stock(&addition.product_id, addition.quantity, Utc::now())
            .await?;
        self.refresh_products().await;

        info!(id = %product.id, stock = product.stock, "Stock added");
        Ok(product)
    }
}
