//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - List / get / insert / update
//! - Stock additions as a delta (`stock = stock + ?`)
//!
//! Stock decrements for sales never go through here; they are part of
//! [`SaleRepository::post_sale`](super::sale::SaleRepository::post_sale).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{format_timestamp, parse_optional_timestamp};
use crate::error::{DbError, DbResult};
use caja_core::{Money, Product, DEFAULT_MIN_STOCK};

/// Raw `products` row. Every nullable column is optional.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name.unwrap_or_default(),
            category: row.category.unwrap_or_default(),
            barcode: row.barcode.filter(|b| !b.trim().is_empty()),
            price: Money::from_minor(row.price.unwrap_or(0)),
            stock: row.stock.unwrap_or(0),
            min_stock: row.min_stock.unwrap_or(DEFAULT_MIN_STOCK),
            created_at: parse_optional_timestamp(row.created_at.as_deref()),
            updated_at: parse_optional_timestamp(row.updated_at.as_deref()),
        }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, category, barcode, price, stock, min_stock, created_at, updated_at
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let all = repo.list_all().await?;
/// let restocked = repo.add_stock("uuid-here", 12, Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{} ORDER BY name COLLATE NOCASE", SELECT_PRODUCT);
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Loaded products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{} WHERE id = ?", SELECT_PRODUCT);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, barcode, price, stock, min_stock, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.barcode)
        .bind(product.price.minor())
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(format_timestamp(&product.created_at.unwrap_or(now)))
        .bind(format_timestamp(&product.updated_at.unwrap_or(now)))
        .execute(&self.pool)
        .await?;

        info!(id = %product.id, "Product created");
        Ok(())
    }

    /// Overwrites every editable field of an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let updated_at = product.updated_at.unwrap_or_else(Utc::now);
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?, category = ?, barcode = ?, price = ?, stock = ?,
                min_stock = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.barcode)
        .bind(product.price.minor())
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(format_timestamp(&updated_at))
        .bind(&product.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        info!(id = %product.id, "Product updated");
        Ok(())
    }

    /// Adds `quantity` units to stock and returns the updated product.
    ///
    /// A delta, so a concurrent sale on another terminal is not overwritten.
    pub async fn add_stock(
        &self,
        id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Product> {
        debug!(id = %id, quantity = quantity, "Adding stock");

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET stock = COALESCE(stock, 0) + ?, updated_at = ?
            WHERE id = ?
            RETURNING id, name, category, barcode, price, stock, min_stock, created_at, updated_at
            "#,
        )
        .bind(quantity)
        .bind(format_timestamp(&now))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        let product = Product::from(row);
        info!(id = %id, stock = product.stock, "Stock added");
        Ok(product)
    }

    /// Gets the total count of products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
