//! # Catalog
//!
//! Product creation, edits, stock additions, search and low-stock listing.
//! Edits never touch historical tickets; those carry their own snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::Product;
use crate::validation::{
    validate_barcode, validate_category, validate_non_negative_count, validate_price,
    validate_product_name, validate_quantity, validate_search_query, ValidationResult,
};
use crate::DEFAULT_MIN_STOCK;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub barcode: Option<String>,
    pub price: Money,
    pub stock: i64,
    /// Defaults to the configured threshold when absent.
    pub min_stock: Option<i64>,
}

/// Partial edit. `None` leaves a field as is; an empty barcode clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.barcode.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.min_stock.is_none()
    }
}

/// Validates and builds a product. `default_min_stock` applies when the
/// input has no threshold.
pub fn new_product(
    input: &NewProduct,
    default_min_stock: Option<i64>,
    now: DateTime<Utc>,
) -> CoreResult<Product> {
    let name = validate_product_name(&input.name)?;
    let category = validate_category(&input.category)?;
    let barcode = validate_barcode(input.barcode.as_deref())?;
    validate_price(input.price)?;
    validate_non_negative_count("stock", input.stock)?;

    let min_stock = input
        .min_stock
        .or(default_min_stock)
        .unwrap_or(DEFAULT_MIN_STOCK);
    validate_non_negative_count("min stock", min_stock)?;

    Ok(Product {
        id: Uuid::new_v4().to_string(),
        name,
        category,
        barcode,
        price: input.price,
        stock: input.stock,
        min_stock,
        created_at: Some(now),
        updated_at: Some(now),
    })
}

/// Applies an edit, validating each provided field as on creation.
pub fn apply_update(
    product: &Product,
    update: &ProductUpdate,
    now: DateTime<Utc>,
) -> CoreResult<Product> {
    let mut next = product.clone();

    if let Some(name) = &update.name {
        next.name = validate_product_name(name)?;
    }
    if let Some(category) = &update.category {
        next.category = validate_category(category)?;
    }
    if let Some(barcode) = &update.barcode {
        next.barcode = validate_barcode(Some(barcode))?;
    }
    if let Some(price) = update.price {
        validate_price(price)?;
        next.price = price;
    }
    if let Some(stock) = update.stock {
        validate_non_negative_count("stock", stock)?;
        next.stock = stock;
    }
    if let Some(min_stock) = update.min_stock {
        validate_non_negative_count("min stock", min_stock)?;
        next.min_stock = min_stock;
    }

    next.updated_at = Some(now);
    Ok(next)
}

/// Manual stock addition.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockAddition {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub reason: String,
}

impl StockAddition {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_quantity(self.quantity)
    }
}

/// Case-insensitive match on name and category, substring on barcode.
///
/// An empty query returns everything.
pub fn search<'a>(products: &'a [Product], query: &str) -> CoreResult<Vec<&'a Product>> {
    let query = validate_search_query(query)?;
    if query.is_empty() {
        return Ok(products.iter().collect());
    }

    let term = query.to_lowercase();
    Ok(products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&term)
                || p.category.to_lowercase().contains(&term)
                || p.barcode.as_deref().is_some_and(|b| b.contains(&query))
        })
        .collect())
}

/// Products at or under their threshold, lowest stock first.
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    let mut low: Vec<&Product> = products.iter().filter(|p| p.is_low_stock()).collect();
    low.sort_by_key(|p| p.stock);
    low
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewProduct {
        NewProduct {
            name: "Pan amasado".to_string(),
            category: "Panaderia".to_string(),
            barcode: Some("7801".to_string()),
            price: Money::from_minor(1000),
            stock: 10,
            min_stock: None,
        }
    }

    #[test]
    fn test_new_product_defaults_threshold() {
        let product = new_product(&input(), None, Utc::now()).unwrap();
        assert_eq!(product.min_stock, DEFAULT_MIN_STOCK);

        let product = new_product(&input(), Some(8), Utc::now()).unwrap();
        assert_eq!(product.min_stock, 8);
    }

    #[test]
    fn test_new_product_rejects_bad_input() {
        let mut bad = input();
        bad.price = Money::from_minor(-5);
        assert!(new_product(&bad, None, Utc::now()).is_err());

        let mut bad = input();
        bad.stock = -1;
        assert!(new_product(&bad, None, Utc::now()).is_err());

        let mut bad = input();
        bad.category = String::new();
        assert!(new_product(&bad, None, Utc::now()).is_err());
    }

    #[test]
    fn test_apply_update() {
        let product = new_product(&input(), None, Utc::now()).unwrap();
        let update = ProductUpdate {
            price: Some(Money::from_minor(1200)),
            barcode: Some(String::new()),
            ..Default::default()
        };
        let next = apply_update(&product, &update, Utc::now()).unwrap();
        assert_eq!(next.price.minor(), 1200);
        assert_eq!(next.barcode, None);
        assert_eq!(next.name, product.name);

        let bad = ProductUpdate {
            stock: Some(-3),
            ..Default::default()
        };
        assert!(apply_update(&product, &bad, Utc::now()).is_err());
    }

    #[test]
    fn test_search() {
        let mut products = vec![
            Product::new("1", "Pan amasado", "Panaderia", Money::from_minor(1000), 10),
            Product::new("2", "Leche", "Lacteos", Money::from_minor(900), 10),
        ];
        products[1].barcode = Some("7802000".to_string());

        assert_eq!(search(&products, "").unwrap().len(), 2);
        assert_eq!(search(&products, "PAN").unwrap()[0].id, "1");
        assert_eq!(search(&products, "lact").unwrap()[0].id, "2");
        assert_eq!(search(&products, "7802").unwrap()[0].id, "2");
        assert!(search(&products, "vino").unwrap().is_empty());
    }

    #[test]
    fn test_low_stock_sorted() {
        let products = vec![
            Product::new("1", "A", "X", Money::zero(), 4),
            Product::new("2", "B", "X", Money::zero(), 50),
            Product::new("3", "C", "X", Money::zero(), 0),
        ];
        let low: Vec<&str> = low_stock(&products).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(low, vec!["3", "1"]);
    }

    #[test]
    fn test_stock_addition_validates_quantity() {
        let add = StockAddition {
            product_id: "1".to_string(),
            quantity: 0,
            reason: "recepcion".to_string(),
        };
        assert!(add.validate().is_err());
    }
}
