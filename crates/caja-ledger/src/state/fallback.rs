//! Static data shown when a whole collection fetch fails.
//!
//! Keeps the screens populated while the database is unreachable. Nothing
//! here is ever written back.

use caja_core::{Client, ClientMovement, Money, Product, Sale, Shift};

pub fn products() -> Vec<Product> {
    vec![
        Product::new("demo-pan", "Pan amasado", "Panaderia", Money::from_minor(1800), 20),
        Product::new("demo-leche", "Leche entera 1L", "Lacteos", Money::from_minor(1090), 12),
        Product::new("demo-bebida", "Bebida 1.5L", "Bebidas", Money::from_minor(2190), 4),
        Product::new("demo-arroz", "Arroz 1kg", "Abarrotes", Money::from_minor(1390), 9),
    ]
}

pub fn clients() -> Vec<Client> {
    vec![Client {
        id: "demo-cliente".to_string(),
        name: "Cliente demo".to_string(),
        authorized: true,
        balance: Money::zero(),
        credit_limit: Money::from_minor(20000),
        updated_at: None,
    }]
}

pub fn sales() -> Vec<Sale> {
    Vec::new()
}

pub fn shifts() -> Vec<Shift> {
    Vec::new()
}

pub fn movements() -> Vec<ClientMovement> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_catalog_is_consistent() {
        let products = products();
        assert!(!products.is_empty());
        assert!(products.iter().all(|p| p.id.starts_with("demo-")));
        assert!(clients().iter().all(|c| !c.balance.is_positive()));
    }
}
