//! # Repository Module
//!
//! Database repository implementations for Caja POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Ledger command                                                        │
//! │       │                                                                 │
//! │       │  db.sales().post_sale(posting)                                 │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── list_all(&self)                                                   │
//! │  ├── post_sale(&self, posting)     ← one transaction                   │
//! │  └── post_return(&self, posting)   ← one transaction                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tolerant Reads
//!
//! Row structs use `Option` for every nullable column and map into the
//! core types with defaults: missing numbers read as 0, missing flags as
//! false, unknown enum labels through each type's `parse_lenient`.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and stock adjustments
//! - [`client::ClientRepository`] - Credit accounts and payments
//! - [`sale::SaleRepository`] - Sales, returns and atomic posting
//! - [`shift::ShiftRepository`] - Open/close cash-drawer shifts
//! - [`movement::MovementRepository`] - Client balance audit trail

pub mod client;
pub mod movement;
pub mod product;
pub mod sale;
pub mod shift;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses RFC 3339, or the `YYYY-MM-DD HH:MM:SS` form SQLite's own
/// `datetime()` produces.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn parse_optional_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.and_then(parse_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_round_trip_and_legacy_form() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let text = format_timestamp(&at);
        assert_eq!(text, "2024-03-09T14:05:00.000000Z");
        assert_eq!(parse_timestamp(&text), Some(at));
        assert_eq!(parse_timestamp("2024-03-09 14:05:00"), Some(at));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
