//! # Read-Through Caches
//!
//! One in-memory copy per collection, filled from the database.
//!
//! ## Refresh Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fetch Ok(rows)                 → replace, source = Database            │
//! │  fetch Err, fallback enabled    → static demo rows, source = Fallback   │
//! │  fetch Err, fallback disabled   → keep rows, source = Stale             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A mutation that fails never triggers a refresh, so the cache keeps
//! what it showed before the attempt.

use serde::Serialize;
use tracing::{debug, warn};
use ts_rs::TS;

use caja_core::{Client, ClientMovement, Product, Sale, Shift};
use caja_db::DbResult;

/// Where the rows currently in a collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Never loaded.
    Empty,
    Database,
    /// Static demo rows after a failed fetch.
    Fallback,
    /// Last good rows; the latest fetch failed.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    name: &'static str,
    items: Vec<T>,
    source: DataSource,
}

impl<T> Collection<T> {
    pub fn new(name: &'static str) -> Self {
        Collection {
            name,
            items: Vec::new(),
            source: DataSource::Empty,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Applies a fetch result following the refresh rules above.
    pub fn apply(&mut self, fetched: DbResult<Vec<T>>, fallback: Option<fn() -> Vec<T>>) {
        match fetched {
            Ok(rows) => {
                debug!(collection = self.name, count = rows.len(), "Cache refreshed");
                self.items = rows;
                self.source = DataSource::Database;
            }
            Err(err) => match fallback {
                Some(fallback) => {
                    warn!(collection = self.name, error = %err, "Fetch failed, showing fallback data");
                    self.items = fallback();
                    self.source = DataSource::Fallback;
                }
                None => {
                    warn!(collection = self.name, error = %err, "Fetch failed, keeping previous data");
                    self.source = DataSource::Stale;
                }
            },
        }
    }
}

/// Every cached collection.
#[derive(Debug, Clone)]
pub struct Caches {
    pub products: Collection<Product>,
    pub clients: Collection<Client>,
    /// Sales and returns, newest first.
    pub sales: Collection<Sale>,
    /// Newest start first.
    pub shifts: Collection<Shift>,
    /// Newest first.
    pub movements: Collection<ClientMovement>,
}

impl Caches {
    pub fn new() -> Self {
        Caches {
            products: Collection::new("products"),
            clients: Collection::new("clients"),
            sales: Collection::new("sales"),
            shifts: Collection::new("shifts"),
            movements: Collection::new("movements"),
        }
    }
}

impl Default for Caches {
    fn default() -> Self {
        Self::new()
    }
}
