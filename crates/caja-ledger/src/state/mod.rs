//! # State Module
//!
//! Everything the ledger holds between commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   Caches     │  │   Session    │  │   LedgerConfig   │              │
//! │  │              │  │              │  │                  │              │
//! │  │  products    │  │  cart        │  │  store_name      │              │
//! │  │  clients     │  │  admin gate  │  │  currency        │              │
//! │  │  sales       │  │              │  │  counter seller  │              │
//! │  │  shifts      │  │              │  │  database path   │              │
//! │  │  movements   │  │              │  │                  │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  Caches: refreshed from SQLite after every successful mutation         │
//! │  Session: per terminal, never persisted                                │
//! │  LedgerConfig: read-only after startup                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cache;
mod config;
pub(crate) mod fallback;
mod session;

pub use cache::{Caches, Collection, DataSource};
pub use config::{ConfigError, LedgerConfig, CONFIG_FILE_NAME};
pub use session::Session;
