//! # caja-ledger: Session Layer for Caja POS
//!
//! The component a presentation shell drives: it owns the caches, the cart
//! and the admin gate, and exposes one async method per user intent.
//!
//! ## Module Organization
//! ```text
//! caja_ledger/
//! ├── lib.rs          ◄─── You are here (Ledger, startup, tracing)
//! ├── state/
//! │   ├── config.rs   ◄─── LedgerConfig (env, caja.toml, defaults)
//! │   ├── cache.rs    ◄─── Read-through collections
//! │   ├── fallback.rs ◄─── Demo rows for failed fetches
//! │   └── session.rs  ◄─── Cart + admin gate
//! ├── commands/
//! │   ├── catalog.rs  ◄─── Products, stock, search
//! │   ├── checkout.rs ◄─── Cart, checkout, payment-method correction
//! │   ├── returns.rs  ◄─── Returns against posted tickets
//! │   ├── shift.rs    ◄─── Open/close, dashboard, history
//! │   ├── credit.rs   ◄─── Fiado clients and payments
//! │   └── report.rs   ◄─── Sales reports
//! └── error.rs        ◄─── ApiError for commands
//! ```
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Validate against caches (caja-core, pure)  ── reject → no writes   │
//! │  2. Post to SQLite (caja-db, one transaction)  ── fail → cache as-is   │
//! │  3. Re-fetch the collections the posting touched                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! caja_ledger::init_tracing();
//! let mut ledger = Ledger::open(LedgerConfig::load()?).await?;
//! ledger.add_to_cart("product-id", 2)?;
//! let sale = ledger.checkout(Tender::Card).await?;
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use caja_db::{Database, DbConfig};

pub use commands::returns::ReturnableItem;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::{Caches, ConfigError, DataSource, LedgerConfig, Session};

/// Ledger shared between tasks of one terminal.
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Caches, session and database handle for one terminal.
#[derive(Debug)]
pub struct Ledger {
    db: Database,
    config: LedgerConfig,
    cache: Caches,
    session: Session,
}

impl Ledger {
    /// Connects to the configured database file and loads every cache.
    ///
    /// ## Startup Sequence
    /// 1. Create the database directory if needed
    /// 2. Open the pool and run migrations
    /// 3. Fetch all collections (fallback data on failure)
    pub async fn open(config: LedgerConfig) -> ApiResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ApiError::internal(format!(
                        "Cannot create data directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let db = Database::new(DbConfig::new(&config.database_path)).await?;
        Ok(Self::with_database(db, config).await)
    }

    /// Wraps an existing database handle and loads every cache.
    pub async fn with_database(db: Database, config: LedgerConfig) -> Self {
        let mut ledger = Ledger {
            db,
            config,
            cache: Caches::new(),
            session: Session::new(),
        };
        ledger.refresh_all().await;
        info!(store = %ledger.config.store_name, "Ledger ready");
        ledger
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn cache(&self) -> &Caches {
        &self.cache
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Admin gate
    // =========================================================================

    /// Unlocks admin screens when `passphrase` matches the configured one.
    pub fn unlock_admin(&mut self, passphrase: &str) -> ApiResult<()> {
        if self
            .session
            .unlock_admin(passphrase, &self.config.admin_passphrase)
        {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    pub fn lock_admin(&mut self) {
        self.session.lock_admin();
    }

    pub(crate) fn require_admin(&self) -> ApiResult<()> {
        if self.session.is_admin_unlocked() {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    // =========================================================================
    // Cache refresh
    // =========================================================================

    pub async fn refresh_all(&mut self) {
        self.refresh_products().await;
        self.refresh_clients().await;
        self.refresh_sales().await;
        self.refresh_shifts().await;
        self.refresh_movements().await;
    }

    pub(crate) async fn refresh_products(&mut self) {
        let fetched = self.db.products().list_all().await;
        let fallback = self
            .config
            .fallback_on_fetch_failure
            .then_some(state::fallback::products as fn() -> _);
        self.cache.products.apply(fetched, fallback);
    }

    pub(crate) async fn refresh_clients(&mut self) {
        let fetched = self.db.clients().list_all().await;
        let fallback = self
            .config
            .fallback_on_fetch_failure
            .then_some(state::fallback::clients as fn() -> _);
        self.cache.clients.apply(fetched, fallback);
    }

    pub(crate) async fn refresh_sales(&mut self) {
        let fetched = self.db.sales().list_all().await;
        let fallback = self
            .config
            .fallback_on_fetch_failure
            .then_some(state::fallback::sales as fn() -> _);
        self.cache.sales.apply(fetched, fallback);
    }

    pub(crate) async fn refresh_shifts(&mut self) {
        let fetched = self.db.shifts().list_all().await;
        let fallback = self
            .config
            .fallback_on_fetch_failure
            .then_some(state::fallback::shifts as fn() -> _);
        self.cache.shifts.apply(fetched, fallback);
    }

    pub(crate) async fn refresh_movements(&mut self) {
        let fetched = self.db.movements().list(None).await;
        let fallback = self
            .config
            .fallback_on_fetch_failure
            .then_some(state::fallback::movements as fn() -> _);
        self.cache.movements.apply(fetched, fallback);
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=caja=trace` - Show trace for caja crates only
/// - Default: `info,caja=debug,sqlx=warn`
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caja=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) async fn ledger() -> Ledger {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Ledger::with_database(db, LedgerConfig::default()).await
    }

    #[tokio::test]
    async fn test_startup_loads_empty_database() {
        let ledger = ledger().await;
        assert_eq!(ledger.cache().products.source(), DataSource::Database);
        assert!(ledger.cache().products.is_empty());
        assert!(ledger.cache().sales.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_uses_fallback() {
        let mut ledger = ledger().await;
        ledger.database().close().await;

        ledger.refresh_all().await;
        assert_eq!(ledger.cache().products.source(), DataSource::Fallback);
        assert!(!ledger.cache().products.is_empty());
        assert_eq!(ledger.cache().sales.source(), DataSource::Fallback);
    }

    #[tokio::test]
    async fn test_failed_fetch_without_fallback_keeps_rows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = LedgerConfig {
            fallback_on_fetch_failure: false,
            ..LedgerConfig::default()
        };
        let mut ledger = Ledger::with_database(db, config).await;
        ledger.database().close().await;

        ledger.refresh_products().await;
        assert_eq!(ledger.cache().products.source(), DataSource::Stale);
    }

    #[tokio::test]
    async fn test_admin_gate() {
        let mut ledger = ledger().await;
        assert_eq!(ledger.require_admin().unwrap_err().code, ErrorCode::Forbidden);

        assert!(ledger.unlock_admin("wrong").is_err());
        ledger.unlock_admin("admin").unwrap();
        assert!(ledger.require_admin().is_ok());

        ledger.lock_admin();
        assert!(ledger.require_admin().is_err());
    }

    #[tokio::test]
    async fn test_shared_handle() {
        let shared = ledger().await.into_shared();
        let guard = shared.lock().await;
        assert_eq!(guard.config().counter_seller, "Mostrador");
    }
}
