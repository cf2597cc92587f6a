//! # Ledger Configuration
//!
//! Store settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`CAJA_*`)
//! 2. Config file (`caja.toml` in the platform config dir, or `CAJA_CONFIG`)
//! 3. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::{Path, PathBuf};

use caja_core::{Money, COUNTER_SELLER, DEFAULT_MIN_STOCK};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Config file name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "caja.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Ledger configuration.
///
/// Missing keys in `caja.toml` keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerConfig {
    /// Store name (displayed on receipts)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    pub thousands_separator: String,

    pub decimal_separator: String,

    /// Seller recorded on sales made with no open shift.
    pub counter_seller: String,

    /// Unlocks admin screens. A convenience gate, not authentication.
    pub admin_passphrase: String,

    /// Reorder threshold for new products that do not set one.
    pub default_min_stock: i64,

    pub database_path: PathBuf,

    /// Fill a cache with demo data when its whole fetch fails.
    pub fallback_on_fetch_failure: bool,
}

impl Default for LedgerConfig {
    /// Defaults for a single-terminal store paying in whole pesos.
    fn default() -> Self {
        LedgerConfig {
            store_name: "Caja POS".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 0,
            thousands_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
            counter_seller: COUNTER_SELLER.to_string(),
            admin_passphrase: "admin".to_string(),
            default_min_stock: DEFAULT_MIN_STOCK,
            database_path: default_database_path(),
            fallback_on_fetch_failure: true,
        }
    }
}

/// Platform data dir, or `./caja.db` when it cannot be determined.
///
/// - **macOS**: `~/Library/Application Support/com.caja.pos/caja.db`
/// - **Windows**: `%APPDATA%\caja\pos\data\caja.db`
/// - **Linux**: `~/.local/share/pos/caja.db`
fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "caja", "pos")
        .map(|dirs| dirs.data_dir().join("caja.db"))
        .unwrap_or_else(|| PathBuf::from("caja.db"))
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "caja", "pos").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl LedgerConfig {
    /// Loads defaults, then the config file, then environment overrides.
    ///
    /// A missing config file is not an error; an unreadable or invalid
    /// one is.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var("CAJA_CONFIG").ok().map(PathBuf::from);
        let path = explicit.clone().or_else(default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                if explicit.is_some() {
                    warn!(path = %path.display(), "CAJA_CONFIG points to a missing file, using defaults");
                } else {
                    debug!(path = %path.display(), "No config file, using defaults");
                }
                LedgerConfig::default()
            }
            None => LedgerConfig::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        info!(store = %config.store_name, db = %config.database_path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_toml_str(&text).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Applies `CAJA_*` overrides read through `lookup`.
    ///
    /// ## Environment Variables
    /// - `CAJA_STORE_NAME`, `CAJA_CURRENCY_SYMBOL`, `CAJA_CURRENCY_DECIMALS`
    /// - `CAJA_THOUSANDS_SEPARATOR`, `CAJA_DECIMAL_SEPARATOR`
    /// - `CAJA_COUNTER_SELLER`, `CAJA_ADMIN_PASSPHRASE`
    /// - `CAJA_DEFAULT_MIN_STOCK`, `CAJA_DB_PATH`
    /// - `CAJA_FALLBACK` (`true`/`false`/`1`/`0`)
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CAJA_STORE_NAME") {
            self.store_name = v;
        }
        if let Some(v) = lookup("CAJA_CURRENCY_SYMBOL") {
            self.currency_symbol = v;
        }
        if let Some(v) = lookup("CAJA_CURRENCY_DECIMALS") {
            match v.trim().parse::<u8>() {
                Ok(d) if d <= 4 => self.currency_decimals = d,
                _ => warn!(value = %v, "Ignoring invalid CAJA_CURRENCY_DECIMALS"),
            }
        }
        if let Some(v) = lookup("CAJA_THOUSANDS_SEPARATOR") {
            self.thousands_separator = v;
        }
        if let Some(v) = lookup("CAJA_DECIMAL_SEPARATOR") {
            self.decimal_separator = v;
        }
        if let Some(v) = lookup("CAJA_COUNTER_SELLER") {
            self.counter_seller = v;
        }
        if let Some(v) = lookup("CAJA_ADMIN_PASSPHRASE") {
            self.admin_passphrase = v;
        }
        if let Some(v) = lookup("CAJA_DEFAULT_MIN_STOCK") {
            match v.trim().parse::<i64>() {
                Ok(n) if n >= 0 => self.default_min_stock = n,
                _ => warn!(value = %v, "Ignoring invalid CAJA_DEFAULT_MIN_STOCK"),
            }
        }
        if let Some(v) = lookup("CAJA_DB_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CAJA_FALLBACK") {
            match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.fallback_on_fetch_failure = true,
                "0" | "false" | "no" => self.fallback_on_fetch_failure = false,
                _ => warn!(value = %v, "Ignoring invalid CAJA_FALLBACK"),
            }
        }
    }

    /// Formats an amount in minor units for display.
    ///
    /// ## Example
    /// ```rust
    /// use caja_core::Money;
    /// use caja_ledger::LedgerConfig;
    ///
    /// let config = LedgerConfig::default();
    /// assert_eq!(config.format_currency(Money::from_minor(1234567)), "$1.234.567");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let minor = amount.minor();
        let divisor = 10_i64.pow(u32::from(self.currency_decimals));
        let whole = (minor / divisor).unsigned_abs();
        let frac = (minor % divisor).unsigned_abs();

        let digits = whole.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push_str(&self.thousands_separator);
            }
            grouped.push(ch);
        }

        let sign = if minor < 0 { "-" } else { "" };
        if self.currency_decimals == 0 {
            format!("{}{}{}", sign, self.currency_symbol, grouped)
        } else {
            format!(
                "{}{}{}{}{:0width$}",
                sign,
                self.currency_symbol,
                grouped,
                self.decimal_separator,
                frac,
                width = usize::from(self.currency_decimals)
            )
        }
    }
}
