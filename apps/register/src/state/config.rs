//! # Configuration State
//!
//! Register configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TALLY_*`)
//! 2. Defaults (this file)
//!
//! ## Environment Variables
//! | Variable                | Meaning                                  |
//! |-------------------------|------------------------------------------|
//! | `TALLY_DB_PATH`         | SQLite file (else platform data dir)     |
//! | `TALLY_SELLER`          | Seller recorded when a request omits one |
//! | `TALLY_STORE_NAME`      | Store name shown in listings             |
//! | `TALLY_CURRENCY_SYMBOL` | Symbol used when formatting amounts      |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Register configuration. Read-only after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Explicit database file. `None` means the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Seller used when a sale request carries none.
    pub seller: Option<String>,

    /// Store name (shown on listings)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            db_path: None,
            seller: None,
            store_name: "Tally POS".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from `TALLY_*` environment variables and defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = ConfigState::default();

        if let Some(path) = get("TALLY_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }
        config.seller = get("TALLY_SELLER");
        if let Some(store_name) = get("TALLY_STORE_NAME") {
            config.store_name = store_name;
        }
        if let Some(symbol) = get("TALLY_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        config
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}
