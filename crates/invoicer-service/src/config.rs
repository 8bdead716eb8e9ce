//! Service configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! ```text
//! INVOICER_DB_PATH              ./invoicer.db
//! INVOICER_DB_MAX_CONNECTIONS   5
//! INVOICER_MODE                 standard | pos
//! INVOICER_TAX_RATE_BPS         1000   (10%)
//! INVOICER_WALK_IN_NAME         Walk-in Customer
//! INVOICER_PAYMENT_TERMS_DAYS   30 in standard mode, 0 in pos mode
//! INVOICER_NUMBER_PREFIX        INV in standard mode, POS in pos mode
//! INVOICER_PERSIST_TIMEOUT_MS   5000
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use invoicer_core::validation::validate_tax_rate_bps;
use invoicer_core::{
    InvoicePolicy, InvoicingMode, TaxRate, DEFAULT_TAX_RATE_BPS, DEFAULT_WALK_IN_CUSTOMER_NAME,
};
use invoicer_db::DbConfig;

/// Invoicer service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Invoicing mode (standard or point-of-sale)
    pub mode: InvoicingMode,

    /// Tax rate in basis points
    pub tax_rate_bps: u32,

    /// Customer name used for point-of-sale invoices without a customer
    pub walk_in_customer_name: String,

    /// Days between issue and due date; mode default when unset
    pub payment_terms_days: Option<u32>,

    /// Invoice number prefix; mode default when unset
    pub number_prefix: Option<String>,

    /// Upper bound on one invoice write, in milliseconds
    pub persist_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("./invoicer.db"),
            db_max_connections: 5,
            mode: InvoicingMode::Standard,
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            walk_in_customer_name: DEFAULT_WALK_IN_CUSTOMER_NAME.to_string(),
            payment_terms_days: None,
            number_prefix: None,
            persist_timeout_ms: 5_000,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let config = AppConfig {
            database_path: lookup("INVOICER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_or(&lookup, "INVOICER_DB_MAX_CONNECTIONS", defaults.db_max_connections)?,

            mode: match lookup("INVOICER_MODE") {
                Some(raw) => InvoicingMode::from_str(&raw)
                    .map_err(|_| ConfigError::InvalidValue("INVOICER_MODE".to_string()))?,
                None => defaults.mode,
            },

            tax_rate_bps: parse_or(&lookup, "INVOICER_TAX_RATE_BPS", defaults.tax_rate_bps)?,

            walk_in_customer_name: lookup("INVOICER_WALK_IN_NAME")
                .map(|s| s.trim().to_string())
                .unwrap_or(defaults.walk_in_customer_name),

            payment_terms_days: match lookup("INVOICER_PAYMENT_TERMS_DAYS") {
                Some(raw) => Some(raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue("INVOICER_PAYMENT_TERMS_DAYS".to_string())
                })?),
                None => None,
            },

            number_prefix: lookup("INVOICER_NUMBER_PREFIX").map(|s| s.trim().to_string()),

            persist_timeout_ms: parse_or(&lookup, "INVOICER_PERSIST_TIMEOUT_MS", defaults.persist_timeout_ms)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("INVOICER_DB_MAX_CONNECTIONS".to_string()));
        }
        if validate_tax_rate_bps(self.tax_rate_bps).is_err() {
            return Err(ConfigError::InvalidValue("INVOICER_TAX_RATE_BPS".to_string()));
        }
        if self.walk_in_customer_name.is_empty() {
            return Err(ConfigError::InvalidValue("INVOICER_WALK_IN_NAME".to_string()));
        }
        if matches!(self.number_prefix.as_deref(), Some("")) {
            return Err(ConfigError::InvalidValue("INVOICER_NUMBER_PREFIX".to_string()));
        }
        if self.persist_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("INVOICER_PERSIST_TIMEOUT_MS".to_string()));
        }
        Ok(())
    }

    /// Invoicing rules for the configured mode, with overrides applied.
    pub fn policy(&self) -> InvoicePolicy {
        let mut policy = InvoicePolicy::for_mode(self.mode)
            .with_tax_rate(TaxRate::from_bps(self.tax_rate_bps))
            .with_walk_in_customer_name(self.walk_in_customer_name.clone());

        if let Some(days) = self.payment_terms_days {
            policy = policy.with_payment_terms_days(days);
        }
        if let Some(prefix) = &self.number_prefix {
            policy = policy.with_number_prefix(prefix.clone());
        }
        policy
    }

    /// Database pool settings.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
