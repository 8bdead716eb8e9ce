//! # Invoicing Policy
//!
//! Two invoicing styles share one workflow. The mode is chosen once, by
//! configuration, and everything that differs between the styles is derived
//! from it here.
//!
//! ```text
//! ┌──────────────────────┬───────────────────────┬───────────────────────────┐
//! │                      │ Standard (quote)      │ PointOfSale               │
//! ├──────────────────────┼───────────────────────┼───────────────────────────┤
//! │ customer_id          │ required              │ optional → walk-in        │
//! │ initial status       │ draft                 │ paid                      │
//! │ number prefix        │ INV                   │ POS                       │
//! │ payment terms (days) │ 30                    │ 0                         │
//! └──────────────────────┴───────────────────────┴───────────────────────────┘
//! ```

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::{InvoiceStatus, TaxRate};
use crate::DEFAULT_WALK_IN_CUSTOMER_NAME;

// =============================================================================
// Invoicing Mode
// =============================================================================

/// Which invoicing style this deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoicingMode {
    /// Quote-style invoices against a known customer.
    #[default]
    Standard,
    /// Counter sales, paid immediately, customer optional.
    #[serde(rename = "pos")]
    PointOfSale,
}

impl InvoicingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoicingMode::Standard => "standard",
            InvoicingMode::PointOfSale => "pos",
        }
    }
}

impl fmt::Display for InvoicingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoicingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(InvoicingMode::Standard),
            "pos" | "point_of_sale" => Ok(InvoicingMode::PointOfSale),
            other => Err(ValidationError::InvalidFormat {
                field: "mode".to_string(),
                reason: format!("unknown invoicing mode '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Invoice Policy
// =============================================================================

/// Mode-dependent rules applied while assembling and persisting invoices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePolicy {
    pub mode: InvoicingMode,
    pub tax_rate: TaxRate,
    /// Customer name used for point-of-sale invoices without a customer.
    pub walk_in_customer_name: String,
    pub payment_terms_days: u32,
    pub number_prefix: String,
}

impl InvoicePolicy {
    /// Policy with the defaults for the given mode.
    pub fn for_mode(mode: InvoicingMode) -> Self {
        let (payment_terms_days, number_prefix) = match mode {
            InvoicingMode::Standard => (30, "INV"),
            InvoicingMode::PointOfSale => (0, "POS"),
        };
        InvoicePolicy {
            mode,
            tax_rate: TaxRate::default(),
            walk_in_customer_name: DEFAULT_WALK_IN_CUSTOMER_NAME.to_string(),
            payment_terms_days,
            number_prefix: number_prefix.to_string(),
        }
    }

    pub fn standard() -> Self {
        Self::for_mode(InvoicingMode::Standard)
    }

    pub fn point_of_sale() -> Self {
        Self::for_mode(InvoicingMode::PointOfSale)
    }

    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn with_walk_in_customer_name(mut self, name: impl Into<String>) -> Self {
        self.walk_in_customer_name = name.into();
        self
    }

    pub fn with_payment_terms_days(mut self, days: u32) -> Self {
        self.payment_terms_days = days;
        self
    }

    pub fn with_number_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.number_prefix = prefix.into();
        self
    }

    /// Whether a request must name its customer.
    pub fn requires_customer(&self) -> bool {
        self.mode == InvoicingMode::Standard
    }

    /// Status a freshly created invoice starts in.
    pub fn initial_status(&self) -> InvoiceStatus {
        match self.mode {
            InvoicingMode::Standard => InvoiceStatus::Draft,
            InvoicingMode::PointOfSale => InvoiceStatus::Paid,
        }
    }

    /// Formats a tenant sequence value as an invoice number.
    ///
    /// ```rust
    /// use invoicer_core::policy::InvoicePolicy;
    ///
    /// assert_eq!(InvoicePolicy::standard().format_number(42), "INV-000042");
    /// assert_eq!(InvoicePolicy::point_of_sale().format_number(1), "POS-000001");
    /// ```
    pub fn format_number(&self, sequence: i64) -> String {
        format!("{}-{:06}", self.number_prefix, sequence)
    }

    /// Due date implied by the payment terms.
    pub fn due_date_for(&self, issue_date: NaiveDate) -> NaiveDate {
        issue_date
            .checked_add_days(Days::new(u64::from(self.payment_terms_days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl Default for InvoicePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("standard".parse::<InvoicingMode>().unwrap(), InvoicingMode::Standard);
        assert_eq!("POS".parse::<InvoicingMode>().unwrap(), InvoicingMode::PointOfSale);
        assert!("retail".parse::<InvoicingMode>().is_err());
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&InvoicingMode::PointOfSale).unwrap();
        assert_eq!(json, "\"pos\"");
    }

    #[test]
    fn test_standard_defaults() {
        let policy = InvoicePolicy::standard();
        assert!(policy.requires_customer());
        assert_eq!(policy.initial_status(), InvoiceStatus::Draft);
        assert_eq!(policy.tax_rate.bps(), 1000);
        assert_eq!(policy.due_date_for(date(2024, 1, 15)), date(2024, 2, 14));
    }

    #[test]
    fn test_point_of_sale_defaults() {
        let policy = InvoicePolicy::point_of_sale();
        assert!(!policy.requires_customer());
        assert_eq!(policy.initial_status(), InvoiceStatus::Paid);
        assert_eq!(policy.walk_in_customer_name, "Walk-in Customer");
        assert_eq!(policy.due_date_for(date(2024, 1, 15)), date(2024, 1, 15));
    }

    #[test]
    fn test_overrides() {
        let policy = InvoicePolicy::standard()
            .with_number_prefix("Q")
            .with_payment_terms_days(7)
            .with_tax_rate(TaxRate::from_bps(825));
        assert_eq!(policy.format_number(1_234_567), "Q-1234567");
        assert_eq!(policy.due_date_for(date(2024, 2, 25)), date(2024, 3, 3));
        assert_eq!(policy.tax_rate.bps(), 825);
    }
}
