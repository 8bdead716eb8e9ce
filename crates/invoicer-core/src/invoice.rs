//! # Invoice Draft
//!
//! The in-memory invoice aggregate produced by assembly and consumed by
//! persistence. A draft has no ids and no number yet; everything else about
//! the invoice is already decided.
//!
//! ## Lifecycle
//! ```text
//! ┌──────────────┐  from_product   ┌──────────────┐  InvoiceDraft::new  ┌──────────────┐
//! │   Product    │ ──────────────► │  DraftLine   │ ──────────────────► │ InvoiceDraft │
//! │ (live price) │    snapshot     │ (frozen)     │   + totals          │  (no ids)    │
//! └──────────────┘                 └──────────────┘                     └──────┬───────┘
//!                                                                              │
//!                                                          into_invoice(id,    │
//!                                                          number, now)        ▼
//!                                                                       ┌──────────────┐
//!                                                                       │   Invoice    │
//!                                                                       └──────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::policy::InvoicePolicy;
use crate::types::{Customer, Invoice, InvoiceItem, InvoiceStatus, Product, TaxRate};

// =============================================================================
// Draft Line
// =============================================================================

/// One invoice line with the product's name and price frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total: Money,
}

impl DraftLine {
    /// Snapshots a product at the given quantity.
    ///
    /// Fails with [`CoreError::AmountOverflow`] if `quantity × price` does
    /// not fit in `i64` cents.
    pub fn from_product(product: &Product, quantity: i64) -> CoreResult<Self> {
        let unit_price = product.unit_price();
        let total = unit_price
            .checked_mul_quantity(quantity)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: format!("line total for product {}", product.id),
            })?;

        Ok(DraftLine {
            product_id: product.id.clone(),
            description: product.name.clone(),
            quantity,
            unit_price,
            total,
        })
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Subtotal, tax and total of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl InvoiceTotals {
    /// Computes totals: exact subtotal, tax rounded once, exact total.
    ///
    /// ```rust
    /// use invoicer_core::invoice::InvoiceTotals;
    /// use invoicer_core::types::TaxRate;
    ///
    /// let totals = InvoiceTotals::compute(&[], TaxRate::default()).unwrap();
    /// assert_eq!(totals.total.cents(), 0);
    /// ```
    pub fn compute(lines: &[DraftLine], rate: TaxRate) -> CoreResult<Self> {
        let subtotal = lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.total)
                .ok_or_else(|| CoreError::AmountOverflow {
                    context: "invoice subtotal".to_string(),
                })
        })?;
        let tax = subtotal.calculate_tax(rate);
        let total = subtotal
            .checked_add(tax)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: "invoice total".to_string(),
            })?;

        Ok(InvoiceTotals { subtotal, tax, total })
    }
}

// =============================================================================
// Invoice Draft
// =============================================================================

/// A fully assembled, not yet persisted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub tenant_id: String,
    pub customer_id: String,
    pub customer_name: String,
    /// Client-assigned number, if any.
    pub invoice_number: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub tax_rate: TaxRate,
    pub lines: Vec<DraftLine>,
    pub totals: InvoiceTotals,
}

impl InvoiceDraft {
    /// Builds a draft for `customer`, deriving status, due date and tax rate
    /// from the policy.
    pub fn new(
        tenant_id: impl Into<String>,
        customer: &Customer,
        lines: Vec<DraftLine>,
        policy: &InvoicePolicy,
        issue_date: NaiveDate,
    ) -> CoreResult<Self> {
        let totals = InvoiceTotals::compute(&lines, policy.tax_rate)?;

        Ok(InvoiceDraft {
            tenant_id: tenant_id.into(),
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            invoice_number: None,
            issue_date,
            due_date: policy.due_date_for(issue_date),
            status: policy.initial_status(),
            tax_rate: policy.tax_rate,
            lines,
            totals,
        })
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    /// Finalizes the draft with server-assigned identity.
    ///
    /// Items get fresh UUIDs and 1-based `line_no` in draft order.
    pub fn into_invoice(
        self,
        id: impl Into<String>,
        invoice_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Invoice {
        let id = id.into();
        let items = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(idx, line)| InvoiceItem {
                id: Uuid::new_v4().to_string(),
                invoice_id: id.clone(),
                line_no: idx as i64 + 1,
                product_id: line.product_id,
                description: line.description,
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                total_price_cents: line.total.cents(),
            })
            .collect();

        Invoice {
            id,
            tenant_id: self.tenant_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            invoice_number: invoice_number.into(),
            issue_date: self.issue_date,
            due_date: self.due_date,
            subtotal_cents: self.totals.subtotal.cents(),
            tax_cents: self.totals.tax.cents(),
            total_cents: self.totals.total.cents(),
            status: self.status,
            created_at: now,
            updated_at: now,
            items,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            tenant_id: "t-1".to_string(),
            name: name.to_string(),
            description: None,
            unit_price_cents: price,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn customer() -> Customer {
        let now = Utc::now();
        Customer {
            id: "c-1".to_string(),
            tenant_id: "t-1".to_string(),
            name: "Acme Ltd".to_string(),
            tax_code: None,
            address: None,
            email: None,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_line_snapshots_product() {
        let line = DraftLine::from_product(&product("p-1", "Keyboard", 4_999), 3).unwrap();
        assert_eq!(line.description, "Keyboard");
        assert_eq!(line.unit_price.cents(), 4_999);
        assert_eq!(line.total.cents(), 14_997);
    }

    #[test]
    fn test_line_overflow() {
        let result = DraftLine::from_product(&product("p-1", "Yacht", i64::MAX / 2), 3);
        assert!(matches!(result, Err(CoreError::AmountOverflow { .. })));
    }

    #[test]
    fn test_reference_totals() {
        // P1 = 100.00 × 2, P2 = 49.99 × 1
        let lines = vec![
            DraftLine::from_product(&product("p-1", "P1", 10_000), 2).unwrap(),
            DraftLine::from_product(&product("p-2", "P2", 4_999), 1).unwrap(),
        ];
        let totals = InvoiceTotals::compute(&lines, TaxRate::from_bps(1000)).unwrap();

        assert_eq!(totals.subtotal.cents(), 24_999);
        assert_eq!(totals.tax.cents(), 2_500);
        assert_eq!(totals.total.cents(), 27_499);
    }

    #[test]
    fn test_draft_uses_policy() {
        let lines = vec![DraftLine::from_product(&product("p-1", "P1", 1_000), 1).unwrap()];
        let draft = InvoiceDraft::new(
            "t-1",
            &customer(),
            lines,
            &InvoicePolicy::point_of_sale(),
            issue_date(),
        )
        .unwrap();

        assert_eq!(draft.status, InvoiceStatus::Paid);
        assert_eq!(draft.due_date, issue_date());
        assert_eq!(draft.customer_name, "Acme Ltd");
        assert_eq!(draft.totals.tax.cents(), 100);
        assert!(draft.invoice_number.is_none());
    }

    #[test]
    fn test_into_invoice_preserves_line_order() {
        let lines = vec![
            DraftLine::from_product(&product("p-b", "B", 200), 1).unwrap(),
            DraftLine::from_product(&product("p-a", "A", 100), 5).unwrap(),
        ];
        let draft = InvoiceDraft::new(
            "t-1",
            &customer(),
            lines,
            &InvoicePolicy::standard(),
            issue_date(),
        )
        .unwrap()
        .with_invoice_number("CUSTOM-1");

        let now = Utc::now();
        let invoice = draft.into_invoice("inv-1", "CUSTOM-1", now);

        assert_eq!(invoice.invoice_number, "CUSTOM-1");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.subtotal_cents, 700);
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.items[0].product_id, "p-b");
        assert_eq!(invoice.items[0].line_no, 1);
        assert_eq!(invoice.items[1].line_no, 2);
        assert!(invoice.items.iter().all(|i| i.invoice_id == "inv-1"));
        assert_ne!(invoice.items[0].id, invoice.items[1].id);
        assert_eq!(invoice.created_at, now);
    }
}
