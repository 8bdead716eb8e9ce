//! # Request Payloads
//!
//! Inbound DTOs accepted by the service layer. Unknown fields are ignored
//! during deserialization, so a client-supplied `unit_price` on an invoice
//! line never reaches the domain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Invoices
// =============================================================================

/// Payload for creating an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateInvoiceRequest {
    /// Required in standard mode; optional in point-of-sale mode.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Client-assigned number. Allocated by the server when absent.
    #[serde(default)]
    pub invoice_number: Option<String>,
    /// Defaults to the issue date plus the configured payment terms.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<InvoiceLineRequest>,
}

/// One requested line: a product reference and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl InvoiceLineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        InvoiceLineRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Companies
// =============================================================================

/// Payload for registering a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub tax_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// =============================================================================
// Customers
// =============================================================================

/// Payload for creating a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub tax_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Partial customer update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tax_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.tax_code.is_none()
            && self.address.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }
}

// =============================================================================
// Products
// =============================================================================

/// Payload for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial product update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.unit_price_cents.is_none()
            && self.image_url.is_none()
    }
}
