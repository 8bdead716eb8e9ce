//! # invoicer-core: Pure Business Logic for Invoicer
//!
//! Everything in this crate is deterministic and free of I/O: money
//! arithmetic, the invoice draft and its totals, the invoicing policy and
//! input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               invoicer-service (orchestration)                  │   │
//! │  │    CreateInvoice ──► Assembler ──► Persister ──► AppError       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ invoicer-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  invoice  │  │ validation│  │   │
//! │  │   │ Customer  │  │   Money   │  │   Draft   │  │   rules   │  │   │
//! │  │   │  Invoice  │  │  TaxRate  │  │  Totals   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 invoicer-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, tenant-scoped store          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Company, Customer, Product, Invoice, ...)
//! - [`requests`] - Inbound DTOs (create/update payloads)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`invoice`] - Invoice draft, line snapshots and totals
//! - [`policy`] - Invoicing mode and its derived rules
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use invoicer_core::money::Money;
//! use invoicer_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(24_999); // 249.99
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(1000)); // 10%
//!
//! // 24.999 rounds half away from zero to 25.00
//! assert_eq!(tax.cents(), 2_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod policy;
pub mod requests;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{DraftLine, InvoiceDraft, InvoiceTotals};
pub use money::Money;
pub use policy::{InvoicePolicy, InvoicingMode};
pub use requests::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate applied to invoice subtotals: 10% (1000 basis points).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;

/// Name of the sentinel customer used by point-of-sale invoicing when the
/// request carries no customer reference.
pub const DEFAULT_WALK_IN_CUSTOMER_NAME: &str = "Walk-in Customer";

/// Maximum number of lines on a single invoice.
pub const MAX_INVOICE_LINES: usize = 100;

/// Maximum quantity on a single invoice line.
///
/// Keeps `quantity × unit_price` far away from `i64` overflow for any
/// realistic price.
pub const MAX_LINE_QUANTITY: i64 = 99_999;
