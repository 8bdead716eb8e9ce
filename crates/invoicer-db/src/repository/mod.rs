//! # Repository Module
//!
//! Tenant-scoped repository implementations for Invoicer.
//!
//! ## Tenant Scoping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Every query carries the tenant                       │
//! │                                                                         │
//! │  db.products().get_by_id(tenant_id, product_id)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... FROM products WHERE tenant_id = ?1 AND id = ?2             │
//! │       │                                                                 │
//! │       ├── row found            → Some(product)                         │
//! │       ├── no such id           → None                                  │
//! │       └── id of another tenant → None   (indistinguishable)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CompanyRepository`](company::CompanyRepository) - Tenant registration and lookup
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer CRUD, walk-in lookup
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoice reads, sales report

pub mod company;
pub mod customer;
pub mod invoice;
pub mod product;

/// Trims an optional text column; blank values are stored as NULL.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
