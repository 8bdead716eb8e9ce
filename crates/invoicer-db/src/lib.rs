//! # invoicer-db: Database Layer for Invoicer
//!
//! This crate provides tenant-scoped persistence for the invoicing backend.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Data Flow                               │
//! │                                                                         │
//! │  InvoiceService::create_invoice                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   invoicer-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  TenantStore  │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (store.rs)   │───►│ company.rs    │    │  (embedded)  │  │   │
//! │  │   │               │    │ customer.rs   │    │              │  │   │
//! │  │   │ InvoiceWriter │    │ product.rs    │    │ 001_init.sql │  │   │
//! │  │   │ (1 tx/write)  │    │ invoice.rs    │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │   MemoryStore      │                               │   │
//! │  │           │   (memory.rs)      │   Database / DbConfig         │   │
//! │  │           │                    ▼   (pool.rs)                   │   │
//! │  └───────────┼────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Tenant-scoped repositories
//! - [`store`] - The `TenantStore` / `InvoiceWriter` seam and its SQLite impl
//! - [`memory`] - In-memory `TenantStore` for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use invoicer_db::{Database, DbConfig, TenantStore};
//!
//! let db = Database::new(DbConfig::new("./invoicer.db")).await?;
//! let product = db.find_product(&tenant_id, &product_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use pool::{Database, DbConfig};
pub use store::{InvoiceWriter, SqliteInvoiceWriter, TenantStore};

// Repository re-exports for convenience
pub use repository::company::CompanyRepository;
pub use repository::customer::CustomerRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::product::ProductRepository;
