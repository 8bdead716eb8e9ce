//! # invoicer-service: Invoice Workflow
//!
//! Creates invoices for a tenant from product references and quantities,
//! and manages the companies, customers and products they are built from.
//!
//! ## Create Invoice Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CreateInvoiceRequest { customer_id?, invoice_number?, due_date?,      │
//! │                         items: [{ product_id, quantity }] }            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────┐   reads    ┌──────────────────────────────────┐   │
//! │  │ InvoiceAssembler│──────────►│                                  │   │
//! │  │ (assembler.rs)  │            │   TenantStore  (invoicer-db)     │   │
//! │  └────────┬────────┘            │   ├── Database     (SQLite)      │   │
//! │           │ InvoiceDraft        │   └── MemoryStore  (tests)       │   │
//! │           ▼                     │                                  │   │
//! │  ┌─────────────────┐   one tx   │                                  │   │
//! │  │ InvoicePersister│──────────►│                                  │   │
//! │  │ (persister.rs)  │            └──────────────────────────────────┘   │
//! │  └────────┬────────┘                                                    │
//! │           ▼                                                             │
//! │  Invoice { number, totals, items }   or   AppError { code, message }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`assembler`] - Validation, lookups and totals
//! - [`persister`] - Atomic invoice write with numbering
//! - [`invoice_service`] - Invoice operations returning [`AppError`]
//! - [`report`] - Sales over time
//! - [`catalog`] - Companies, customers and products
//! - [`config`] - Environment configuration
//! - [`error`] - Service errors and the API error envelope
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//! ```rust,ignore
//! use invoicer_service::{AppConfig, Services};
//!
//! let config = AppConfig::from_env()?;
//! let services = Services::connect(&config).await?;
//! let invoice = services.invoices.create_invoice(&tenant_id, &request).await?;
//! ```

pub mod app;
pub mod assembler;
pub mod catalog;
pub mod config;
pub mod error;
pub mod invoice_service;
pub mod persister;
pub mod report;
pub mod telemetry;

pub use app::Services;
pub use assembler::InvoiceAssembler;
pub use catalog::CatalogService;
pub use config::{AppConfig, ConfigError};
pub use error::{AppError, ErrorCode, ServiceError, ServiceResult};
pub use invoice_service::InvoiceService;
pub use persister::{InvoicePersister, DEFAULT_PERSIST_TIMEOUT};
pub use report::ReportService;
pub use telemetry::init_tracing;
