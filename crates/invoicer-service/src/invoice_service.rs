//! # Invoice Service
//!
//! Entry point for invoice operations. Chains the assembler and the
//! persister and converts every failure into an [`AppError`].
//!
//! ```text
//! create_invoice(tenant, request)
//!   │
//!   ├── InvoiceAssembler::assemble   validate → products → customer → draft
//!   └── InvoicePersister::persist    one atomic write, bounded by a timeout
//!         │
//!         ▼
//!   Invoice (with items)  |  AppError { message, code, details }
//! ```

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use invoicer_core::validation::validate_reference;
use invoicer_core::{CreateInvoiceRequest, Invoice, InvoicePolicy, InvoiceSummary};
use invoicer_db::TenantStore;

use crate::assembler::InvoiceAssembler;
use crate::error::{AppError, ServiceError, ServiceResult};
use crate::persister::InvoicePersister;

/// Invoice creation and lookup for one store.
pub struct InvoiceService<S: TenantStore + ?Sized> {
    store: Arc<S>,
    assembler: InvoiceAssembler<S>,
    persister: InvoicePersister<S>,
}

impl<S: TenantStore + ?Sized> InvoiceService<S> {
    pub fn new(store: Arc<S>, policy: InvoicePolicy) -> Self {
        InvoiceService {
            assembler: InvoiceAssembler::new(Arc::clone(&store), policy.clone()),
            persister: InvoicePersister::new(Arc::clone(&store), policy),
            store,
        }
    }

    /// Bounds the duration of each invoice write.
    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persister = self.persister.with_timeout(timeout);
        self
    }

    pub fn policy(&self) -> &InvoicePolicy {
        self.assembler.policy()
    }

    /// Creates an invoice issued today.
    ///
    /// ## Errors
    /// ```text
    /// VALIDATION_ERROR (400)       bad request shape, nothing read or written
    /// PRODUCT_NOT_FOUND (400)      unknown product in this tenant
    /// CUSTOMER_NOT_FOUND (404)     unknown customer in this tenant
    /// CONFLICT (409)               client invoice number already used
    /// INTERNAL_SERVER_ERROR (500)  store failure or timeout, nothing written
    /// ```
    pub async fn create_invoice(
        &self,
        tenant_id: &str,
        request: &CreateInvoiceRequest,
    ) -> Result<Invoice, AppError> {
        self.create(tenant_id, request, None).await.map_err(AppError::from)
    }

    /// Creates an invoice with an explicit issue date.
    pub async fn create_invoice_on(
        &self,
        tenant_id: &str,
        request: &CreateInvoiceRequest,
        issue_date: NaiveDate,
    ) -> Result<Invoice, AppError> {
        self.create(tenant_id, request, Some(issue_date))
            .await
            .map_err(AppError::from)
    }

    async fn create(
        &self,
        tenant_id: &str,
        request: &CreateInvoiceRequest,
        issue_date: Option<NaiveDate>,
    ) -> ServiceResult<Invoice> {
        validate_reference("tenant_id", tenant_id)?;

        let draft = match issue_date {
            Some(date) => self.assembler.assemble_on(tenant_id, request, date).await?,
            None => self.assembler.assemble(tenant_id, request).await?,
        };
        self.persister.persist(draft).await
    }

    /// Fetches one invoice with its items.
    pub async fn get_invoice(&self, tenant_id: &str, invoice_id: &str) -> Result<Invoice, AppError> {
        self.find(tenant_id, invoice_id).await.map_err(AppError::from)
    }

    /// Lists the tenant's invoices, newest issue date first.
    pub async fn list_invoices(&self, tenant_id: &str) -> Result<Vec<InvoiceSummary>, AppError> {
        self.list(tenant_id).await.map_err(AppError::from)
    }

    async fn find(&self, tenant_id: &str, invoice_id: &str) -> ServiceResult<Invoice> {
        validate_reference("tenant_id", tenant_id)?;
        validate_reference("invoice_id", invoice_id)?;

        self.store
            .find_invoice(tenant_id, invoice_id)
            .await?
            .ok_or_else(|| ServiceError::InvoiceNotFound(invoice_id.to_string()))
    }

    async fn list(&self, tenant_id: &str) -> ServiceResult<Vec<InvoiceSummary>> {
        validate_reference("tenant_id", tenant_id)?;
        Ok(self.store.list_invoices(tenant_id).await?)
    }
}
