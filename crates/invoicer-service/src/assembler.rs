//! # Invoice Assembler
//!
//! Turns a [`CreateInvoiceRequest`] into an [`InvoiceDraft`]: priced lines,
//! a resolved customer and computed totals. Nothing is written here except,
//! in point-of-sale mode, the walk-in customer.
//!
//! ## Steps
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ 1. validate  │──►│ 2. products    │──►│ 3. customer      │──►│ 4. draft     │
//! │ (no store    │   │ in line order, │   │ by id, or        │   │ totals, due  │
//! │  access)     │   │ tenant scoped  │   │ walk-in (POS)    │   │ date, status │
//! └──────────────┘   └────────────────┘   └──────────────────┘   └──────────────┘
//!        │                   │                     │
//!        ▼                   ▼                     ▼
//!  VALIDATION_ERROR   PRODUCT_NOT_FOUND    CUSTOMER_NOT_FOUND
//! ```
//!
//! Products are resolved before the customer, so a request naming an
//! unknown product never creates a walk-in customer.
//!
//! Prices always come from the stored product. Quantities are taken from
//! the request as they are; duplicate product ids stay separate lines.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use invoicer_core::validation::validate_create_invoice_request;
use invoicer_core::{CreateInvoiceRequest, Customer, DraftLine, InvoiceDraft, InvoicePolicy};
use invoicer_db::TenantStore;

use crate::error::{ServiceError, ServiceResult};

/// Builds invoice drafts against a tenant store.
pub struct InvoiceAssembler<S: TenantStore + ?Sized> {
    store: Arc<S>,
    policy: InvoicePolicy,
}

impl<S: TenantStore + ?Sized> InvoiceAssembler<S> {
    pub fn new(store: Arc<S>, policy: InvoicePolicy) -> Self {
        InvoiceAssembler { store, policy }
    }

    pub fn policy(&self) -> &InvoicePolicy {
        &self.policy
    }

    /// Assembles a draft issued today (UTC).
    pub async fn assemble(
        &self,
        tenant_id: &str,
        request: &CreateInvoiceRequest,
    ) -> ServiceResult<InvoiceDraft> {
        self.assemble_on(tenant_id, request, Utc::now().date_naive())
            .await
    }

    /// Assembles a draft with an explicit issue date.
    pub async fn assemble_on(
        &self,
        tenant_id: &str,
        request: &CreateInvoiceRequest,
        issue_date: NaiveDate,
    ) -> ServiceResult<InvoiceDraft> {
        validate_create_invoice_request(request, issue_date, self.policy.requires_customer())
            .map_err(ServiceError::Validation)?;

        let mut lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product_id = line.product_id.trim();
            let product = self
                .store
                .find_product(tenant_id, product_id)
                .await?
                .ok_or_else(|| ServiceError::ProductNotFound(product_id.to_string()))?;
            lines.push(DraftLine::from_product(&product, line.quantity)?);
        }

        let customer = self
            .resolve_customer(tenant_id, request.customer_id.as_deref())
            .await?;

        let mut draft = InvoiceDraft::new(tenant_id, &customer, lines, &self.policy, issue_date)?;
        if let Some(due_date) = request.due_date {
            draft = draft.with_due_date(due_date);
        }
        if let Some(number) = request.invoice_number.as_deref() {
            draft = draft.with_invoice_number(number);
        }

        debug!(
            tenant_id = %tenant_id,
            customer_id = %draft.customer_id,
            lines = draft.lines.len(),
            total = %draft.totals.total,
            "Invoice assembled"
        );

        Ok(draft)
    }

    /// Finds the invoiced customer.
    ///
    /// A blank id counts as absent. Without an id (point-of-sale only, the
    /// validator rejects it otherwise) the oldest customer carrying the
    /// walk-in name is reused, or created on first use.
    async fn resolve_customer(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
    ) -> ServiceResult<Customer> {
        let customer_id = customer_id.map(str::trim).filter(|id| !id.is_empty());

        if let Some(id) = customer_id {
            return self
                .store
                .find_customer(tenant_id, id)
                .await?
                .ok_or_else(|| ServiceError::CustomerNotFound(id.to_string()));
        }

        let name = &self.policy.walk_in_customer_name;
        if let Some(existing) = self.store.find_customer_by_name(tenant_id, name).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let walk_in = Customer {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.clone(),
            tax_code: None,
            address: None,
            email: None,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.store.create_customer(&walk_in).await?;
        debug!(tenant_id = %tenant_id, customer_id = %created.id, "Walk-in customer created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoicer_core::{InvoiceLineRequest, InvoiceStatus, ValidationError};
    use invoicer_db::MemoryStore;

    const TENANT: &str = "tenant-a";

    fn issue() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn request(customer_id: Option<&str>, items: Vec<InvoiceLineRequest>) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            customer_id: customer_id.map(str::to_string),
            items,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_assembles_lines_in_request_order() {
        let store = Arc::new(MemoryStore::new());
        let a = store.add_product(TENANT, "Widget", 10_000).await;
        let b = store.add_product(TENANT, "Gadget", 4_999).await;
        let customer = store.add_customer(TENANT, "Acme").await;

        let assembler = InvoiceAssembler::new(Arc::clone(&store), InvoicePolicy::standard());
        let draft = assembler
            .assemble_on(
                TENANT,
                &request(
                    Some(&customer.id),
                    vec![
                        InvoiceLineRequest::new(&a.id, 2),
                        InvoiceLineRequest::new(&b.id, 1),
                        InvoiceLineRequest::new(&a.id, 1),
                    ],
                ),
                issue(),
            )
            .await
            .unwrap();

        let names: Vec<&str> = draft.lines.iter().map(|l| l.description.as_str()).collect();
        assert_eq!(names, vec!["Widget", "Gadget", "Widget"]);
        assert_eq!(draft.totals.subtotal.cents(), 34_999);
        assert_eq!(draft.customer_name, "Acme");
        assert_eq!(draft.status, InvoiceStatus::Draft);
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
        assert_eq!(draft.invoice_number, None);
    }

    #[tokio::test]
    async fn test_validation_runs_before_store_access() {
        let store = Arc::new(MemoryStore::new());
        let assembler = InvoiceAssembler::new(Arc::clone(&store), InvoicePolicy::standard());

        let err = assembler
            .assemble_on(
                TENANT,
                &request(None, vec![InvoiceLineRequest::new("p", 0)]),
                issue(),
            )
            .await
            .unwrap_err();

        match err {
            ServiceError::Validation(errors) => {
                let fields: Vec<&str> = errors.iter().map(ValidationError::field).collect();
                assert!(fields.contains(&"items[0].quantity"));
                assert!(fields.contains(&"customer_id"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_request_overrides() {
        let store = Arc::new(MemoryStore::new());
        let p = store.add_product(TENANT, "Widget", 1_000).await;
        let c = store.add_customer(TENANT, "Acme").await;
        let assembler = InvoiceAssembler::new(Arc::clone(&store), InvoicePolicy::standard());

        let due = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let mut req = request(Some(&c.id), vec![InvoiceLineRequest::new(&p.id, 1)]);
        req.due_date = Some(due);
        req.invoice_number = Some("Q-2024/7".to_string());

        let draft = assembler.assemble_on(TENANT, &req, issue()).await.unwrap();
        assert_eq!(draft.due_date, due);
        assert_eq!(draft.invoice_number.as_deref(), Some("Q-2024/7"));
    }

    #[tokio::test]
    async fn test_unknown_product_skips_customer_resolution() {
        let store = Arc::new(MemoryStore::new());
        let assembler = InvoiceAssembler::new(Arc::clone(&store), InvoicePolicy::point_of_sale());

        let err = assembler
            .assemble_on(
                TENANT,
                &request(None, vec![InvoiceLineRequest::new("missing", 1)]),
                issue(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ProductNotFound(ref id) if id == "missing"));
        assert_eq!(store.customer_count(TENANT).await, 0);
    }

    #[tokio::test]
    async fn test_walk_in_customer_reused() {
        let store = Arc::new(MemoryStore::new());
        let p = store.add_product(TENANT, "Coffee", 350).await;
        let assembler = InvoiceAssembler::new(Arc::clone(&store), InvoicePolicy::point_of_sale());
        let req = request(Some("  "), vec![InvoiceLineRequest::new(&p.id, 1)]);

        let first = assembler.assemble_on(TENANT, &req, issue()).await.unwrap();
        let second = assembler.assemble_on(TENANT, &req, issue()).await.unwrap();

        assert_eq!(first.customer_id, second.customer_id);
        assert_eq!(first.customer_name, "Walk-in Customer");
        assert_eq!(first.status, InvoiceStatus::Paid);
        assert_eq!(first.due_date, issue());
        assert_eq!(store.customer_count(TENANT).await, 1);
    }

    #[tokio::test]
    async fn test_cross_tenant_references_not_found() {
        let store = Arc::new(MemoryStore::new());
        let foreign_product = store.add_product("tenant-b", "Widget", 1_000).await;
        let foreign_customer = store.add_customer("tenant-b", "Acme").await;
        let own_product = store.add_product(TENANT, "Widget", 1_000).await;
        let assembler = InvoiceAssembler::new(Arc::clone(&store), InvoicePolicy::standard());

        let err = assembler
            .assemble_on(
                TENANT,
                &request(
                    Some(&foreign_customer.id),
                    vec![InvoiceLineRequest::new(&foreign_product.id, 1)],
                ),
                issue(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ProductNotFound(_)));

        let err = assembler
            .assemble_on(
                TENANT,
                &request(
                    Some(&foreign_customer.id),
                    vec![InvoiceLineRequest::new(&own_product.id, 1)],
                ),
                issue(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CustomerNotFound(_)));
    }
}
