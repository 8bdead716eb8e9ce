//! # Invoice Persister
//!
//! Writes an assembled [`InvoiceDraft`] as one atomic unit.
//!
//! ## Write Sequence
//! ```text
//! begin_invoice()
//!   │
//!   ├── next_invoice_sequence()      only when the client sent no number,
//!   │                                repeated while a client already took it
//!   ├── insert_invoice(header)
//!   ├── insert_item(line 1..n)       in line order
//!   └── commit()
//!
//! Any error, or the timeout firing, drops the writer before commit:
//! no header, no items and no sequence value become visible.
//! ```
//!
//! The returned invoice is the one built in memory, not a re-read. The
//! writer may hold the only connection of the pool.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use invoicer_core::{Invoice, InvoiceDraft, InvoicePolicy};
use invoicer_db::{DbError, InvoiceWriter, TenantStore};

use crate::error::{ServiceError, ServiceResult};

/// Default upper bound on one invoice write.
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on sequence values skipped in one write because clients
/// already assigned the generated number.
const MAX_NUMBER_SKIPS: usize = 1_000;

/// Persists invoice drafts.
pub struct InvoicePersister<S: TenantStore + ?Sized> {
    store: Arc<S>,
    policy: InvoicePolicy,
    timeout: Duration,
}

impl<S: TenantStore + ?Sized> InvoicePersister<S> {
    pub fn new(store: Arc<S>, policy: InvoicePolicy) -> Self {
        InvoicePersister {
            store,
            policy,
            timeout: DEFAULT_PERSIST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stores the draft and returns the stored invoice with its items.
    ///
    /// ## Errors
    /// - `DuplicateInvoiceNumber` if the client-assigned number is taken
    /// - `Persistence` for store failures and timeouts
    pub async fn persist(&self, draft: InvoiceDraft) -> ServiceResult<Invoice> {
        let tenant_id = draft.tenant_id.clone();

        match tokio::time::timeout(self.timeout, self.write(draft)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    tenant_id = %tenant_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Invoice write timed out, rolled back"
                );
                Err(ServiceError::Persistence(DbError::TransactionFailed(
                    "invoice write timed out".to_string(),
                )))
            }
        }
    }

    async fn write(&self, draft: InvoiceDraft) -> ServiceResult<Invoice> {
        let mut writer = self.store.begin_invoice().await?;

        let client_number = draft.invoice_number.clone();
        let invoice_number = match &client_number {
            Some(number) => number.clone(),
            None => self.next_free_number(&mut writer, &draft.tenant_id).await?,
        };

        let invoice = draft.into_invoice(Uuid::new_v4().to_string(), invoice_number, Utc::now());

        writer
            .insert_invoice(&invoice)
            .await
            .map_err(|e| number_clash(e, client_number.is_some()))?;

        for item in &invoice.items {
            writer.insert_item(item).await?;
        }

        writer
            .commit()
            .await
            .map_err(|e| number_clash(e, client_number.is_some()))?;

        info!(
            tenant_id = %invoice.tenant_id,
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            items = invoice.items.len(),
            total = %invoice.total(),
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Draws sequence values until the formatted number is unused. Skipped
    /// values are consumed together with the invoice on commit.
    async fn next_free_number(
        &self,
        writer: &mut Box<dyn InvoiceWriter>,
        tenant_id: &str,
    ) -> ServiceResult<String> {
        for _ in 0..MAX_NUMBER_SKIPS {
            let number = self
                .policy
                .format_number(writer.next_invoice_sequence(tenant_id).await?);
            if !writer.invoice_number_taken(tenant_id, &number).await? {
                return Ok(number);
            }
            debug!(
                tenant_id = %tenant_id,
                invoice_number = %number,
                "Generated number already assigned by a client, skipping"
            );
        }

        Err(ServiceError::Internal(format!(
            "no free invoice number after {} sequence values",
            MAX_NUMBER_SKIPS
        )))
    }
}

/// A taken client number is the caller's problem; a taken generated number
/// means the sequence and the table disagree.
fn number_clash(err: DbError, client_assigned: bool) -> ServiceError {
    match err {
        DbError::UniqueViolation { columns, value }
            if columns.iter().any(|c| c == "invoice_number") =>
        {
            let number = value.unwrap_or_default();
            if client_assigned {
                ServiceError::DuplicateInvoiceNumber(number)
            } else {
                ServiceError::Internal(format!("generated invoice number {} already in use", number))
            }
        }
        other => ServiceError::Persistence(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use invoicer_core::{Customer, DraftLine, InvoiceStatus};
    use invoicer_db::MemoryStore;

    const TENANT: &str = "tenant-a";

    async fn draft(store: &MemoryStore, policy: &InvoicePolicy, qty: &[i64]) -> InvoiceDraft {
        let customer: Customer = store.add_customer(TENANT, "Acme").await;
        let product = store.add_product(TENANT, "Widget", 1_000).await;
        let lines = qty
            .iter()
            .map(|q| DraftLine::from_product(&product, *q).unwrap())
            .collect();
        let issue = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        InvoiceDraft::new(TENANT, &customer, lines, policy, issue).unwrap()
    }

    #[tokio::test]
    async fn test_persist_numbers_and_stores() {
        let store = Arc::new(MemoryStore::new());
        let policy = InvoicePolicy::standard();
        let persister = InvoicePersister::new(Arc::clone(&store), policy.clone());

        let first = persister.persist(draft(&store, &policy, &[1, 2]).await).await.unwrap();
        let second = persister.persist(draft(&store, &policy, &[3]).await).await.unwrap();

        assert_eq!(first.invoice_number, "INV-000001");
        assert_eq!(second.invoice_number, "INV-000002");
        assert_eq!(first.status, InvoiceStatus::Draft);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[1].line_no, 2);
        assert_eq!(first.total_cents, 3_300);

        let stored = store.find_invoice(TENANT, &first.id).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(store.item_count().await, 3);
    }

    #[tokio::test]
    async fn test_item_failure_rolls_back() {
        let store = Arc::new(MemoryStore::new());
        let policy = InvoicePolicy::standard();
        let persister = InvoicePersister::new(Arc::clone(&store), policy.clone());

        store.fail_item_insert_at(3).await;
        let err = persister
            .persist(draft(&store, &policy, &[1, 1, 1]).await)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Persistence(DbError::TransactionFailed(_))));
        assert_eq!(store.invoice_count().await, 0);
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn test_client_number_clash() {
        let store = Arc::new(MemoryStore::new());
        let policy = InvoicePolicy::standard();
        let persister = InvoicePersister::new(Arc::clone(&store), policy.clone());

        let numbered = draft(&store, &policy, &[1]).await.with_invoice_number("INV-000001");
        persister.persist(numbered.clone()).await.unwrap();

        let err = persister.persist(numbered).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateInvoiceNumber(ref n) if n == "INV-000001"));

        // The generator skips the number the client took
        let generated = persister.persist(draft(&store, &policy, &[1]).await).await.unwrap();
        assert_eq!(generated.invoice_number, "INV-000002");
        assert_eq!(store.invoice_count().await, 2);
    }

    #[tokio::test]
    async fn test_generator_skips_run_of_client_numbers() {
        let store = Arc::new(MemoryStore::new());
        let policy = InvoicePolicy::standard();
        let persister = InvoicePersister::new(Arc::clone(&store), policy.clone());

        for n in ["INV-000001", "INV-000002", "INV-000004"] {
            let numbered = draft(&store, &policy, &[1]).await.with_invoice_number(n);
            persister.persist(numbered).await.unwrap();
        }

        let first = persister.persist(draft(&store, &policy, &[1]).await).await.unwrap();
        let second = persister.persist(draft(&store, &policy, &[1]).await).await.unwrap();
        assert_eq!(first.invoice_number, "INV-000003");
        assert_eq!(second.invoice_number, "INV-000005");
    }

    #[tokio::test]
    async fn test_commit_time_clash_is_duplicate_number() {
        let store = Arc::new(MemoryStore::new());
        let policy = InvoicePolicy::standard();
        let persister = InvoicePersister::new(Arc::clone(&store), policy.clone());

        // Stage a header, then let another write take the number first
        let staged = draft(&store, &policy, &[1])
            .await
            .into_invoice("inv-staged".to_string(), "Q-1".to_string(), Utc::now());
        let mut writer = store.begin_invoice().await.unwrap();
        writer.insert_invoice(&staged).await.unwrap();

        let numbered = draft(&store, &policy, &[1]).await.with_invoice_number("Q-1");
        persister.persist(numbered).await.unwrap();

        let err = writer
            .commit()
            .await
            .map_err(|e| number_clash(e, true))
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateInvoiceNumber(ref n) if n == "Q-1"));
        assert_eq!(store.invoice_count().await, 1);
    }

    #[test]
    fn test_number_clash_passes_other_errors_through() {
        let err = number_clash(DbError::PoolExhausted, true);
        assert!(matches!(err, ServiceError::Persistence(DbError::PoolExhausted)));
    }
}
