//! # In-Memory Store
//!
//! A [`TenantStore`] that keeps everything in process memory. Used by tests
//! of the invoice workflow; it honours the same tenant scoping and
//! all-or-nothing writes as the SQLite store.
//!
//! ## Fault Injection
//! ```text
//! store.fail_item_insert_at(2)
//!
//! begin_invoice()            ← picks up the armed fault (one-shot)
//!   insert_invoice(header)   ✓ staged
//!   insert_item(line 1)      ✓ staged
//!   insert_item(line 2)      ✗ DbError::TransactionFailed
//! (writer dropped)           → staged rows discarded, store unchanged
//! ```
//!
//! ## Differences From SQLite
//! Sequence values are handed out immediately and never returned, so a
//! rolled-back write leaves a gap in the numbering.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::store::{InvoiceWriter, TenantStore};
use invoicer_core::{Customer, Invoice, InvoiceItem, InvoiceSummary, Product, SalesDataPoint};

#[derive(Debug, Default)]
struct State {
    customers: Vec<Customer>,
    products: Vec<Product>,
    /// Committed invoices, items included, in insertion order.
    invoices: Vec<Invoice>,
    sequences: HashMap<String, i64>,
}

/// In-memory tenant store for tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    item_fault: Arc<Mutex<Option<usize>>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to a tenant's catalogue.
    pub async fn add_product(&self, tenant_id: &str, name: &str, unit_price_cents: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            description: None,
            unit_price_cents,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.products.push(product.clone());
        product
    }

    /// Adds a customer to a tenant.
    pub async fn add_customer(&self, tenant_id: &str, name: &str) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            tax_code: None,
            address: None,
            email: None,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.customers.push(customer.clone());
        customer
    }

    /// Makes the `n`-th (1-based) item insert of the next write fail.
    pub async fn fail_item_insert_at(&self, n: usize) {
        *self.item_fault.lock().await = Some(n);
    }

    /// Number of committed invoices across all tenants.
    pub async fn invoice_count(&self) -> usize {
        self.state.read().await.invoices.len()
    }

    /// Number of committed invoice items across all tenants.
    pub async fn item_count(&self) -> usize {
        self.state
            .read()
            .await
            .invoices
            .iter()
            .map(|i| i.items.len())
            .sum()
    }

    /// Number of customers stored for a tenant.
    pub async fn customer_count(&self, tenant_id: &str) -> usize {
        self.state
            .read()
            .await
            .customers
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .count()
    }

    /// Number of `TenantStore` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn find_product(&self, tenant_id: &str, product_id: &str) -> DbResult<Option<Product>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.id == product_id)
            .cloned())
    }

    async fn find_customer(
        &self,
        tenant_id: &str,
        customer_id: &str,
    ) -> DbResult<Option<Customer>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .customers
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.id == customer_id)
            .cloned())
    }

    async fn find_customer_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> DbResult<Option<Customer>> {
        self.record_call();
        let state = self.state.read().await;
        // Insertion order is creation order, so the first match is the oldest
        Ok(state
            .customers
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.name == name)
            .cloned())
    }

    async fn create_customer(&self, customer: &Customer) -> DbResult<Customer> {
        self.record_call();
        let mut state = self.state.write().await;
        if state.customers.iter().any(|c| c.id == customer.id) {
            return Err(DbError::duplicate("id", customer.id.clone()));
        }
        state.customers.push(customer.clone());
        Ok(customer.clone())
    }

    async fn begin_invoice(&self) -> DbResult<Box<dyn InvoiceWriter>> {
        self.record_call();
        let fail_item_at = self.item_fault.lock().await.take();
        Ok(Box::new(MemoryInvoiceWriter {
            state: Arc::clone(&self.state),
            header: None,
            items: Vec::new(),
            fail_item_at,
            items_attempted: 0,
        }))
    }

    async fn find_invoice(&self, tenant_id: &str, invoice_id: &str) -> DbResult<Option<Invoice>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .invoices
            .iter()
            .find(|i| i.tenant_id == tenant_id && i.id == invoice_id)
            .cloned())
    }

    async fn list_invoices(&self, tenant_id: &str) -> DbResult<Vec<InvoiceSummary>> {
        self.record_call();
        let state = self.state.read().await;
        let mut summaries: Vec<InvoiceSummary> = state
            .invoices
            .iter()
            .filter(|i| i.tenant_id == tenant_id)
            .map(InvoiceSummary::from)
            .collect();
        summaries.sort_by(|a, b| {
            b.issue_date
                .cmp(&a.issue_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(summaries)
    }

    async fn sales_over_time(
        &self,
        tenant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<SalesDataPoint>> {
        self.record_call();
        let state = self.state.read().await;
        let mut buckets: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        for invoice in state
            .invoices
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.issue_date >= from && i.issue_date <= to)
        {
            let bucket = buckets.entry(invoice.issue_date).or_insert((0, 0));
            bucket.0 += 1;
            bucket.1 += invoice.total_cents;
        }
        Ok(buckets
            .into_iter()
            .map(|(date, (invoice_count, total_cents))| SalesDataPoint {
                date,
                invoice_count,
                total_cents,
            })
            .collect())
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Stages one invoice write and applies it under a single lock on commit.
struct MemoryInvoiceWriter {
    state: Arc<RwLock<State>>,
    header: Option<Invoice>,
    items: Vec<InvoiceItem>,
    fail_item_at: Option<usize>,
    items_attempted: usize,
}

fn number_taken(state: &State, tenant_id: &str, number: &str) -> bool {
    state
        .invoices
        .iter()
        .any(|i| i.tenant_id == tenant_id && i.invoice_number == number)
}

#[async_trait]
impl InvoiceWriter for MemoryInvoiceWriter {
    async fn next_invoice_sequence(&mut self, tenant_id: &str) -> DbResult<i64> {
        let mut state = self.state.write().await;
        let value = state.sequences.entry(tenant_id.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn invoice_number_taken(
        &mut self,
        tenant_id: &str,
        invoice_number: &str,
    ) -> DbResult<bool> {
        let staged = self
            .header
            .as_ref()
            .is_some_and(|h| h.tenant_id == tenant_id && h.invoice_number == invoice_number);
        Ok(staged || number_taken(&*self.state.read().await, tenant_id, invoice_number))
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> DbResult<()> {
        if self.header.is_some() {
            return Err(DbError::TransactionFailed(
                "invoice header already written in this unit".to_string(),
            ));
        }

        let state = self.state.read().await;
        if number_taken(&state, &invoice.tenant_id, &invoice.invoice_number) {
            return Err(DbError::duplicate(
                "invoice_number",
                invoice.invoice_number.clone(),
            ));
        }
        if !state
            .customers
            .iter()
            .any(|c| c.tenant_id == invoice.tenant_id && c.id == invoice.customer_id)
        {
            return Err(DbError::ForeignKeyViolation {
                message: format!("customer {} does not exist", invoice.customer_id),
            });
        }
        drop(state);

        self.header = Some(Invoice {
            items: Vec::new(),
            ..invoice.clone()
        });
        Ok(())
    }

    async fn insert_item(&mut self, item: &InvoiceItem) -> DbResult<()> {
        self.items_attempted += 1;
        if self.fail_item_at == Some(self.items_attempted) {
            return Err(DbError::TransactionFailed(format!(
                "injected failure on item insert #{}",
                self.items_attempted
            )));
        }

        let Some(header) = self.header.as_ref() else {
            return Err(DbError::ForeignKeyViolation {
                message: format!("invoice {} does not exist", item.invoice_id),
            });
        };
        if header.id != item.invoice_id {
            return Err(DbError::ForeignKeyViolation {
                message: format!("invoice {} does not exist", item.invoice_id),
            });
        }

        let state = self.state.read().await;
        if !state
            .products
            .iter()
            .any(|p| p.tenant_id == header.tenant_id && p.id == item.product_id)
        {
            return Err(DbError::ForeignKeyViolation {
                message: format!("product {} does not exist", item.product_id),
            });
        }
        drop(state);

        self.items.push(item.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let MemoryInvoiceWriter { state, header, mut items, .. } = *self;
        let Some(mut invoice) = header else {
            return Ok(());
        };

        let mut state = state.write().await;
        // Re-check under the write lock: another writer may have committed
        if number_taken(&state, &invoice.tenant_id, &invoice.invoice_number) {
            return Err(DbError::duplicate(
                "invoice_number",
                invoice.invoice_number.clone(),
            ));
        }

        items.sort_by_key(|i| i.line_no);
        invoice.items = items;
        state.invoices.push(invoice);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
