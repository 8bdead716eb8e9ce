//! # Tenant Store
//!
//! The persistence seam of the invoice workflow.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       TenantStore (trait)                               │
//! │                                                                         │
//! │   Assembler reads                 Persister writes                     │
//! │   ─────────────                   ────────────────                     │
//! │   find_product                    begin_invoice() ─► InvoiceWriter     │
//! │   find_customer                     next_invoice_sequence              │
//! │   find_customer_by_name             insert_invoice                     │
//! │   create_customer                   invoice_number_taken               │
//! │                                     insert_item × n                    │
//! │                                     commit   (drop = rollback)         │
//! │                                                                         │
//! │   Implementations:                                                      │
//! │   ├── Database     (SQLite, production)          ← this file           │
//! │   └── MemoryStore  (tests, fault injection)      ← memory.rs           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read takes the tenant id. A row owned by another tenant is reported
//! exactly like a missing row (`Ok(None)`).

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::invoice as invoice_sql;
use invoicer_core::{Customer, Invoice, InvoiceItem, InvoiceSummary, Product, SalesDataPoint};

// =============================================================================
// Traits
// =============================================================================

/// Tenant-scoped persistence used by the invoice workflow.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Finds a product owned by the tenant.
    async fn find_product(&self, tenant_id: &str, product_id: &str) -> DbResult<Option<Product>>;

    /// Finds a customer owned by the tenant.
    async fn find_customer(&self, tenant_id: &str, customer_id: &str)
        -> DbResult<Option<Customer>>;

    /// Finds a customer by exact name (oldest match wins).
    async fn find_customer_by_name(&self, tenant_id: &str, name: &str)
        -> DbResult<Option<Customer>>;

    /// Stores a fully built customer and returns it.
    async fn create_customer(&self, customer: &Customer) -> DbResult<Customer>;

    /// Opens a unit of work for one invoice write.
    ///
    /// Nothing becomes visible until [`InvoiceWriter::commit`]. Dropping the
    /// writer without committing discards everything it wrote.
    async fn begin_invoice(&self) -> DbResult<Box<dyn InvoiceWriter>>;

    /// Finds an invoice with its items (in line order) and customer name.
    async fn find_invoice(&self, tenant_id: &str, invoice_id: &str) -> DbResult<Option<Invoice>>;

    /// Lists the tenant's invoices, newest issue date first.
    async fn list_invoices(&self, tenant_id: &str) -> DbResult<Vec<InvoiceSummary>>;

    /// Per-issue-date sales totals over an inclusive window, oldest first.
    async fn sales_over_time(
        &self,
        tenant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<SalesDataPoint>>;
}

/// A single atomic invoice write.
#[async_trait]
pub trait InvoiceWriter: Send {
    /// Allocates the next invoice number sequence value for the tenant.
    async fn next_invoice_sequence(&mut self, tenant_id: &str) -> DbResult<i64>;

    /// True if the number is already used within the tenant, as seen from
    /// inside this unit of work.
    async fn invoice_number_taken(&mut self, tenant_id: &str, invoice_number: &str)
        -> DbResult<bool>;

    /// Writes the invoice header. Items are written separately.
    async fn insert_invoice(&mut self, invoice: &Invoice) -> DbResult<()>;

    /// Writes one invoice item.
    async fn insert_item(&mut self, item: &InvoiceItem) -> DbResult<()>;

    /// Makes every write of this unit visible at once.
    async fn commit(self: Box<Self>) -> DbResult<()>;
}

// =============================================================================
// SQLite Implementation
// =============================================================================

#[async_trait]
impl TenantStore for Database {
    async fn find_product(&self, tenant_id: &str, product_id: &str) -> DbResult<Option<Product>> {
        self.products().get_by_id(tenant_id, product_id).await
    }

    async fn find_customer(
        &self,
        tenant_id: &str,
        customer_id: &str,
    ) -> DbResult<Option<Customer>> {
        self.customers().get_by_id(tenant_id, customer_id).await
    }

    async fn find_customer_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> DbResult<Option<Customer>> {
        self.customers().find_by_name(tenant_id, name).await
    }

    async fn create_customer(&self, customer: &Customer) -> DbResult<Customer> {
        self.customers().insert(customer).await?;
        Ok(customer.clone())
    }

    async fn begin_invoice(&self) -> DbResult<Box<dyn InvoiceWriter>> {
        let tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Invoice transaction started");
        Ok(Box::new(SqliteInvoiceWriter { tx }))
    }

    async fn find_invoice(&self, tenant_id: &str, invoice_id: &str) -> DbResult<Option<Invoice>> {
        self.invoices().get_by_id(tenant_id, invoice_id).await
    }

    async fn list_invoices(&self, tenant_id: &str) -> DbResult<Vec<InvoiceSummary>> {
        self.invoices().list(tenant_id).await
    }

    async fn sales_over_time(
        &self,
        tenant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<SalesDataPoint>> {
        self.invoices().sales_over_time(tenant_id, from, to).await
    }
}

/// Invoice writer backed by one SQLite transaction.
///
/// sqlx rolls the transaction back when it is dropped uncommitted, which
/// covers early returns, errors and cancelled futures alike.
pub struct SqliteInvoiceWriter {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl InvoiceWriter for SqliteInvoiceWriter {
    async fn next_invoice_sequence(&mut self, tenant_id: &str) -> DbResult<i64> {
        invoice_sql::next_sequence(&mut self.tx, tenant_id).await
    }

    async fn invoice_number_taken(
        &mut self,
        tenant_id: &str,
        invoice_number: &str,
    ) -> DbResult<bool> {
        invoice_sql::number_exists(&mut self.tx, tenant_id, invoice_number).await
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> DbResult<()> {
        invoice_sql::insert_invoice(&mut self.tx, invoice).await
    }

    async fn insert_item(&mut self, item: &InvoiceItem) -> DbResult<()> {
        invoice_sql::insert_item(&mut self.tx, item).await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Invoice transaction committed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use chrono::Utc;
    use invoicer_core::{InvoiceStatus, NewCompany, NewCustomer, NewProduct};

    struct Fixture {
        db: Database,
        tenant: String,
        customer: Customer,
        product: Product,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = db
            .companies()
            .create(&NewCompany {
                name: "Tenant".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id;
        let customer = db
            .customers()
            .create(
                &tenant,
                &NewCustomer {
                    name: "Acme".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let product = db
            .products()
            .create(
                &tenant,
                &NewProduct {
                    name: "Widget".to_string(),
                    unit_price_cents: 1_000,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        Fixture {
            db,
            tenant,
            customer,
            product,
        }
    }

    fn invoice(f: &Fixture, id: &str, number: &str, issue: NaiveDate) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: id.to_string(),
            tenant_id: f.tenant.clone(),
            customer_id: f.customer.id.clone(),
            customer_name: f.customer.name.clone(),
            invoice_number: number.to_string(),
            issue_date: issue,
            due_date: issue,
            subtotal_cents: 2_000,
            tax_cents: 200,
            total_cents: 2_200,
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
            items: vec![],
        }
    }

    fn item(invoice_id: &str, line_no: i64, product_id: &str) -> InvoiceItem {
        InvoiceItem {
            id: format!("{}-item-{}", invoice_id, line_no),
            invoice_id: invoice_id.to_string(),
            line_no,
            product_id: product_id.to_string(),
            description: "Widget".to_string(),
            quantity: 2,
            unit_price_cents: 1_000,
            total_price_cents: 2_000,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_commit_makes_invoice_visible() {
        let f = fixture().await;

        let mut writer = f.db.begin_invoice().await.unwrap();
        writer.insert_invoice(&invoice(&f, "inv-1", "INV-000001", date(1))).await.unwrap();
        writer.insert_item(&item("inv-1", 2, &f.product.id)).await.unwrap();
        writer.insert_item(&item("inv-1", 1, &f.product.id)).await.unwrap();
        writer.commit().await.unwrap();

        let stored = f.db.find_invoice(&f.tenant, "inv-1").await.unwrap().unwrap();
        assert_eq!(stored.customer_name, "Acme");
        assert_eq!(stored.total_cents, 2_200);
        assert_eq!(stored.status, InvoiceStatus::Draft);
        assert_eq!(stored.issue_date, date(1));
        let lines: Vec<i64> = stored.items.iter().map(|i| i.line_no).collect();
        assert_eq!(lines, vec![1, 2]);

        assert!(f.db.find_invoice("other", "inv-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let f = fixture().await;

        {
            let mut writer = f.db.begin_invoice().await.unwrap();
            writer.next_invoice_sequence(&f.tenant).await.unwrap();
            writer.insert_invoice(&invoice(&f, "inv-1", "INV-000001", date(1))).await.unwrap();
            writer.insert_item(&item("inv-1", 1, &f.product.id)).await.unwrap();
        }

        assert_eq!(f.db.invoices().count(&f.tenant).await.unwrap(), 0);
        assert_eq!(f.db.invoices().count_items(&f.tenant).await.unwrap(), 0);

        // The sequence increment was rolled back too
        let mut writer = f.db.begin_invoice().await.unwrap();
        assert_eq!(writer.next_invoice_sequence(&f.tenant).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_item_failure_leaves_nothing_behind() {
        let f = fixture().await;

        let mut writer = f.db.begin_invoice().await.unwrap();
        writer.insert_invoice(&invoice(&f, "inv-1", "INV-000001", date(1))).await.unwrap();
        writer.insert_item(&item("inv-1", 1, &f.product.id)).await.unwrap();
        let err = writer.insert_item(&item("inv-1", 2, "no-such-product")).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        drop(writer);

        assert_eq!(f.db.invoices().count(&f.tenant).await.unwrap(), 0);
        assert_eq!(f.db.invoices().count_items(&f.tenant).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sequence_is_per_tenant_and_monotonic() {
        let f = fixture().await;
        let other = f
            .db
            .companies()
            .create(&NewCompany {
                name: "Other".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id;

        for expected in 1..=3 {
            let mut writer = f.db.begin_invoice().await.unwrap();
            assert_eq!(writer.next_invoice_sequence(&f.tenant).await.unwrap(), expected);
            writer.commit().await.unwrap();
        }

        let mut writer = f.db.begin_invoice().await.unwrap();
        assert_eq!(writer.next_invoice_sequence(&other).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_number_is_reported() {
        let f = fixture().await;

        let mut writer = f.db.begin_invoice().await.unwrap();
        assert!(!writer.invoice_number_taken(&f.tenant, "INV-7").await.unwrap());
        writer.insert_invoice(&invoice(&f, "inv-1", "INV-7", date(1))).await.unwrap();
        assert!(writer.invoice_number_taken(&f.tenant, "INV-7").await.unwrap());
        writer.commit().await.unwrap();

        let mut writer = f.db.begin_invoice().await.unwrap();
        assert!(writer.invoice_number_taken(&f.tenant, "INV-7").await.unwrap());
        assert!(!writer.invoice_number_taken("other", "INV-7").await.unwrap());
        let err = writer
            .insert_invoice(&invoice(&f, "inv-2", "INV-7", date(1)))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("invoice_number"));
        assert!(matches!(err, DbError::UniqueViolation { value: Some(ref n), .. } if n == "INV-7"));
    }

    #[tokio::test]
    async fn test_list_and_sales_over_time() {
        let f = fixture().await;

        let mut writer = f.db.begin_invoice().await.unwrap();
        writer.insert_invoice(&invoice(&f, "inv-1", "A-1", date(1))).await.unwrap();
        writer.insert_invoice(&invoice(&f, "inv-2", "A-2", date(3))).await.unwrap();
        writer.insert_invoice(&invoice(&f, "inv-3", "A-3", date(3))).await.unwrap();
        writer.insert_invoice(&invoice(&f, "inv-4", "A-4", date(9))).await.unwrap();
        writer.commit().await.unwrap();

        let list = f.db.list_invoices(&f.tenant).await.unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[0].invoice_number, "A-4");
        assert_eq!(list[3].invoice_number, "A-1");
        assert_eq!(list[0].customer_name, "Acme");

        let points = f.db.sales_over_time(&f.tenant, date(1), date(5)).await.unwrap();
        assert_eq!(
            points,
            vec![
                SalesDataPoint {
                    date: date(1),
                    invoice_count: 1,
                    total_cents: 2_200,
                },
                SalesDataPoint {
                    date: date(3),
                    invoice_count: 2,
                    total_cents: 4_400,
                },
            ]
        );
    }
}
