//! # Invoice Repository
//!
//! Reads and reports over invoices, plus the statements the transactional
//! writer runs.
//!
//! ## Invoice Write (one transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    next_sequence(tenant)      UPSERT invoice_sequences ... RETURNING   │
//! │    number_exists(number)      repeat while a client took the number    │
//! │    insert_invoice(header)     UNIQUE (tenant_id, invoice_number)       │
//! │    insert_item(line 1)        FK product_id, CHECK quantity > 0        │
//! │    insert_item(line 2)                                                  │
//! │    ...                                                                  │
//! │  COMMIT                       (any error / drop before this → ROLLBACK) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The write statements take a bare `SqliteConnection` so they run on
//! whatever transaction the caller holds.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use invoicer_core::{Invoice, InvoiceItem, InvoiceSummary, SalesDataPoint};

const INVOICE_SELECT: &str = r#"
    SELECT
        i.id,
        i.tenant_id,
        i.customer_id,
        c.name AS customer_name,
        i.invoice_number,
        i.issue_date,
        i.due_date,
        i.subtotal_cents,
        i.tax_cents,
        i.total_cents,
        i.status,
        i.created_at,
        i.updated_at
    FROM invoices i
    JOIN customers c ON c.id = i.customer_id
"#;

/// Repository for invoice reads and reports.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice with its items (in line order) within a tenant.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("{} WHERE i.tenant_id = ?1 AND i.id = ?2", INVOICE_SELECT);
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(mut invoice) = invoice else {
            return Ok(None);
        };

        invoice.items = self.get_items(&invoice.id).await?;
        Ok(Some(invoice))
    }

    /// Gets all items of an invoice, ordered by `line_no`.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT
                id, invoice_id, line_no, product_id, description,
                quantity, unit_price_cents, total_price_cents
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY line_no ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a tenant's invoices, newest issue date first.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<InvoiceSummary>> {
        let summaries = sqlx::query_as::<_, InvoiceSummary>(
            r#"
            SELECT
                i.id,
                i.invoice_number,
                i.customer_id,
                c.name AS customer_name,
                i.issue_date,
                i.due_date,
                i.total_cents,
                i.status,
                i.created_at
            FROM invoices i
            JOIN customers c ON c.id = i.customer_id
            WHERE i.tenant_id = ?1
            ORDER BY i.issue_date DESC, i.created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    /// Sums invoice totals per issue date over an inclusive window.
    ///
    /// Dates without invoices are absent from the result.
    pub async fn sales_over_time(
        &self,
        tenant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<SalesDataPoint>> {
        let points = sqlx::query_as::<_, SalesDataPoint>(
            r#"
            SELECT
                issue_date AS date,
                COUNT(*) AS invoice_count,
                SUM(total_cents) AS total_cents
            FROM invoices
            WHERE tenant_id = ?1 AND issue_date >= ?2 AND issue_date <= ?3
            GROUP BY issue_date
            ORDER BY issue_date ASC
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(points)
    }

    /// Number of invoice headers stored for a tenant.
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of invoice items stored for a tenant.
    pub async fn count_items(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            WHERE i.tenant_id = ?1
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

// =============================================================================
// Write Statements (run inside the caller's transaction)
// =============================================================================

/// Allocates the next invoice sequence value for a tenant.
///
/// The first call for a tenant returns 1.
pub async fn next_sequence(conn: &mut SqliteConnection, tenant_id: &str) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoice_sequences (tenant_id, last_value) VALUES (?1, 1)
        ON CONFLICT(tenant_id) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(tenant_id)
    .fetch_one(conn)
    .await?;

    Ok(value)
}

/// True if the tenant already has an invoice with this number.
pub async fn number_exists(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    invoice_number: &str,
) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM invoices WHERE tenant_id = ?1 AND invoice_number = ?2)",
    )
    .bind(tenant_id)
    .bind(invoice_number)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

/// Inserts an invoice header.
///
/// A clash on `(tenant_id, invoice_number)` is a `UniqueViolation` that
/// carries the number.
pub async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    debug!(
        tenant_id = %invoice.tenant_id,
        id = %invoice.id,
        invoice_number = %invoice.invoice_number,
        "Inserting invoice"
    );

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, tenant_id, customer_id, invoice_number,
            issue_date, due_date,
            subtotal_cents, tax_cents, total_cents,
            status, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6,
            ?7, ?8, ?9,
            ?10, ?11, ?12
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.tenant_id)
    .bind(&invoice.customer_id)
    .bind(&invoice.invoice_number)
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.subtotal_cents)
    .bind(invoice.tax_cents)
    .bind(invoice.total_cents)
    .bind(invoice.status)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(conn)
    .await
    .map_err(|e| match DbError::from(e) {
        err if err.is_unique_violation_on("invoice_number") => {
            err.with_value(invoice.invoice_number.clone())
        }
        err => err,
    })?;

    Ok(())
}

/// Inserts one invoice item.
pub async fn insert_item(conn: &mut SqliteConnection, item: &InvoiceItem) -> DbResult<()> {
    debug!(
        invoice_id = %item.invoice_id,
        line_no = item.line_no,
        product_id = %item.product_id,
        "Inserting invoice item"
    );

    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, line_no, product_id, description,
            quantity, unit_price_cents, total_price_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.invoice_id)
    .bind(item.line_no)
    .bind(&item.product_id)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.total_price_cents)
    .execute(conn)
    .await?;

    Ok(())
}
