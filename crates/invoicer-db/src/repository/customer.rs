//! # Customer Repository
//!
//! Database operations for customers.
//!
//! ## Key Operations
//! - CRUD scoped to a tenant
//! - Partial updates (only supplied columns change)
//! - Lookup by exact name (walk-in customer for point-of-sale invoicing)
//!
//! ## Deleting
//! `invoices.customer_id` is `ON DELETE RESTRICT`, so deleting a customer
//! that still has invoices fails with [`DbError::ForeignKeyViolation`].

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::non_blank;
use crate::error::{DbError, DbResult};
use invoicer_core::{Customer, CustomerPatch, NewCustomer};

const CUSTOMER_COLUMNS: &str =
    "id, tenant_id, name, tax_code, address, email, phone, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer from a validated payload.
    pub async fn create(&self, tenant_id: &str, input: &NewCustomer) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: input.name.trim().to_string(),
            tax_code: non_blank(input.tax_code.as_deref()),
            address: non_blank(input.address.as_deref()),
            email: non_blank(input.email.as_deref()),
            phone: non_blank(input.phone.as_deref()),
            created_at: now,
            updated_at: now,
        };

        self.insert(&customer).await?;
        Ok(customer)
    }

    /// Inserts a fully built customer row.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(
            tenant_id = %customer.tenant_id,
            id = %customer.id,
            name = %customer.name,
            "Inserting customer"
        );

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, tenant_id, name, tax_code, address, email, phone,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.name)
        .bind(&customer.tax_code)
        .bind(&customer.address)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a customer by id within a tenant.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers WHERE tenant_id = ?1 AND id = ?2",
            CUSTOMER_COLUMNS
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Finds a customer by exact name within a tenant.
    ///
    /// If several customers share the name, the oldest one wins, so every
    /// caller resolves the same row.
    pub async fn find_by_name(&self, tenant_id: &str, name: &str) -> DbResult<Option<Customer>> {
        let sql = format!(
            r#"
            SELECT {} FROM customers
            WHERE tenant_id = ?1 AND name = ?2
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
            CUSTOMER_COLUMNS
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(tenant_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Lists a tenant's customers, newest first.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers WHERE tenant_id = ?1 ORDER BY created_at DESC, id DESC",
            CUSTOMER_COLUMNS
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Applies a partial update and returns the updated row.
    ///
    /// Only the columns present in `patch` are written; `updated_at` always
    /// moves. Returns `NotFound` if the customer is not in the tenant.
    pub async fn update(
        &self,
        tenant_id: &str,
        id: &str,
        patch: &CustomerPatch,
    ) -> DbResult<Customer> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE customers SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.trim().to_string());
        }
        if let Some(tax_code) = &patch.tax_code {
            qb.push(", tax_code = ").push_bind(non_blank(Some(tax_code)));
        }
        if let Some(address) = &patch.address {
            qb.push(", address = ").push_bind(non_blank(Some(address)));
        }
        if let Some(email) = &patch.email {
            qb.push(", email = ").push_bind(non_blank(Some(email)));
        }
        if let Some(phone) = &patch.phone {
            qb.push(", phone = ").push_bind(non_blank(Some(phone)));
        }

        qb.push(" WHERE tenant_id = ")
            .push_bind(tenant_id.to_string())
            .push(" AND id = ")
            .push_bind(id.to_string());

        debug!(tenant_id = %tenant_id, id = %id, "Updating customer");

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer.
    ///
    /// ## Errors
    /// - `NotFound` if the customer is not in the tenant
    /// - `ForeignKeyViolation` if invoices reference the customer
    pub async fn delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        debug!(tenant_id = %tenant_id, id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE tenant_id = ?1 AND id = ?2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use invoicer_core::NewCompany;

    async fn setup() -> (Database, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = db
            .companies()
            .create(&NewCompany {
                name: "Tenant A".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let b = db
            .companies()
            .create(&NewCompany {
                name: "Tenant B".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (db, a.id, b.id)
    }

    fn new_customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_is_tenant_scoped() {
        let (db, tenant_a, tenant_b) = setup().await;
        let repo = db.customers();

        let created = repo.create(&tenant_a, &new_customer("Acme")).await.unwrap();

        assert!(repo.get_by_id(&tenant_a, &created.id).await.unwrap().is_some());
        assert!(repo.get_by_id(&tenant_b, &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_contact_fields_stored_as_null() {
        let (db, tenant, _) = setup().await;
        let created = db
            .customers()
            .create(
                &tenant,
                &NewCustomer {
                    name: "Acme".to_string(),
                    email: Some("  ".to_string()),
                    phone: Some(" 555-0100 ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fetched = db.customers().get_by_id(&tenant, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, None);
        assert_eq!(fetched.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let (db, tenant_a, tenant_b) = setup().await;
        let repo = db.customers();
        let walk_in = repo.create(&tenant_a, &new_customer("Walk-in Customer")).await.unwrap();

        let found = repo.find_by_name(&tenant_a, "Walk-in Customer").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(walk_in.id));

        assert!(repo.find_by_name(&tenant_b, "Walk-in Customer").await.unwrap().is_none());
        assert!(repo.find_by_name(&tenant_a, "walk-in customer").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (db, tenant, other) = setup().await;
        let repo = db.customers();
        let created = repo
            .create(
                &tenant,
                &NewCustomer {
                    name: "Acme".to_string(),
                    address: Some("1 Main St".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let patch = CustomerPatch {
            email: Some("ap@acme.io".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&tenant, &created.id, &patch).await.unwrap();

        assert_eq!(updated.name, "Acme");
        assert_eq!(updated.address.as_deref(), Some("1 Main St"));
        assert_eq!(updated.email.as_deref(), Some("ap@acme.io"));

        let err = repo.update(&other, &created.id, &patch).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (db, tenant, other) = setup().await;
        let repo = db.customers();
        let first = repo.create(&tenant, &new_customer("First")).await.unwrap();
        repo.create(&tenant, &new_customer("Second")).await.unwrap();

        assert_eq!(repo.list(&tenant).await.unwrap().len(), 2);
        assert!(repo.list(&other).await.unwrap().is_empty());

        let err = repo.delete(&other, &first.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        repo.delete(&tenant, &first.id).await.unwrap();
        assert_eq!(repo.list(&tenant).await.unwrap().len(), 1);
    }
}
