//! # Company Repository
//!
//! Companies are the tenants; they are the only table not filtered by
//! `tenant_id`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::non_blank;
use crate::error::DbResult;
use invoicer_core::{Company, NewCompany};

const COMPANY_COLUMNS: &str =
    "id, name, tax_code, address, phone, email, created_at, updated_at";

/// Repository for company database operations.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Creates a new CompanyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    /// Registers a new company and returns it with its generated id.
    pub async fn create(&self, input: &NewCompany) -> DbResult<Company> {
        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            tax_code: non_blank(input.tax_code.as_deref()),
            address: non_blank(input.address.as_deref()),
            phone: non_blank(input.phone.as_deref()),
            email: non_blank(input.email.as_deref()),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %company.id, name = %company.name, "Creating company");

        sqlx::query(
            r#"
            INSERT INTO companies (
                id, name, tax_code, address, phone, email, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.tax_code)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(company)
    }

    /// Gets a company by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE id = ?1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(company)
    }

    /// Counts companies (used by the seed binary to stay idempotent).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
