//! # Database Error Types
//!
//! [`DbError`] is what every repository and [`TenantStore`](crate::TenantStore)
//! call returns. Constraint failures are classified by the driver's error
//! kind, so the service layer can tell a taken invoice number from a
//! missing tenant without reading SQLite message text.
//!
//! ```text
//! sqlx::Error ──► DbError ──► ServiceError (invoicer-service) ──► AppError
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The row does not exist, or belongs to another tenant.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the row.
    ///
    /// `columns` are bare column names (`["tenant_id", "invoice_number"]`).
    /// SQLite does not report the offending value; callers that know it
    /// attach it with [`DbError::with_value`].
    #[error(
        "Duplicate {}: '{}' already exists",
        .columns.join(", "),
        .value.as_deref().unwrap_or("?")
    )]
    UniqueViolation {
        columns: Vec<String>,
        value: Option<String>,
    },

    /// A referenced tenant, customer, product or invoice does not exist, or
    /// a customer with invoices was deleted.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK constraint rejected the row (non-positive price or quantity).
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin or commit failed, or a fault injected by `MemoryStore`.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// A UNIQUE violation on one column with a known value.
    pub fn duplicate(column: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            columns: vec![column.into()],
            value: Some(value.into()),
        }
    }

    /// True if this is a UNIQUE violation whose index covers `column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { columns, .. } if columns.iter().any(|c| c == column))
    }

    /// Attaches the rejected value to a UNIQUE violation. Other errors pass
    /// through untouched.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        match self {
            DbError::UniqueViolation { columns, .. } => DbError::UniqueViolation {
                columns,
                value: Some(value.into()),
            },
            other => other,
        }
    }
}

/// Column names out of `UNIQUE constraint failed: invoices.tenant_id, invoices.invoice_number`.
fn unique_columns(message: &str) -> Vec<String> {
    message
        .split_once(": ")
        .map(|(_, list)| list)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.rsplit('.').next().unwrap_or(c).to_string())
        .collect()
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "query returned no rows"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        columns: unique_columns(&message),
                        value: None,
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation => DbError::CheckViolation { message },
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
