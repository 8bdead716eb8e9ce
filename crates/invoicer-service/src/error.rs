//! # Service and API Error Types
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Invoicer                               │
//! │                                                                         │
//! │  ValidationError ──┐                                                    │
//! │  CoreError ────────┼──► ServiceError ──► AppError ──► JSON to client   │
//! │  DbError ──────────┘    (typed, for      { "message",                   │
//! │                          the workflow)     "code",                      │
//! │                                            "details"? }                 │
//! │                                          + status (HTTP, not in body)   │
//! │                                          + cause  (logged, not in body) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Codes
//! ```text
//! VALIDATION_ERROR       400   details: [{ field, message }]
//! PRODUCT_NOT_FOUND      400
//! CUSTOMER_NOT_FOUND     404
//! INVOICE_NOT_FOUND      404
//! NOT_FOUND              404
//! CONFLICT               409
//! INTERNAL_SERVER_ERROR  500
//! ```

use http::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use invoicer_core::{CoreError, ValidationError};
use invoicer_db::DbError;

// =============================================================================
// Service Error
// =============================================================================

/// Typed failures of the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request broke one or more input rules. Never touches the store.
    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// A client-assigned invoice number is already used in the tenant.
    #[error("Invoice number '{0}' already exists")]
    DuplicateInvoiceNumber(String),

    /// The operation conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store failed or timed out; nothing was committed.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(vec![err])
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ServiceError::Validation(vec![e]),
            CoreError::AmountOverflow { context } => {
                ServiceError::Validation(vec![ValidationError::Inconsistent {
                    field: "items".to_string(),
                    reason: format!("amount overflow while computing {}", context),
                }])
            }
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Error Code
// =============================================================================

/// Machine-readable error codes. Clients switch on these; keep them stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    InvalidInput,
    ValidationError,
    ProductNotFound,
    CustomerNotFound,
    InvoiceNotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    InternalServerError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ProductNotFound => "PRODUCT_NOT_FOUND",
            ErrorCode::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            ErrorCode::InvoiceNotFound => "INVOICE_NOT_FOUND",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// App Error (external envelope)
// =============================================================================

/// The error clients see.
///
/// ## Serialization
/// ```json
/// {
///   "message": "Invalid input",
///   "code": "VALIDATION_ERROR",
///   "details": [{ "field": "items[0].quantity", "message": "items[0].quantity must be positive" }]
/// }
/// ```
/// `status` and `cause` are never serialized.
#[derive(Debug, Serialize)]
pub struct AppError {
    /// Human-readable message, safe to display.
    pub message: String,

    /// Machine-readable code for programmatic handling.
    pub code: ErrorCode,

    /// Structured extra information (field errors, ids).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// HTTP status the transport should answer with.
    #[serde(skip)]
    pub status: StatusCode,

    /// Underlying error, kept for logs only.
    #[serde(skip)]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Creates an error with no details and no cause.
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            message: message.into(),
            code,
            details: None,
            status,
            cause: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    // -------------------------------------------------------------------------
    // Predefined errors
    // -------------------------------------------------------------------------

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, message)
    }

    pub fn unauthorized() -> Self {
        AppError::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Authentication required",
        )
    }

    pub fn forbidden() -> Self {
        AppError::new(
            StatusCode::FORBIDDEN,
            ErrorCode::Forbidden,
            "You do not have permission to perform this action",
        )
    }

    /// Generic 500. The real reason belongs in `cause`, never in the message.
    pub fn internal() -> Self {
        AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            "An unexpected error occurred",
        )
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::new(StatusCode::CONFLICT, ErrorCode::Conflict, message)
    }

    /// 400 with one `{field, message}` detail per violation.
    pub fn validation(errors: &[ValidationError]) -> Self {
        let details = errors
            .iter()
            .map(|e| {
                serde_json::json!({
                    "field": e.field(),
                    "message": e.to_string(),
                })
            })
            .collect();

        AppError::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationError,
            "Invalid input",
        )
        .with_details(serde_json::Value::Array(details))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Converts service errors to the envelope.
///
/// Persistence and internal failures are logged here with their cause and
/// reach the client only as a generic 500.
impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => AppError::validation(&errors),
            ServiceError::ProductNotFound(id) => AppError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::ProductNotFound,
                format!("Product not found: {}", id),
            )
            .with_details(serde_json::json!({ "product_id": id })),
            ServiceError::CustomerNotFound(id) => AppError::new(
                StatusCode::NOT_FOUND,
                ErrorCode::CustomerNotFound,
                format!("Customer not found: {}", id),
            )
            .with_details(serde_json::json!({ "customer_id": id })),
            ServiceError::InvoiceNotFound(id) => AppError::new(
                StatusCode::NOT_FOUND,
                ErrorCode::InvoiceNotFound,
                format!("Invoice not found: {}", id),
            ),
            ServiceError::CompanyNotFound(id) => {
                AppError::not_found(format!("Company not found: {}", id))
            }
            ServiceError::DuplicateInvoiceNumber(number) => {
                AppError::conflict(format!("Invoice number '{}' already exists", number))
                    .with_details(serde_json::json!({ "invoice_number": number }))
            }
            ServiceError::Conflict(message) => AppError::conflict(message),
            ServiceError::Persistence(e) => {
                tracing::error!(error = %e, "Persistence failure");
                AppError::internal().with_cause(e)
            }
            ServiceError::Internal(message) => {
                tracing::error!(error = %message, "Internal error");
                AppError::internal().with_cause(ServiceError::Internal(message))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_envelope() {
        let err: AppError = ServiceError::Validation(vec![
            ValidationError::TooFew {
                field: "items".to_string(),
                min: 1,
            },
            ValidationError::MustBePositive {
                field: "items[0].quantity".to_string(),
            },
        ])
        .into();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, ErrorCode::ValidationError);

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"][1]["field"], "items[0].quantity");
        assert!(json.get("status").is_none());
        assert!(json.get("cause").is_none());
    }

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ServiceError, StatusCode, &str)> = vec![
            (
                ServiceError::ProductNotFound("p".into()),
                StatusCode::BAD_REQUEST,
                "PRODUCT_NOT_FOUND",
            ),
            (
                ServiceError::CustomerNotFound("c".into()),
                StatusCode::NOT_FOUND,
                "CUSTOMER_NOT_FOUND",
            ),
            (
                ServiceError::InvoiceNotFound("i".into()),
                StatusCode::NOT_FOUND,
                "INVOICE_NOT_FOUND",
            ),
            (
                ServiceError::CompanyNotFound("t".into()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                ServiceError::DuplicateInvoiceNumber("INV-1".into()),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                ServiceError::Persistence(DbError::PoolExhausted),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
            ),
        ];

        for (service_err, status, code) in cases {
            let app: AppError = service_err.into();
            assert_eq!(app.status, status);
            assert_eq!(app.code.as_str(), code);
        }
    }

    #[test]
    fn test_internal_hides_cause() {
        let app: AppError =
            ServiceError::Persistence(DbError::QueryFailed("disk I/O error".into())).into();

        assert_eq!(app.message, "An unexpected error occurred");
        let json = serde_json::to_string(&app).unwrap();
        assert!(!json.contains("disk I/O"));

        let source = std::error::Error::source(&app).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Query failed: disk I/O error"));
    }

    #[test]
    fn test_predefined_errors() {
        assert_eq!(AppError::unauthorized().status, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden().code, ErrorCode::Forbidden);
        assert_eq!(AppError::invalid_input("bad").code.as_str(), "INVALID_INPUT");
        assert_eq!(
            AppError::conflict("taken").to_string(),
            "[CONFLICT] taken"
        );
    }
}
