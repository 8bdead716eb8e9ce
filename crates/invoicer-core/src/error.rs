//! # Error Types
//!
//! Domain-specific error types for invoicer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  invoicer-core errors (this file)                                      │
//! │  ├── CoreError        - Domain rule failures (overflow, ...)           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  invoicer-db errors                                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  invoicer-service errors                                               │
//! │  ├── ServiceError     - Typed workflow failures                        │
//! │  └── AppError         - What API clients see (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → AppError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A monetary computation left the representable range.
    ///
    /// ## When This Occurs
    /// - `quantity × unit_price` of one line exceeds `i64` cents
    /// - The sum of all lines exceeds `i64` cents
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant names the offending field so the API layer can report
/// field-level details.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email, bad invoice number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection has fewer elements than required.
    #[error("{field} must contain at least {min} entries")]
    TooFew { field: String, min: usize },

    /// A collection has more elements than allowed.
    #[error("{field} must contain at most {max} entries")]
    TooMany { field: String, max: usize },

    /// The value is set aside for the system's own use.
    #[error("{field} '{value}' is reserved")]
    Reserved { field: String, value: String },

    /// Two values are individually valid but contradict each other.
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },
}

impl ValidationError {
    /// Name of the field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::TooFew { field, .. }
            | ValidationError::TooMany { field, .. }
            | ValidationError::Reserved { field, .. }
            | ValidationError::Inconsistent { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
