//! # Validation Module
//!
//! Input validation utilities for Invoicer.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Shape and types of the payload                                    │
//! │  └── Unknown fields dropped                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Business rules on the request alone                               │
//! │  └── Runs before any store access                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK / NOT NULL constraints                                      │
//! │  ├── UNIQUE (tenant_id, invoice_number)                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names in errors use the request path (`items[2].quantity`) so the
//! API layer can report them verbatim.
//!
//! ## Usage
//! ```rust
//! use invoicer_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("name", "Acme Ltd").unwrap();
//! validate_quantity("items[0].quantity", 5).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::requests::{
    CreateInvoiceRequest, CustomerPatch, NewCompany, NewCustomer, NewProduct, ProductPatch,
};
use crate::{MAX_INVOICE_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of names (companies, customers, products).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of free-text fields (address, description, URLs).
pub const MAX_TEXT_LEN: usize = 500;

/// Maximum length of a client-assigned invoice number.
pub const MAX_INVOICE_NUMBER_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ```rust
/// use invoicer_core::validation::validate_name;
///
/// assert!(validate_name("name", "Walk-in Customer").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Rejects a name that equals, after trimming, one the system reserves.
///
/// ```rust
/// use invoicer_core::validation::validate_not_reserved;
///
/// assert!(validate_not_reserved("name", "Acme", "Walk-in Customer").is_ok());
/// assert!(validate_not_reserved("name", " Walk-in Customer ", "Walk-in Customer").is_err());
/// ```
pub fn validate_not_reserved(field: &str, name: &str, reserved: &str) -> ValidationResult<()> {
    if name.trim() == reserved.trim() {
        return Err(ValidationError::Reserved {
            field: field.to_string(),
            value: reserved.trim().to_string(),
        });
    }
    Ok(())
}

/// Validates an optional free-text field against a length limit.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates the shape of an optional email address.
///
/// Only the shape is checked (`local@domain.tld`); deliverability is not.
pub fn validate_email(field: &str, email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim) else {
        return Ok(());
    };
    if email.is_empty() {
        return Ok(());
    }

    validate_optional_text(field, Some(email), MAX_NAME_LEN)?;

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a reference id (product, customer) that must be present.
pub fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a client-assigned invoice number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, `-`, `_` and `/` only
///
/// ```rust
/// use invoicer_core::validation::validate_invoice_number;
///
/// assert!(validate_invoice_number("2024/INV-0001").is_ok());
/// assert!(validate_invoice_number("INV 1").is_err());
/// ```
pub fn validate_invoice_number(number: &str) -> ValidationResult<()> {
    const FIELD: &str = "invoice_number";

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: FIELD.to_string(),
        });
    }

    if number.chars().count() > MAX_INVOICE_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: FIELD.to_string(),
            max: MAX_INVOICE_NUMBER_LEN,
        });
    }

    if !number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: FIELD.to_string(),
            reason: "must contain only letters, numbers, '-', '_' and '/'".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (99,999)
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a product price in cents. Zero and negative prices are rejected.
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points (0 to 10000, i.e. 0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates that a reporting window is not inverted.
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::Inconsistent {
            field: "from".to_string(),
            reason: format!("{} is after {}", from, to),
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a create-invoice request without touching any store.
///
/// Collects every violation rather than stopping at the first, so clients
/// get all field errors in one response.
///
/// ## Checks
/// ```text
/// customer_id      required when `requires_customer`
/// invoice_number   validate_invoice_number, if present
/// due_date         not before `issue_date`, if present
/// items            1..=MAX_INVOICE_LINES entries
/// items[i]         product_id present, quantity in 1..=MAX_LINE_QUANTITY
/// ```
pub fn validate_create_invoice_request(
    request: &CreateInvoiceRequest,
    issue_date: NaiveDate,
    requires_customer: bool,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if request.items.is_empty() {
        errors.push(ValidationError::TooFew {
            field: "items".to_string(),
            min: 1,
        });
    } else if request.items.len() > MAX_INVOICE_LINES {
        errors.push(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_INVOICE_LINES,
        });
    }

    for (idx, line) in request.items.iter().enumerate() {
        if let Err(e) = validate_reference(&format!("items[{}].product_id", idx), &line.product_id) {
            errors.push(e);
        }
        if let Err(e) = validate_quantity(&format!("items[{}].quantity", idx), line.quantity) {
            errors.push(e);
        }
    }

    let customer_missing = request
        .customer_id
        .as_deref()
        .map_or(true, |id| id.trim().is_empty());
    if requires_customer && customer_missing {
        errors.push(ValidationError::Required {
            field: "customer_id".to_string(),
        });
    }

    if let Some(number) = request.invoice_number.as_deref() {
        if let Err(e) = validate_invoice_number(number) {
            errors.push(e);
        }
    }

    if let Some(due) = request.due_date {
        if due < issue_date {
            errors.push(ValidationError::Inconsistent {
                field: "due_date".to_string(),
                reason: "must not be before the issue date".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a company registration payload.
pub fn validate_new_company(input: &NewCompany) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_optional_text("tax_code", input.tax_code.as_deref(), 50)?;
    validate_optional_text("address", input.address.as_deref(), MAX_TEXT_LEN)?;
    validate_optional_text("phone", input.phone.as_deref(), 50)?;
    validate_email("email", input.email.as_deref())
}

/// Validates a new customer payload.
pub fn validate_new_customer(input: &NewCustomer) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_optional_text("tax_code", input.tax_code.as_deref(), 50)?;
    validate_optional_text("address", input.address.as_deref(), MAX_TEXT_LEN)?;
    validate_optional_text("phone", input.phone.as_deref(), 50)?;
    validate_email("email", input.email.as_deref())
}

/// Validates a partial customer update. Absent fields are not checked.
pub fn validate_customer_patch(patch: &CustomerPatch) -> ValidationResult<()> {
    if let Some(name) = patch.name.as_deref() {
        validate_name("name", name)?;
    }
    validate_optional_text("tax_code", patch.tax_code.as_deref(), 50)?;
    validate_optional_text("address", patch.address.as_deref(), MAX_TEXT_LEN)?;
    validate_optional_text("phone", patch.phone.as_deref(), 50)?;
    validate_email("email", patch.email.as_deref())
}

/// Validates a new product payload.
pub fn validate_new_product(input: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_optional_text("description", input.description.as_deref(), MAX_TEXT_LEN)?;
    validate_optional_text("image_url", input.image_url.as_deref(), MAX_TEXT_LEN)?;
    validate_price_cents("unit_price_cents", input.unit_price_cents)
}

/// Validates a partial product update. Absent fields are not checked.
pub fn validate_product_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if let Some(name) = patch.name.as_deref() {
        validate_name("name", name)?;
    }
    validate_optional_text("description", patch.description.as_deref(), MAX_TEXT_LEN)?;
    validate_optional_text("image_url", patch.image_url.as_deref(), MAX_TEXT_LEN)?;
    if let Some(price) = patch.unit_price_cents {
        validate_price_cents("unit_price_cents", price)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
