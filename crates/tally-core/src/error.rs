//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  ├── DbError          - Persistence failures                           │
//! │  └── SaleError        - CoreError | DbError, returned by coordinator   │
//! │                                                                         │
//! │  register errors (app)                                                 │
//! │  └── ApiError         - What the terminal prints (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SaleError → ApiError              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// None of these are retryable as-is: the caller has to change the request
/// (or the stock) before trying again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No product with this code (or name).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A name lookup matched more than one product.
    #[error("Product name '{name}' is ambiguous, matching codes: {candidates:?}")]
    AmbiguousProduct {
        name: String,
        candidates: Vec<String>,
    },

    /// Insufficient stock to complete the sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { code: "P1", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// No sale with this id.
    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// Sale is not in a state that allows the requested operation.
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: i64,
        current_status: String,
    },

    /// Modification targets a sale that holds more than one line.
    #[error("Sale {sale_id} has {line_count} lines; only single-line sales can be modified")]
    MultiLineSale { sale_id: i64, line_count: usize },

    /// A sale needs at least one line.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Stored or supplied quotation number does not match `YYYYMMDD-NNN`.
    #[error("Invalid quotation number '{0}'")]
    InvalidQuotationNumber(String),

    /// All three-digit suffixes for the date are used up.
    #[error("Quotation sequence exhausted for {date}")]
    QuotationSequenceExhausted { date: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any durable state is touched.
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

    /// Invalid format (phone, email, date, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    /// An amount that no longer fits in `i64` cents.
    pub fn amount_overflow(field: &str) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
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
