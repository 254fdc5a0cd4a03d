//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  register sale commit cart.json                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command handler → Result<Response, ApiError>                    │  │
//! │  │         │                                                        │  │
//! │  │  SaleError::Persistence(DbError) ──┐                             │  │
//! │  │  SaleError::Core(CoreError) ───────┼──► ApiError { code, message }│  │
//! │  │  serde_json::Error (bad request) ──┘                             │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stderr: {"code":"INSUFFICIENT_STOCK","message":"..."}   exit 1        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Infrastructure details are logged, not printed: the cashier sees a short
//! message and the log keeps the SQLite text.

use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_db::{DbError, SaleError};
use thiserror::Error;

/// Error printed when a command fails.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for P1: 3 available, 5 requested"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown subcommand or malformed arguments
    Usage,

    /// Product or sale not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed (may succeed on retry)
    DatabaseError,

    /// Business rule rejected the request
    BusinessLogic,

    /// Cart is empty or too large
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Usage, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Renders the error as a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL","message":"{}"}}"#, self.message)
        })
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ConstraintViolation { message } => {
                tracing::error!("Constraint violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Value rejected by the database")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id.to_string()),
            CoreError::InsufficientStock {
                code,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    code, available, requested
                ),
            ),
            CoreError::AmbiguousProduct { name, candidates } => ApiError::new(
                ErrorCode::ValidationError,
                format!(
                    "Several products are named '{}', use a code: {}",
                    name,
                    candidates.join(", ")
                ),
            ),
            err @ (CoreError::InvalidSaleStatus { .. }
            | CoreError::MultiLineSale { .. }
            | CoreError::QuotationSequenceExhausted { .. }) => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::InvalidQuotationNumber(value) => {
                tracing::error!(value = %value, "Stored quotation number is corrupt");
                ApiError::internal("Quotation counter is corrupt")
            }
            err @ (CoreError::EmptyCart | CoreError::CartTooLarge { .. }) => {
                ApiError::new(ErrorCode::CartError, err.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        match err {
            SaleError::Core(e) => e.into(),
            SaleError::Persistence(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Bad command lines. Only the first line of clap's rendering is kept.
impl From<clap::Error> for ApiError {
    fn from(err: clap::Error) -> Self {
        let rendered = err.to_string();
        let first = rendered.lines().next().unwrap_or_default();
        ApiError::usage(first.trim_start_matches("error: ").to_string())
    }
}

/// Malformed request files.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation(format!("Invalid request: {}", err))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_mapping() {
        let err = ApiError::from(SaleError::from(CoreError::InsufficientStock {
            code: "P1".to_string(),
            available: 3,
            requested: 5,
        }));
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "Insufficient stock for P1: 3 available, 5 requested"
        );
    }

    #[test]
    fn test_json_shape() {
        let err = ApiError::from(CoreError::SaleNotFound(7));
        assert_eq!(
            err.to_json(),
            r#"{"code":"NOT_FOUND","message":"Sale not found: 7"}"#
        );
    }

    #[test]
    fn test_persistence_details_are_hidden() {
        let err = ApiError::from(SaleError::from(DbError::QueryFailed(
            "disk I/O error".to_string(),
        )));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_business_and_validation_codes() {
        let multi = ApiError::from(CoreError::MultiLineSale {
            sale_id: 1,
            line_count: 2,
        });
        assert_eq!(multi.code, ErrorCode::BusinessLogic);

        let empty = ApiError::from(CoreError::EmptyCart);
        assert_eq!(empty.code, ErrorCode::CartError);

        let invalid = ApiError::from(CoreError::Validation(ValidationError::Required {
            field: "seller".to_string(),
        }));
        assert_eq!(invalid.code, ErrorCode::ValidationError);
    }
}
