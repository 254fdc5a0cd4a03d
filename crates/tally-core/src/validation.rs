//! # Validation Module
//!
//! Input validation for products, cart lines and sale metadata.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: register app                                                 │
//! │  └── JSON deserialization (types, required keys)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Buyer rules (phone / email patterns, required fields)             │
//! │  └── Quantity, price, discount ranges                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (quantity_on_hand >= 0)                                     │
//! │  └── NOT NULL / PRIMARY KEY constraints                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check here runs before a transaction is opened, so a failure leaves
//! no trace in the database.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::types::{Buyer, DiscountRate, PaymentMethod, SaleMetadata};
use crate::MAX_CART_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{7,10}$").expect("phone pattern compiles"));

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
});

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use tally_core::validation::validate_code;
///
/// assert!(validate_code("P1").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("has space").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested quantity (must be > 0).
///
/// ## User Workflow
/// ```text
/// Cashier enters quantity: 5
///      │
///      ▼
/// validate_quantity(5) ← THIS FUNCTION
///      │
///      ├── qty <= 0? → Error: "quantity must be positive"
///      │
///      └── OK → stock snapshot check in Cart::add_product
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock amount passed to an increment or decrement.
pub fn validate_stock_amount(amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed.
///
/// ```rust
/// use tally_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount, which must lie in [0, 100] percent.
pub fn validate_discount(discount: DiscountRate) -> ValidationResult<()> {
    if discount.bps() > DiscountRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding another distinct line.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Buyer Validators
// =============================================================================

/// Validates a phone number: 7 to 10 digits, nothing else.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if !PHONE_PATTERN.is_match(phone.trim()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be 7 to 10 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ```rust
/// use tally_core::validation::validate_email;
///
/// assert!(validate_email("ana@example.com").is_ok());
/// assert!(validate_email("ana@example").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    if !EMAIL_PATTERN.is_match(email.trim()) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(())
}

fn require(value: &str, field: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validates buyer details.
///
/// ## Rules
/// - name, national id, tax id and address are required
/// - at least one of phone or email
/// - whichever of phone / email is given must match its pattern
pub fn validate_buyer(buyer: &Buyer) -> ValidationResult<()> {
    require(&buyer.name, "buyer name")?;
    require(&buyer.national_id, "buyer national id")?;

    let phone = present(&buyer.phone);
    let email = present(&buyer.email);

    if phone.is_none() && email.is_none() {
        return Err(ValidationError::required("buyer phone or email"));
    }
    if let Some(phone) = phone {
        validate_phone(phone)?;
    }
    if let Some(email) = email {
        validate_email(email)?;
    }

    require(&buyer.tax_id, "buyer tax id")?;
    require(&buyer.address, "buyer address")?;

    Ok(())
}

/// Validates sale metadata and returns the selected payment method.
pub fn validate_metadata(metadata: &SaleMetadata) -> ValidationResult<PaymentMethod> {
    validate_buyer(&metadata.buyer)?;
    require(&metadata.seller, "seller")?;

    metadata
        .payment_method
        .ok_or_else(|| ValidationError::required("payment method"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn buyer() -> Buyer {
        Buyer {
            name: "Ana Gomez".to_string(),
            national_id: "1032456789".to_string(),
            phone: Some("3001234567".to_string()),
            email: None,
            tax_id: "900123456".to_string(),
            address: "Calle 10 # 4-21".to_string(),
        }
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("P1").is_ok());
        assert!(validate_code("BEV-COC-001").is_ok());
        assert!(validate_code("   ").is_err());
        assert!(validate_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(5000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_discount_bounds() {
        assert!(validate_discount(DiscountRate::zero()).is_ok());
        assert!(validate_discount(DiscountRate::from_percent(100)).is_ok());
        assert_eq!(
            validate_discount(DiscountRate::from_percent(101)),
            Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: 100
            })
        );
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("1234567").is_ok());
        assert!(validate_phone("3001234567").is_ok());
        assert!(validate_phone("123456").is_err());
        assert!(validate_phone("30012345678").is_err());
        assert!(validate_phone("300-123-45").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a.b+c@shop.co").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("x@y.z").is_err());
    }

    #[test]
    fn test_buyer_needs_phone_or_email() {
        assert!(validate_buyer(&buyer()).is_ok());

        let mut email_only = buyer();
        email_only.phone = None;
        email_only.email = Some("ana@example.com".to_string());
        assert!(validate_buyer(&email_only).is_ok());

        let mut neither = buyer();
        neither.phone = Some("  ".to_string());
        assert_eq!(
            validate_buyer(&neither),
            Err(ValidationError::required("buyer phone or email"))
        );
    }

    #[test]
    fn test_buyer_required_fields() {
        let mut missing_tax = buyer();
        missing_tax.tax_id.clear();
        assert_eq!(
            validate_buyer(&missing_tax),
            Err(ValidationError::required("buyer tax id"))
        );

        let mut bad_phone = buyer();
        bad_phone.phone = Some("12ab".to_string());
        assert!(matches!(
            validate_buyer(&bad_phone),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_metadata_requires_payment_method() {
        let mut metadata = SaleMetadata {
            buyer: buyer(),
            seller: "maria".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 12).unwrap(),
            payment_method: None,
        };
        assert_eq!(
            validate_metadata(&metadata),
            Err(ValidationError::required("payment method"))
        );

        metadata.payment_method = Some(PaymentMethod::Credit);
        assert_eq!(validate_metadata(&metadata), Ok(PaymentMethod::Credit));

        metadata.seller = String::new();
        assert_eq!(
            validate_metadata(&metadata),
            Err(ValidationError::required("seller"))
        );
    }
}
