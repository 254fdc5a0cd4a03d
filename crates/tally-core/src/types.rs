//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SaleHeader    │   │    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code (PK)      │   │  id (integer)   │   │  sale_id (FK)   │       │
//! │  │  name           │   │  buyer fields   │   │  product_code   │       │
//! │  │  unit_price     │   │  seller, date   │   │  quantity       │       │
//! │  │  quantity       │   │  total_cents    │   │  line_total     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountRate   │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  bps (u32)      │   │  Completed      │   │  Cash           │       │
//! │  │  1000 = 10%     │   │  Voided         │   │  Credit         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products are identified by their business `code`; sales by a store-generated
//! integer id. Line items freeze the product name and price seen at commit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Percentage discount represented in basis points.
///
/// 1 basis point = 0.01%, so 10000 bps = 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Basis points for a 100% discount.
    pub const MAX_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a discount from a whole percentage (10 → 10%).
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        DiscountRate(percent.saturating_mul(100))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Business identifier, unique.
    pub code: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Price in cents.
    pub unit_price_cents: i64,

    /// Units in stock. Never negative.
    pub quantity_on_hand: i64,

    pub category: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product stamped with the current time.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        unit_price_cents: i64,
        quantity_on_hand: i64,
    ) -> Self {
        let now = Utc::now();
        Product {
            code: code.into(),
            name: name.into(),
            unit_price_cents,
            quantity_on_hand,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Checks the snapshot stock against a requested quantity.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity_on_hand >= quantity
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a committed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is committed and its stock is consumed.
    #[default]
    Completed,
    /// Sale was reversed; its stock has been returned.
    Voided,
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Completed => write!(f, "completed"),
            SaleStatus::Voided => write!(f, "voided"),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid in cash at the counter.
    Cash,
    /// Paid on store credit.
    Credit,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Credit => write!(f, "credit"),
        }
    }
}

// =============================================================================
// Buyer & Sale Metadata
// =============================================================================

/// Who the sale is for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub name: String,
    /// National identity document number.
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Tax registration number.
    pub tax_id: String,
    pub address: String,
}

/// Everything a sale header carries besides its lines.
///
/// The seller is an explicit field; nothing in the core reads a logged-in
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleMetadata {
    pub buyer: Buyer,
    pub seller: String,
    pub date: NaiveDate,
    /// `None` until the cashier picks one; committing without it fails.
    pub payment_method: Option<PaymentMethod>,
}

// =============================================================================
// Sale Header & Line Item
// =============================================================================

/// A persisted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleHeader {
    pub id: i64,
    pub buyer_name: String,
    pub buyer_national_id: String,
    pub buyer_phone: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_tax_id: String,
    pub buyer_address: String,
    pub seller: String,
    pub sale_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    /// Sum of the sale's line totals.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SaleHeader {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a persisted sale.
/// Product name and unit price are frozen at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    /// `unit_price × quantity`, less the discount.
    pub line_total_cents: i64,
}

impl LineItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Sale Row (read model)
// =============================================================================

/// One line of the sales listing, flattened with its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRow {
    pub sale_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub product_code: String,
    pub unit_price_cents: i64,
    pub buyer_name: String,
    pub buyer_national_id: String,
    pub seller: String,
    pub sale_date: NaiveDate,
    pub line_total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
}

impl SaleRow {
    /// Sale date as shown in the listing (`dd/mm/yyyy`).
    pub fn display_date(&self) -> String {
        self.sale_date.format("%d/%m/%Y").to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_rate_from_percent() {
        let rate = DiscountRate::from_percent(15);
        assert_eq!(rate.bps(), 1500);
        assert!((rate.percent() - 15.0).abs() < f64::EPSILON);
        assert!(DiscountRate::default().is_zero());
    }

    #[test]
    fn test_product_can_sell() {
        let product = Product::new("P1", "Widget", 1000, 3);
        assert!(product.can_sell(3));
        assert!(!product.can_sell(4));
        assert_eq!(product.unit_price().cents(), 1000);
    }

    #[test]
    fn test_enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Credit).unwrap(),
            "\"credit\""
        );
        assert_eq!(
            serde_json::from_str::<SaleStatus>("\"voided\"").unwrap(),
            SaleStatus::Voided
        );
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
    }

    #[test]
    fn test_sale_row_display_date() {
        let row = SaleRow {
            sale_id: 1,
            product_name: "Widget".to_string(),
            quantity: 4,
            product_code: "P1".to_string(),
            unit_price_cents: 1000,
            buyer_name: "Ana".to_string(),
            buyer_national_id: "123".to_string(),
            seller: "maria".to_string(),
            sale_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            line_total_cents: 4000,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
        };
        assert_eq!(row.display_date(), "09/03/2024");
    }
}
