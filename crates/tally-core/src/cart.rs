//! # Cart Module
//!
//! Assembles the lines of a sale before it is committed.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  LineRequest { Code("P1") | Name("Widget"), qty, discount }            │
//! │       │                                                                 │
//! │       ▼  (tally-db resolves the product)                                │
//! │  Cart::add_product(&product, qty, discount)                            │
//! │       ├── qty > 0, discount in [0, 100]                                │
//! │       ├── same code already in cart? → quantities merge                │
//! │       └── merged qty <= product.quantity_on_hand (snapshot)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Cart::into_draft(metadata) → SaleDraft                                │
//! │       │                                                                 │
//! │       ▼  (tally-db)                                                     │
//! │  SaleCoordinator::commit_sale(&draft)                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The snapshot check is advisory. Another register can sell the same units
//! between `add_product` and commit; the atomic decrement at commit decides.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{DiscountRate, PaymentMethod, Product, SaleMetadata};
use crate::validation::{
    validate_cart_size, validate_code, validate_discount, validate_metadata, validate_price_cents,
    validate_product_name, validate_quantity,
};
use crate::MAX_CART_LINES;

// =============================================================================
// Requests
// =============================================================================

/// How the cashier identified the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductLookup {
    Code(String),
    Name(String),
}

impl ProductLookup {
    /// Picks the code when one was typed, otherwise the name.
    ///
    /// ```rust
    /// use tally_core::cart::ProductLookup;
    ///
    /// let lookup = ProductLookup::from_form(Some(" "), Some("Widget")).unwrap();
    /// assert_eq!(lookup, ProductLookup::Name("Widget".to_string()));
    /// ```
    pub fn from_form(code: Option<&str>, name: Option<&str>) -> Result<Self, ValidationError> {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        match (code, name) {
            (Some(code), _) => Ok(ProductLookup::Code(code.to_string())),
            (None, Some(name)) => Ok(ProductLookup::Name(name.to_string())),
            (None, None) => Err(ValidationError::Required {
                field: "product code or name".to_string(),
            }),
        }
    }
}

/// One line the cashier wants to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product: ProductLookup,
    pub quantity: i64,
    #[serde(default)]
    pub discount: DiscountRate,
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// Name and price are frozen when the product is added; the committed
/// `LineItem` carries exactly these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub discount: DiscountRate,
    /// Stock seen when the line was last touched.
    pub available_snapshot: i64,
}

impl CartLine {
    pub fn from_product(product: &Product, quantity: i64, discount: DiscountRate) -> Self {
        CartLine {
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price_cents: product.unit_price_cents,
            discount,
            available_snapshot: product.quantity_on_hand,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// `unit_price × quantity`, less the discount.
    ///
    /// Fails with `OutOfRange` when the gross amount overflows `i64`.
    pub fn line_total(&self) -> Result<Money, ValidationError> {
        let gross = self
            .unit_price()
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| ValidationError::amount_overflow("line total"))?;
        Ok(gross.apply_discount(self.discount))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_code(&self.product_code)?;
        validate_quantity(self.quantity)?;
        validate_price_cents(self.unit_price_cents)?;
        validate_discount(self.discount)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_code` (adding the same code merges quantity)
/// - Every quantity is > 0
/// - At most `MAX_CART_LINES` distinct lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product, merging into an existing line with the same code.
    ///
    /// A merged line keeps the price and discount of the first addition.
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: i64,
        discount: DiscountRate,
    ) -> CoreResult<()> {
        validate_quantity(quantity)?;
        validate_discount(discount)?;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_code == product.code)
        {
            // saturates: a quantity that large can never be in stock
            let merged = line.quantity.saturating_add(quantity);
            if !product.can_sell(merged) {
                return Err(CoreError::InsufficientStock {
                    code: product.code.clone(),
                    available: product.quantity_on_hand,
                    requested: merged,
                });
            }
            line.quantity = merged;
            line.available_snapshot = product.quantity_on_hand;
            return Ok(());
        }

        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        })?;

        if !product.can_sell(quantity) {
            return Err(CoreError::InsufficientStock {
                code: product.code.clone(),
                available: product.quantity_on_hand,
                requested: quantity,
            });
        }

        self.lines
            .push(CartLine::from_product(product, quantity, discount));
        Ok(())
    }

    /// Removes the line for a product code. Returns whether one was removed.
    pub fn remove_line(&mut self, product_code: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_code != product_code);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.quantity))
    }

    pub fn total(&self) -> CoreResult<Money> {
        sum_line_totals(&self.lines)
    }

    /// Attaches buyer/seller metadata, producing something committable.
    pub fn into_draft(self, metadata: SaleMetadata) -> SaleDraft {
        SaleDraft {
            metadata,
            lines: self.lines,
        }
    }
}

// =============================================================================
// Sale Draft
// =============================================================================

/// A sale ready to be handed to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub metadata: SaleMetadata,
    pub lines: Vec<CartLine>,
}

impl SaleDraft {
    pub fn new(metadata: SaleMetadata, lines: Vec<CartLine>) -> Self {
        SaleDraft { metadata, lines }
    }

    /// Lines with duplicate codes folded together, in first-seen order.
    pub fn merged_lines(&self) -> Vec<CartLine> {
        let mut merged: Vec<CartLine> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match merged
                .iter_mut()
                .find(|m| m.product_code == line.product_code)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => merged.push(line.clone()),
            }
        }
        merged
    }

    /// Header total: the sum of merged line totals.
    pub fn total(&self) -> CoreResult<Money> {
        sum_line_totals(&self.merged_lines())
    }

    /// Checks everything that can be checked without the database.
    pub fn validate(&self) -> CoreResult<PaymentMethod> {
        let payment_method = validate_metadata(&self.metadata)?;

        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        for line in &self.lines {
            line.validate()?;
        }
        if self.merged_lines().len() > MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        Ok(payment_method)
    }
}

// =============================================================================
// Sale Modification
// =============================================================================

/// Replacement for the single line of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    pub product_code: String,
    pub quantity: i64,
    /// `None` keeps the product's current price.
    pub unit_price_cents: Option<i64>,
    #[serde(default)]
    pub discount: DiscountRate,
}

/// New header fields plus the new line for an existing sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleModification {
    pub metadata: SaleMetadata,
    pub line: LineChange,
}

impl SaleModification {
    pub fn validate(&self) -> CoreResult<PaymentMethod> {
        let payment_method = validate_metadata(&self.metadata)?;

        validate_code(&self.line.product_code)?;
        validate_quantity(self.line.quantity)?;
        if let Some(price) = self.line.unit_price_cents {
            validate_price_cents(price)?;
        }
        validate_discount(self.line.discount)?;

        Ok(payment_method)
    }

    /// Builds the replacement cart line against the current product row.
    pub fn resolve_line(&self, product: &Product) -> CartLine {
        CartLine {
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            quantity: self.line.quantity,
            unit_price_cents: self
                .line
                .unit_price_cents
                .unwrap_or(product.unit_price_cents),
            discount: self.line.discount,
            available_snapshot: product.quantity_on_hand,
        }
    }
}

/// Sums line totals with overflow checks.
pub fn sum_line_totals(lines: &[CartLine]) -> CoreResult<Money> {
    let mut total = Money::zero();
    for line in lines {
        total = total
            .checked_add(line.line_total()?)
            .ok_or_else(|| ValidationError::amount_overflow("sale total"))?;
    }
    Ok(total)
}

/// Validates a product record before it is written.
pub fn validate_product(product: &Product) -> CoreResult<()> {
    validate_code(&product.code)?;
    validate_product_name(&product.name)?;
    validate_price_cents(product.unit_price_cents)?;
    if product.quantity_on_hand < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity on hand".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
