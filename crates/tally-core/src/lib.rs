//! # tally-core: Pure Business Logic for Tally POS
//!
//! Everything a sale needs to be *correct* before it touches the database:
//! money math, buyer rules, cart assembly, quotation numbering.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/register (terminal front end)              │   │
//! │  │      products ──► sale commit ──► sale modify ──► quote         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tally-db (repositories + SaleCoordinator)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │validation│ │quotation│ │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │  buyer   │ │ YYYYMMDD│ │   │
//! │  │   │ SaleRow │ │Discount │ │SaleDraft│ │  rules   │ │  -NNN   │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Buyer, SaleHeader, LineItem, SaleRow)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart assembly, merging and feasibility against a stock snapshot
//! - [`quotation`] - Quotation number parsing and sequencing
//! - [`clock`] - Date source used for quotation prefixes
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::types::DiscountRate;
//!
//! let unit_price = Money::from_cents(1000); // $10.00
//! let line = unit_price
//!     .checked_multiply_quantity(4)
//!     .unwrap()
//!     .apply_discount(DiscountRate::from_percent(10));
//!
//! assert_eq!(line.cents(), 3600);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod clock;
pub mod error;
pub mod money;
pub mod quotation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{
    Cart, CartLine, LineChange, LineRequest, ProductLookup, SaleDraft, SaleModification,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quotation::QuotationNumber;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct product lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Highest quotation suffix that still fits the three-digit `NNN` slot.
pub const MAX_QUOTATION_SEQUENCE: u16 = 999;

/// Value the quotation counter holds before anything has been issued.
pub const INITIAL_QUOTATION_NUMBER: &str = "20241212-000";
