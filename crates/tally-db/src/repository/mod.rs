//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Repository methods               Executor-level functions             │
//! │  (own a SqlitePool)               (take a connection, pub(crate))      │
//! │  ──────────────────               ────────────────────────────────     │
//! │  db.products().get_by_code()  ──► product::fetch_by_code(executor)     │
//! │  db.products().try_decrement()──► product::decrement_stock(conn)       │
//! │  db.sales().get_lines()       ──► sale::fetch_lines(executor)          │
//! │                                          ▲                              │
//! │                                          │ same SQL, inside a tx        │
//! │                                   SaleCoordinator                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Inventory lookup and stock deltas
//! - [`SaleRepository`](sale::SaleRepository) - Sale ledger reads
//! - [`QuotationSequencer`](quotation::QuotationSequencer) - Quotation numbers

pub mod product;
pub mod quotation;
pub mod sale;
