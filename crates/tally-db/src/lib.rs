//! # tally-db: Database Layer for Tally POS
//!
//! Persistence for the sales transaction engine: inventory, the sale ledger
//! and the quotation counter, all in one SQLite file accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  Register command (sale commit request.json)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐                                            │   │
//! │  │   │ SaleCoordinator│  owns BEGIN … COMMIT / ROLLBACK            │   │
//! │  │   └───────┬────────┘                                            │   │
//! │  │           ▼                                                     │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ ProductRepo   │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ SaleRepo      │    │ 001_init.sql │  │   │
//! │  │   │               │    │ Quotations    │    │ 002_quote.sql│  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and sale error types
//! - [`repository`] - Product, sale and quotation persistence
//! - [`coordinator`] - Multi-step sale transactions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//!
//! let sale_id = db.coordinator().commit_sale(&draft).await?;
//! let quote = db.quotations().issue().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coordinator;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use coordinator::SaleCoordinator;
pub use error::{DbError, DbResult, SaleError, SaleResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::quotation::QuotationSequencer;
pub use repository::sale::SaleRepository;
