//! # State Module
//!
//! What every register command may need, built once per invocation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐          ┌──────────────────┐                         │
//! │  │   DbState    │          │   ConfigState    │                         │
//! │  │              │          │                  │                         │
//! │  │  Database    │          │  db_path         │                         │
//! │  │  (SQLite     │          │  seller          │                         │
//! │  │   pool)      │          │  store_name      │                         │
//! │  │              │          │  currency_symbol │                         │
//! │  └──────────────┘          └──────────────────┘                         │
//! │                                                                         │
//! │  DbState: Database has an internal connection pool (thread-safe)       │
//! │  ConfigState: read-only after startup                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;

pub use config::ConfigState;
pub use db::DbState;
