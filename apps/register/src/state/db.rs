//! # Database State
//!
//! Wraps the `Database` connection for use in register commands.

use tally_db::{Database, SaleCoordinator};

/// Wrapper around `Database` handed to every command.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// Shorthand for the sale coordinator.
    pub fn coordinator(&self) -> SaleCoordinator {
        self.db.coordinator()
    }
}
