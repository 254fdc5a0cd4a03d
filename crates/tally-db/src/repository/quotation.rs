//! # Quotation Sequencer
//!
//! Issues quotation numbers from the singleton `quotation_counter` row.
//!
//! ## Issuing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  loop (bounded)                                                         │
//! │    last  = SELECT last_issued FROM quotation_counter WHERE id = 1       │
//! │    next  = last.next_for(clock.today())                                 │
//! │    UPDATE quotation_counter SET last_issued = next                      │
//! │     WHERE id = 1 AND last_issued = last      ← compare-and-swap         │
//! │    1 row  → return next                                                 │
//! │    0 rows → another register won the race; read again                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `peek_next` runs the same computation without the UPDATE, so the number
//! it shows may be taken by someone else before it is issued.

use chrono::Utc;
use sqlx::SqlitePool;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{DbError, SaleResult};
use tally_core::{Clock, QuotationNumber};

/// Attempts before `issue` gives up under contention.
const MAX_ISSUE_ATTEMPTS: u32 = 32;

/// Hands out unique, increasing quotation numbers.
#[derive(Clone)]
pub struct QuotationSequencer {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for QuotationSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotationSequencer")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl QuotationSequencer {
    /// Creates a sequencer dated by `clock`.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        QuotationSequencer { pool, clock }
    }

    /// The most recently issued number.
    pub async fn last_issued(&self) -> SaleResult<QuotationNumber> {
        let (_, parsed) = self.read_last().await?;
        Ok(parsed)
    }

    /// The number `issue` would return right now. Does not reserve it.
    pub async fn peek_next(&self) -> SaleResult<QuotationNumber> {
        let last = self.last_issued().await?;
        Ok(last.next_for(self.clock.today())?)
    }

    /// Reserves and returns the next quotation number.
    ///
    /// ## Errors
    /// * `CoreError::QuotationSequenceExhausted` - today's 999 is used
    /// * `DbError::TransactionFailed` - lost the race too many times
    pub async fn issue(&self) -> SaleResult<QuotationNumber> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let (stored, last) = self.read_last().await?;
            let next = last.next_for(self.clock.today())?;
            let rendered = next.to_string();

            let result = sqlx::query(
                r#"
                UPDATE quotation_counter
                SET last_issued = ?1, updated_at = ?2
                WHERE id = 1 AND last_issued = ?3
                "#,
            )
            .bind(&rendered)
            .bind(Utc::now())
            .bind(&stored)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 1 {
                info!(quotation = %rendered, attempt, "Issued quotation number");
                return Ok(next);
            }

            debug!(attempt, last = %stored, "Quotation counter moved, retrying");
        }

        warn!(attempts = MAX_ISSUE_ATTEMPTS, "Gave up issuing quotation number");
        Err(DbError::TransactionFailed(format!(
            "quotation counter still contended after {MAX_ISSUE_ATTEMPTS} attempts"
        ))
        .into())
    }

    /// Returns the stored text alongside its parse; the CAS compares text.
    async fn read_last(&self) -> SaleResult<(String, QuotationNumber)> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT last_issued FROM quotation_counter WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        let stored = stored.ok_or_else(|| DbError::not_found("QuotationCounter", "1"))?;
        let parsed: QuotationNumber = stored.parse()?;
        Ok((stored, parsed))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
