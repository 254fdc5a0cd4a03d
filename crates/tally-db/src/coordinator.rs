//! # Sale Coordinator
//!
//! Owns the transaction boundary for every operation that touches more than
//! one row: committing a sale, modifying it, voiding it.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  draft.validate()               ← no database access yet                │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │  INSERT sales (header)          ← first statement takes the write lock  │
//! │       │                                                                 │
//! │  for each merged line:                                                  │
//! │       ├── SELECT product        → ProductNotFound                       │
//! │       ├── UPDATE stock WHERE quantity_on_hand >= qty                    │
//! │       │                         → InsufficientStock                     │
//! │       ├── checked line total    → OutOfRange on i64 overflow            │
//! │       └── INSERT sale_lines                                             │
//! │       │                                                                 │
//! │  UPDATE sales SET total_cents                                           │
//! │       │                                                                 │
//! │  COMMIT ─── or ─── ROLLBACK (no header, no lines, no stock change)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transaction opens with a write so two registers never both read a
//! snapshot and then race to upgrade their locks.

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{debug, error, info, warn};

use crate::error::{DbError, SaleResult};
use crate::pool::Database;
use crate::repository::{product, sale};
use tally_core::{
    Cart, CartLine, CoreError, LineRequest, Money, PaymentMethod, Product, ProductLookup,
    SaleDraft, SaleModification, SaleRow, SaleStatus, ValidationError,
};

/// Runs sale operations as single database transactions.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    db: Database,
}

impl SaleCoordinator {
    pub fn new(db: Database) -> Self {
        SaleCoordinator { db }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Finds a product by code or by exact name.
    pub async fn resolve_product(&self, lookup: &ProductLookup) -> SaleResult<Product> {
        match lookup {
            ProductLookup::Code(code) => self
                .db
                .products()
                .get_by_code(code)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(code.clone()).into()),
            ProductLookup::Name(name) => self
                .db
                .products()
                .get_by_name(name)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(name.clone()).into()),
        }
    }

    /// Resolves the requested product and adds it to the cart.
    ///
    /// The stock check here is advisory: it uses the quantity on hand at
    /// lookup time. The binding check happens again inside `commit_sale`.
    pub async fn add_to_cart(&self, cart: &mut Cart, request: &LineRequest) -> SaleResult<()> {
        let product = self.resolve_product(&request.product).await?;
        cart.add_product(&product, request.quantity, request.discount)?;

        debug!(
            code = %product.code,
            quantity = request.quantity,
            lines = cart.line_count(),
            "Added to cart"
        );
        Ok(())
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Persists a sale and decrements stock for every line, atomically.
    ///
    /// ## Returns
    /// The new sale ID. On any error nothing is persisted.
    pub async fn commit_sale(&self, draft: &SaleDraft) -> SaleResult<i64> {
        let payment_method = draft.validate()?;
        let lines = draft.merged_lines();

        let mut tx = self.begin().await?;
        let outcome = commit_in_tx(&mut tx, draft, &lines, payment_method).await;
        let (sale_id, total) = finish(tx, outcome, "commit_sale").await?;

        info!(
            sale_id,
            lines = lines.len(),
            total_cents = total.cents(),
            seller = %draft.metadata.seller,
            "Sale committed"
        );
        Ok(sale_id)
    }

    // =========================================================================
    // Modify
    // =========================================================================

    /// Replaces the single line and header fields of a completed sale.
    ///
    /// Stock for the previous line is restored to the previous product, then
    /// the new quantity is taken from the new product. Re-submitting the same
    /// modification leaves stock where it was.
    pub async fn modify_sale(
        &self,
        sale_id: i64,
        modification: &SaleModification,
    ) -> SaleResult<()> {
        let payment_method = modification.validate()?;

        let mut tx = self.begin().await?;
        let outcome = modify_in_tx(&mut tx, sale_id, modification, payment_method).await;
        finish(tx, outcome, "modify_sale").await?;

        info!(
            sale_id,
            product_code = %modification.line.product_code,
            quantity = modification.line.quantity,
            "Sale modified"
        );
        Ok(())
    }

    // =========================================================================
    // Void
    // =========================================================================

    /// Marks a completed sale as voided and puts its stock back.
    pub async fn void_sale(&self, sale_id: i64) -> SaleResult<()> {
        let mut tx = self.begin().await?;
        let outcome = void_in_tx(&mut tx, sale_id).await;
        let restored = finish(tx, outcome, "void_sale").await?;

        info!(sale_id, restored_lines = restored, "Sale voided");
        Ok(())
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Every sale line with its header, ordered by sale then line.
    pub async fn list_sales(&self) -> SaleResult<Vec<SaleRow>> {
        Ok(self.db.sales().list_rows().await?)
    }

    async fn begin(&self) -> SaleResult<Transaction<'static, Sqlite>> {
        self.db
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(format!("Failed to start transaction: {e}")).into())
    }
}

// =============================================================================
// Transaction bodies
// =============================================================================

async fn commit_in_tx(
    conn: &mut SqliteConnection,
    draft: &SaleDraft,
    lines: &[CartLine],
    payment_method: PaymentMethod,
) -> SaleResult<(i64, Money)> {
    let sale_id = sale::insert_header(conn, &draft.metadata, payment_method, 0).await?;
    let mut total = Money::zero();

    for line in lines {
        let current = product::fetch_by_code(&mut *conn, &line.product_code)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_code.clone()))?;

        // stock first: an impossible quantity is InsufficientStock, not an overflow
        product::decrement_stock(conn, &line.product_code, line.quantity).await?;

        let line_total = line.line_total()?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| ValidationError::amount_overflow("sale total"))?;
        sale::insert_line(conn, sale_id, &current.name, line, line_total.cents()).await?;
    }

    sale::set_total(conn, sale_id, total.cents()).await?;
    Ok((sale_id, total))
}

async fn modify_in_tx(
    conn: &mut SqliteConnection,
    sale_id: i64,
    modification: &SaleModification,
    payment_method: PaymentMethod,
) -> SaleResult<()> {
    if !sale::claim_sale(conn, sale_id).await? {
        return Err(CoreError::SaleNotFound(sale_id).into());
    }

    let header = sale::fetch_header(&mut *conn, sale_id)
        .await?
        .ok_or(CoreError::SaleNotFound(sale_id))?;
    if header.status != SaleStatus::Completed {
        return Err(CoreError::InvalidSaleStatus {
            sale_id,
            current_status: header.status.to_string(),
        }
        .into());
    }

    let lines = sale::fetch_lines(&mut *conn, sale_id).await?;
    let previous = match lines.as_slice() {
        [only] => only,
        _ => {
            return Err(CoreError::MultiLineSale {
                sale_id,
                line_count: lines.len(),
            }
            .into())
        }
    };

    product::increment_stock(conn, &previous.product_code, previous.quantity).await?;

    let target = product::fetch_by_code(&mut *conn, &modification.line.product_code)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(modification.line.product_code.clone()))?;
    let line = modification.resolve_line(&target);

    product::decrement_stock(conn, &line.product_code, line.quantity).await?;

    let line_total = line.line_total()?.cents();
    sale::replace_line(conn, previous.id, &line, line_total).await?;
    sale::update_header(
        conn,
        sale_id,
        &modification.metadata,
        payment_method,
        line_total,
    )
    .await?;

    debug!(
        sale_id,
        from = %previous.product_code,
        to = %line.product_code,
        "Replaced sale line"
    );
    Ok(())
}

async fn void_in_tx(conn: &mut SqliteConnection, sale_id: i64) -> SaleResult<usize> {
    if !sale::mark_voided(conn, sale_id).await? {
        return match sale::fetch_header(&mut *conn, sale_id).await? {
            None => Err(CoreError::SaleNotFound(sale_id).into()),
            Some(header) => Err(CoreError::InvalidSaleStatus {
                sale_id,
                current_status: header.status.to_string(),
            }
            .into()),
        };
    }

    let lines = sale::fetch_lines(&mut *conn, sale_id).await?;
    for line in &lines {
        product::increment_stock(conn, &line.product_code, line.quantity).await?;
    }

    Ok(lines.len())
}

/// Commits on success, rolls back on failure. Returns the body's outcome.
async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    outcome: SaleResult<T>,
    operation: &'static str,
) -> SaleResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(|e| {
                DbError::TransactionFailed(format!("Failed to commit {operation}: {e}"))
            })?;
            Ok(value)
        }
        Err(err) => {
            warn!(operation, error = %err, "Rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                error!(operation, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
