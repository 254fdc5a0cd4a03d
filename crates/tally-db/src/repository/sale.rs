//! # Sale Repository
//!
//! Database operations for sale headers and their lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. COMMIT (one transaction, see SaleCoordinator)                       │
//! │     └── insert_header() → id from AUTOINCREMENT                         │
//! │     └── decrement_stock() + insert_line() per merged cart line          │
//! │     └── set_total() once every line is in                               │
//! │                                                                         │
//! │  2. (OPTIONAL) MODIFY                                                  │
//! │     └── claim_sale() → write lock held before anything is read         │
//! │     └── replace_line() + update_header()                               │
//! │                                                                         │
//! │  3. (OPTIONAL) VOID                                                    │
//! │     └── mark_voided() → status Completed → Voided, stock restored      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes only happen inside a coordinator transaction, so they are exposed
//! as `pub(crate)` functions over a connection. The repository itself is the
//! read side.

use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{CartLine, LineItem, PaymentMethod, SaleHeader, SaleMetadata, SaleRow};

/// Repository for reading the sale ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<SaleHeader>> {
        fetch_header(&self.pool, id).await
    }

    /// Gets all lines for a sale, in insertion order.
    pub async fn get_lines(&self, sale_id: i64) -> DbResult<Vec<LineItem>> {
        fetch_lines(&self.pool, sale_id).await
    }

    /// Lists every sale line joined with its header.
    ///
    /// One row per line, ordered by sale then line. Voided sales are included
    /// with their status so the listing can mark them.
    pub async fn list_rows(&self) -> DbResult<Vec<SaleRow>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT
                s.id AS sale_id,
                l.product_name,
                l.quantity,
                l.product_code,
                l.unit_price_cents,
                s.buyer_name,
                s.buyer_national_id,
                s.seller,
                s.sale_date,
                l.line_total_cents,
                s.payment_method,
                s.status
            FROM sales s
            INNER JOIN sale_lines l ON l.sale_id = s.id
            ORDER BY s.id, l.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed sale rows");
        Ok(rows)
    }

    /// Counts sale headers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Executor-level reads
// =============================================================================

pub(crate) async fn fetch_header<'e, E>(executor: E, id: i64) -> DbResult<Option<SaleHeader>>
where
    E: SqliteExecutor<'e>,
{
    let header = sqlx::query_as::<_, SaleHeader>(
        r#"
        SELECT
            id,
            buyer_name,
            buyer_national_id,
            buyer_phone,
            buyer_email,
            buyer_tax_id,
            buyer_address,
            seller,
            sale_date,
            payment_method,
            status,
            total_cents,
            created_at,
            updated_at
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(header)
}

pub(crate) async fn fetch_lines<'e, E>(executor: E, sale_id: i64) -> DbResult<Vec<LineItem>>
where
    E: SqliteExecutor<'e>,
{
    let lines = sqlx::query_as::<_, LineItem>(
        r#"
        SELECT
            id,
            sale_id,
            product_code,
            product_name,
            quantity,
            unit_price_cents,
            discount_bps,
            line_total_cents
        FROM sale_lines
        WHERE sale_id = ?1
        ORDER BY id
        "#,
    )
    .bind(sale_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

// =============================================================================
// Transactional writes (coordinator only)
// =============================================================================

/// Inserts a completed sale header and returns its new ID.
pub(crate) async fn insert_header(
    conn: &mut SqliteConnection,
    metadata: &SaleMetadata,
    payment_method: PaymentMethod,
    total_cents: i64,
) -> DbResult<i64> {
    let now = Utc::now();
    let buyer = &metadata.buyer;

    let result = sqlx::query(
        r#"
        INSERT INTO sales (
            buyer_name, buyer_national_id, buyer_phone, buyer_email,
            buyer_tax_id, buyer_address, seller, sale_date,
            payment_method, status, total_cents, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, 'completed', ?10, ?11, ?11
        )
        "#,
    )
    .bind(buyer.name.trim())
    .bind(buyer.national_id.trim())
    .bind(blank_to_none(&buyer.phone))
    .bind(blank_to_none(&buyer.email))
    .bind(buyer.tax_id.trim())
    .bind(buyer.address.trim())
    .bind(metadata.seller.trim())
    .bind(metadata.date)
    .bind(payment_method)
    .bind(total_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    debug!(sale_id = id, total_cents, "Inserted sale header");
    Ok(id)
}

/// Inserts one line. `product_name` is the name frozen at commit time.
pub(crate) async fn insert_line(
    conn: &mut SqliteConnection,
    sale_id: i64,
    product_name: &str,
    line: &CartLine,
    line_total_cents: i64,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO sale_lines (
            sale_id, product_code, product_name,
            quantity, unit_price_cents, discount_bps, line_total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(sale_id)
    .bind(&line.product_code)
    .bind(product_name)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.discount.bps())
    .bind(line_total_cents)
    .execute(&mut *conn)
    .await?;

    debug!(sale_id, product_code = %line.product_code, "Inserted sale line");
    Ok(result.last_insert_rowid())
}

/// Touches the header so the transaction holds the write lock before it
/// reads anything. Returns `false` when the sale does not exist.
pub(crate) async fn claim_sale(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<bool> {
    let result = sqlx::query("UPDATE sales SET updated_at = ?2 WHERE id = ?1")
        .bind(sale_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Overwrites a line in place, keeping its ID.
pub(crate) async fn replace_line(
    conn: &mut SqliteConnection,
    line_id: i64,
    line: &CartLine,
    line_total_cents: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE sale_lines SET
            product_code = ?2,
            product_name = ?3,
            quantity = ?4,
            unit_price_cents = ?5,
            discount_bps = ?6,
            line_total_cents = ?7
        WHERE id = ?1
        "#,
    )
    .bind(line_id)
    .bind(&line.product_code)
    .bind(&line.product_name)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.discount.bps())
    .bind(line_total_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Stores the header total once every line has been written.
pub(crate) async fn set_total(
    conn: &mut SqliteConnection,
    sale_id: i64,
    total_cents: i64,
) -> DbResult<()> {
    sqlx::query("UPDATE sales SET total_cents = ?2 WHERE id = ?1")
        .bind(sale_id)
        .bind(total_cents)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Rewrites the header fields a modification may change.
pub(crate) async fn update_header(
    conn: &mut SqliteConnection,
    sale_id: i64,
    metadata: &SaleMetadata,
    payment_method: PaymentMethod,
    total_cents: i64,
) -> DbResult<()> {
    let buyer = &metadata.buyer;

    sqlx::query(
        r#"
        UPDATE sales SET
            buyer_name = ?2,
            buyer_national_id = ?3,
            buyer_phone = ?4,
            buyer_email = ?5,
            buyer_tax_id = ?6,
            buyer_address = ?7,
            seller = ?8,
            sale_date = ?9,
            payment_method = ?10,
            total_cents = ?11,
            updated_at = ?12
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .bind(buyer.name.trim())
    .bind(buyer.national_id.trim())
    .bind(blank_to_none(&buyer.phone))
    .bind(blank_to_none(&buyer.email))
    .bind(buyer.tax_id.trim())
    .bind(buyer.address.trim())
    .bind(metadata.seller.trim())
    .bind(metadata.date)
    .bind(payment_method)
    .bind(total_cents)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Completed → Voided. Returns `false` if the sale is missing or not
/// completed.
pub(crate) async fn mark_voided(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE sales SET
            status = 'voided',
            updated_at = ?2
        WHERE id = ?1 AND status = 'completed'
        "#,
    )
    .bind(sale_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================
