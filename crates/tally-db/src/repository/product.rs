//! # Product Repository
//!
//! Inventory: product lookup and stock adjustments.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Check-and-decrement in ONE statement                 │
//! │                                                                         │
//! │  ❌ WRONG: read, compare, write (two registers both see 10, both sell 6)│
//! │     SELECT quantity_on_hand ...        → 10                             │
//! │     UPDATE ... SET quantity_on_hand = 4                                 │
//! │                                                                         │
//! │  ✅ CORRECT: conditional delta                                          │
//! │     UPDATE products                                                     │
//! │        SET quantity_on_hand = quantity_on_hand - 6                      │
//! │      WHERE code = 'P1' AND quantity_on_hand >= 6                        │
//! │     RETURNING quantity_on_hand                                          │
//! │                                                                         │
//! │  No row back → read the current quantity to report InsufficientStock   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `*_stock` functions take a bare connection so the sale coordinator can
//! run them inside its transaction; the repository methods run them on a
//! pooled connection in autocommit mode.

use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, SaleResult};
use tally_core::validation::{validate_search_query, validate_stock_amount};
use tally_core::{CoreError, Product};

/// Rows fetched for an ambiguity report; enough to show the cashier.
const NAME_MATCH_LIMIT: i64 = 10;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let widget = repo.get_by_code("P1").await?;
/// let remaining = repo.try_decrement("P1", 4).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        fetch_by_code(&self.pool, code).await
    }

    /// Gets a product by exact name, ignoring case.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - exactly one product has this name
    /// * `Ok(None)` - no product has this name
    /// * `Err(CoreError::AmbiguousProduct)` - several do; the cashier must
    ///   pick by code
    pub async fn get_by_name(&self, name: &str) -> SaleResult<Option<Product>> {
        fetch_by_name(&self.pool, name).await
    }

    /// Lists products whose name or code starts with `prefix`.
    ///
    /// An empty prefix lists the catalogue ordered by name.
    pub async fn search_by_name(&self, prefix: &str, limit: u32) -> SaleResult<Vec<Product>> {
        let prefix = validate_search_query(prefix)?;

        debug!(prefix = %prefix, limit = %limit, "Searching products");

        if prefix.is_empty() {
            return Ok(self.list(limit).await?);
        }

        let pattern = format!("{}%", escape_like(&prefix));

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT code, name, unit_price_cents, quantity_on_hand, category, created_at, updated_at
            FROM products
            WHERE name LIKE ?1 ESCAPE '\' OR code LIKE ?1 ESCAPE '\'
            ORDER BY name, code
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT code, name, unit_price_cents, quantity_on_hand, category, created_at, updated_at
            FROM products
            ORDER BY name, code
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                code, name, unit_price_cents, quantity_on_hand, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.unit_price_cents)
        .bind(product.quantity_on_hand)
        .bind(&product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.code),
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Updates name, price and category. Stock only moves through
    /// [`try_decrement`](Self::try_decrement) and [`increment`](Self::increment).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(code = %product.code, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                unit_price_cents = ?3,
                category = ?4,
                updated_at = ?5
            WHERE code = ?1
            "#,
        )
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.unit_price_cents)
        .bind(&product.category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.code));
        }

        Ok(())
    }

    /// Removes a product from the catalogue.
    ///
    /// Committed sale lines keep their frozen name and price.
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        debug!(code = %code, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", code));
        }

        Ok(())
    }

    /// Atomically removes `amount` units if at least that many are on hand.
    ///
    /// ## Returns
    /// * `Ok(remaining)` - new quantity on hand
    /// * `Err(CoreError::InsufficientStock)` - nothing changed
    /// * `Err(CoreError::ProductNotFound)` - unknown code
    pub async fn try_decrement(&self, code: &str, amount: i64) -> SaleResult<i64> {
        let mut conn = self.pool.acquire().await?;
        decrement_stock(&mut conn, code, amount).await
    }

    /// Adds `amount` units back to stock. Returns the new quantity on hand.
    pub async fn increment(&self, code: &str, amount: i64) -> SaleResult<i64> {
        let mut conn = self.pool.acquire().await?;
        increment_stock(&mut conn, code, amount).await
    }

    /// Counts products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Executor-level operations (shared with the sale coordinator)
// =============================================================================

pub(crate) async fn fetch_by_code<'e, E>(executor: E, code: &str) -> DbResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT code, name, unit_price_cents, quantity_on_hand, category, created_at, updated_at
        FROM products
        WHERE code = ?1
        "#,
    )
    .bind(code)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

pub(crate) async fn fetch_by_name<'e, E>(executor: E, name: &str) -> SaleResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let name = name.trim();

    let mut matches = sqlx::query_as::<_, Product>(
        r#"
        SELECT code, name, unit_price_cents, quantity_on_hand, category, created_at, updated_at
        FROM products
        WHERE name = ?1 COLLATE NOCASE
        ORDER BY code
        LIMIT ?2
        "#,
    )
    .bind(name)
    .bind(NAME_MATCH_LIMIT)
    .fetch_all(executor)
    .await?;

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => Err(CoreError::AmbiguousProduct {
            name: name.to_string(),
            candidates: matches.into_iter().map(|p| p.code).collect(),
        }
        .into()),
    }
}

/// Conditional decrement. See the module docs.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    code: &str,
    amount: i64,
) -> SaleResult<i64> {
    validate_stock_amount(amount)?;

    debug!(code = %code, amount = %amount, "Decrementing stock");

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET
            quantity_on_hand = quantity_on_hand - ?2,
            updated_at = ?3
        WHERE code = ?1 AND quantity_on_hand >= ?2
        RETURNING quantity_on_hand
        "#,
    )
    .bind(code)
    .bind(amount)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(remaining) = remaining {
        return Ok(remaining);
    }

    let available: Option<i64> =
        sqlx::query_scalar("SELECT quantity_on_hand FROM products WHERE code = ?1")
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;

    match available {
        None => Err(CoreError::ProductNotFound(code.to_string()).into()),
        Some(available) => {
            debug!(code = %code, available, requested = amount, "Stock check failed");
            Err(CoreError::InsufficientStock {
                code: code.to_string(),
                available,
                requested: amount,
            }
            .into())
        }
    }
}

pub(crate) async fn increment_stock(
    conn: &mut SqliteConnection,
    code: &str,
    amount: i64,
) -> SaleResult<i64> {
    validate_stock_amount(amount)?;

    debug!(code = %code, amount = %amount, "Incrementing stock");

    let quantity: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET
            quantity_on_hand = quantity_on_hand + ?2,
            updated_at = ?3
        WHERE code = ?1
        RETURNING quantity_on_hand
        "#,
    )
    .bind(code)
    .bind(amount)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    quantity.ok_or_else(|| CoreError::ProductNotFound(code.to_string()).into())
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================
