//! # Product Commands
//!
//! Catalogue lookup and product entry.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;
use tally_core::cart::validate_product;
use tally_core::Product;

/// Product as printed by the register.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub code: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity_on_hand: i64,
    pub category: Option<String>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            code: p.code,
            name: p.name,
            unit_price_cents: p.unit_price_cents,
            quantity_on_hand: p.quantity_on_hand,
            category: p.category,
        }
    }
}

/// Lists products whose name or code starts with `query`.
///
/// An empty query lists the catalogue.
pub async fn search_products(
    db: &DbState,
    query: &str,
    limit: Option<u32>,
) -> Result<Vec<ProductDto>, ApiError> {
    let start = Instant::now();
    let limit = limit.unwrap_or(20).min(100);

    debug!(query = %query, limit = %limit, "search_products command");

    let products = db.inner().products().search_by_name(query, limit).await?;
    let dtos: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = dtos.len(),
        "search_products complete"
    );

    Ok(dtos)
}

/// Adds a product to the catalogue.
pub async fn add_product(
    db: &DbState,
    code: &str,
    name: &str,
    unit_price_cents: i64,
    quantity_on_hand: i64,
) -> Result<ProductDto, ApiError> {
    let product = Product::new(code.trim(), name.trim(), unit_price_cents, quantity_on_hand);
    validate_product(&product)?;

    let product = db.inner().products().insert(&product).await?;
    info!(code = %product.code, "Product added");

    Ok(ProductDto::from(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_db::{Database, DbConfig};

    async fn state() -> DbState {
        DbState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    #[tokio::test]
    async fn test_add_then_search() {
        let db = state().await;
        add_product(&db, " P1 ", "Widget", 1000, 10).await.unwrap();
        add_product(&db, "P2", "Gadget", 2500, 0).await.unwrap();

        let hits = search_products(&db, "wid", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "P1");

        let all = search_products(&db, "", None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let db = state().await;

        let err = add_product(&db, "P1", "Widget", -1, 10).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        add_product(&db, "P1", "Widget", 1000, 10).await.unwrap();
        let err = add_product(&db, "P1", "Other", 1000, 10).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("P1"));
    }
}
