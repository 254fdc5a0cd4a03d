//! # Sale Commands
//!
//! Commit, modify, void and list sales.
//!
//! ## Request Files
//! ```json
//! {
//!   "buyer": {
//!     "name": "Ana Gomez",
//!     "nationalId": "1032456789",
//!     "phone": "3001234567",
//!     "taxId": "900123456",
//!     "address": "Calle 10 # 4-21"
//!   },
//!   "seller": "maria",
//!   "date": "2024-12-12",
//!   "paymentMethod": "cash",
//!   "lines": [
//!     { "code": "P1", "quantity": 4 },
//!     { "name": "Gadget", "quantity": 1, "discountPercent": 10 }
//!   ]
//! }
//! ```
//! A modify request carries a single `line` instead of `lines`, optionally
//! with `unitPriceCents`. `seller` falls back to `TALLY_SELLER`, `date` to
//! today.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use tally_core::{
    Buyer, Cart, Clock, DiscountRate, LineChange, LineItem, LineRequest, PaymentMethod,
    ProductLookup, SaleHeader, SaleMetadata, SaleModification, SaleRow, SaleStatus, SystemClock,
};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuyerDto {
    pub name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: String,
    pub address: String,
}

impl From<BuyerDto> for Buyer {
    fn from(b: BuyerDto) -> Self {
        Buyer {
            name: b.name,
            national_id: b.national_id,
            phone: b.phone,
            email: b.email,
            tax_id: b.tax_id,
            address: b.address,
        }
    }
}

/// Header fields shared by commit and modify requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleHeaderRequest {
    pub buyer: BuyerDto,
    pub seller: Option<String>,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}

impl SaleHeaderRequest {
    fn into_metadata(self, config: &ConfigState) -> SaleMetadata {
        SaleMetadata {
            buyer: self.buyer.into(),
            seller: self
                .seller
                .or_else(|| config.seller.clone())
                .unwrap_or_default(),
            date: self.date.unwrap_or_else(|| SystemClock.today()),
            payment_method: self.payment_method,
        }
    }
}

/// Product identified by code or name, as typed at the counter.
///
/// Committed lines always sell at the catalogue price, so a price field
/// here is rejected rather than ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LineDto {
    pub code: Option<String>,
    pub name: Option<String>,
    pub quantity: i64,
    pub discount_percent: u32,
}

impl LineDto {
    fn lookup(&self) -> Result<ProductLookup, ApiError> {
        lookup(self.code.as_deref(), self.name.as_deref())
    }
}

/// Replacement line for a modify. `None` price keeps the catalogue price.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ModifyLineDto {
    pub code: Option<String>,
    pub name: Option<String>,
    pub quantity: i64,
    pub discount_percent: u32,
    pub unit_price_cents: Option<i64>,
}

impl ModifyLineDto {
    fn lookup(&self) -> Result<ProductLookup, ApiError> {
        lookup(self.code.as_deref(), self.name.as_deref())
    }
}

fn lookup(code: Option<&str>, name: Option<&str>) -> Result<ProductLookup, ApiError> {
    Ok(ProductLookup::from_form(code, name)?)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSaleRequest {
    #[serde(flatten)]
    pub header: SaleHeaderRequest,
    #[serde(default)]
    pub lines: Vec<LineDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifySaleRequest {
    #[serde(flatten)]
    pub header: SaleHeaderRequest,
    pub line: ModifyLineDto,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSaleResponse {
    pub sale_id: i64,
    pub line_count: usize,
    pub total_cents: i64,
    pub total: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineDto {
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    pub line_total_cents: i64,
}

impl From<LineItem> for SaleLineDto {
    fn from(l: LineItem) -> Self {
        SaleLineDto {
            product_code: l.product_code,
            product_name: l.product_name,
            quantity: l.quantity,
            unit_price_cents: l.unit_price_cents,
            discount_bps: l.discount_bps,
            line_total_cents: l.line_total_cents,
        }
    }
}

/// A sale after modify or void.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetailResponse {
    pub sale_id: i64,
    pub status: SaleStatus,
    pub buyer_name: String,
    pub seller: String,
    pub date: String,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
    pub total: String,
    pub lines: Vec<SaleLineDto>,
}

/// One row of `register sales`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRowDto {
    pub sale_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub product_code: String,
    pub unit_price_cents: i64,
    pub buyer_name: String,
    pub buyer_national_id: String,
    pub seller: String,
    pub date: String,
    pub line_total_cents: i64,
    pub line_total: String,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
}

impl SaleRowDto {
    fn from_row(row: SaleRow, config: &ConfigState) -> Self {
        SaleRowDto {
            date: row.display_date(),
            line_total: config.format_currency(row.line_total_cents),
            sale_id: row.sale_id,
            product_name: row.product_name,
            quantity: row.quantity,
            product_code: row.product_code,
            unit_price_cents: row.unit_price_cents,
            buyer_name: row.buyer_name,
            buyer_national_id: row.buyer_national_id,
            seller: row.seller,
            line_total_cents: row.line_total_cents,
            payment_method: row.payment_method,
            status: row.status,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Builds a cart from the request and commits it.
///
/// Lines are added one by one so an unknown product or an obviously
/// insufficient stock is reported before the transaction starts.
pub async fn commit_sale(
    db: &DbState,
    config: &ConfigState,
    request: CommitSaleRequest,
) -> Result<CommitSaleResponse, ApiError> {
    debug!(lines = request.lines.len(), "commit_sale command");

    let coordinator = db.coordinator();
    let mut cart = Cart::new();

    for line in &request.lines {
        let line_request = LineRequest {
            product: line.lookup()?,
            quantity: line.quantity,
            discount: DiscountRate::from_percent(line.discount_percent),
        };
        coordinator.add_to_cart(&mut cart, &line_request).await?;
    }

    let draft = cart.into_draft(request.header.into_metadata(config));
    let line_count = draft.merged_lines().len();

    let sale_id = coordinator.commit_sale(&draft).await?;
    let total = draft.total()?;
    info!(sale_id, total = %config.format_currency(total.cents()), "commit_sale complete");

    Ok(CommitSaleResponse {
        sale_id,
        line_count,
        total_cents: total.cents(),
        total: config.format_currency(total.cents()),
    })
}

/// Replaces the line and header of a single-line sale.
pub async fn modify_sale(
    db: &DbState,
    config: &ConfigState,
    sale_id: i64,
    request: ModifySaleRequest,
) -> Result<SaleDetailResponse, ApiError> {
    debug!(sale_id, "modify_sale command");

    let coordinator = db.coordinator();
    let product = coordinator.resolve_product(&request.line.lookup()?).await?;

    let modification = SaleModification {
        line: LineChange {
            product_code: product.code,
            quantity: request.line.quantity,
            unit_price_cents: request.line.unit_price_cents,
            discount: DiscountRate::from_percent(request.line.discount_percent),
        },
        metadata: request.header.into_metadata(config),
    };

    coordinator.modify_sale(sale_id, &modification).await?;
    sale_detail(db, config, sale_id).await
}

/// Voids a completed sale and restores its stock.
pub async fn void_sale(
    db: &DbState,
    config: &ConfigState,
    sale_id: i64,
) -> Result<SaleDetailResponse, ApiError> {
    debug!(sale_id, "void_sale command");

    db.coordinator().void_sale(sale_id).await?;
    sale_detail(db, config, sale_id).await
}

/// Every sale line with its header.
pub async fn list_sales(db: &DbState, config: &ConfigState) -> Result<Vec<SaleRowDto>, ApiError> {
    let rows = db.coordinator().list_sales().await?;
    debug!(count = rows.len(), "list_sales command");

    Ok(rows
        .into_iter()
        .map(|row| SaleRowDto::from_row(row, config))
        .collect())
}

async fn sale_detail(
    db: &DbState,
    config: &ConfigState,
    sale_id: i64,
) -> Result<SaleDetailResponse, ApiError> {
    let header: SaleHeader = db
        .inner()
        .sales()
        .get_by_id(sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &sale_id.to_string()))?;
    let lines = db.inner().sales().get_lines(sale_id).await?;

    Ok(SaleDetailResponse {
        sale_id: header.id,
        status: header.status,
        buyer_name: header.buyer_name,
        seller: header.seller,
        date: header.sale_date.format("%d/%m/%Y").to_string(),
        payment_method: header.payment_method,
        total_cents: header.total_cents,
        total: config.format_currency(header.total_cents),
        lines: lines.into_iter().map(SaleLineDto::from).collect(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_core::Product;
    use tally_db::{Database, DbConfig};

    async fn state() -> DbState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product::new("P1", "Widget", 1000, 10))
            .await
            .unwrap();
        db.products()
            .insert(&Product::new("P2", "Gadget", 2500, 3))
            .await
            .unwrap();
        DbState::new(db)
    }

    fn config() -> ConfigState {
        ConfigState {
            seller: Some("maria".to_string()),
            ..ConfigState::default()
        }
    }

    fn commit_request(lines: &str) -> CommitSaleRequest {
        serde_json::from_str(&format!(
            r#"{{
                "buyer": {{
                    "name": "Ana Gomez",
                    "nationalId": "1032456789",
                    "phone": "3001234567",
                    "taxId": "900123456",
                    "address": "Calle 10 # 4-21"
                }},
                "date": "2024-12-12",
                "paymentMethod": "cash",
                "lines": {lines}
            }}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_commit_from_request() {
        let db = state().await;
        let request = commit_request(
            r#"[{"code": "P1", "quantity": 4}, {"name": "gadget", "quantity": 1, "discountPercent": 10}]"#,
        );

        let response = commit_sale(&db, &config(), request).await.unwrap();
        assert_eq!(response.line_count, 2);
        assert_eq!(response.total_cents, 4000 + 2250);
        assert_eq!(response.total, "$62.50");

        let rows = list_sales(&db, &config()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].seller, "maria");
        assert_eq!(rows[0].date, "12/12/2024");
        assert_eq!(rows[0].line_total, "$40.00");
    }

    #[tokio::test]
    async fn test_commit_reports_stock_before_transaction() {
        let db = state().await;
        let request = commit_request(r#"[{"code": "P2", "quantity": 5}]"#);

        let err = commit_sale(&db, &config(), request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(db.inner().sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_without_seller_is_rejected() {
        let db = state().await;
        let request = commit_request(r#"[{"code": "P1", "quantity": 1}]"#);

        let err = commit_sale(&db, &ConfigState::default(), request)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("seller"));
    }

    #[tokio::test]
    async fn test_modify_and_void() {
        let db = state().await;
        let committed = commit_sale(
            &db,
            &config(),
            commit_request(r#"[{"code": "P1", "quantity": 4}]"#),
        )
        .await
        .unwrap();

        let change: ModifySaleRequest = serde_json::from_str(
            r#"{
                "buyer": {
                    "name": "Ana Gomez",
                    "nationalId": "1032456789",
                    "email": "ana@example.com",
                    "taxId": "900123456",
                    "address": "Calle 10 # 4-21"
                },
                "paymentMethod": "credit",
                "line": {"code": "P1", "quantity": 2, "unitPriceCents": 900}
            }"#,
        )
        .unwrap();

        let detail = modify_sale(&db, &config(), committed.sale_id, change)
            .await
            .unwrap();
        assert_eq!(detail.payment_method, PaymentMethod::Credit);
        assert_eq!(detail.total_cents, 1800);
        assert_eq!(detail.lines[0].quantity, 2);

        let product = db.inner().products().get_by_code("P1").await.unwrap().unwrap();
        assert_eq!(product.quantity_on_hand, 8);

        let voided = void_sale(&db, &config(), committed.sale_id).await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);
        let product = db.inner().products().get_by_code("P1").await.unwrap().unwrap();
        assert_eq!(product.quantity_on_hand, 10);

        let err = void_sale(&db, &config(), committed.sale_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[test]
    fn test_commit_line_rejects_price() {
        let err = serde_json::from_str::<CommitSaleRequest>(
            r#"{"lines": [{"code": "P1", "quantity": 1, "unitPriceCents": 1}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unitPriceCents"));

        let api = ApiError::from(err);
        assert_eq!(api.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_modify_request_requires_line() {
        let result = serde_json::from_str::<ModifySaleRequest>(r#"{"paymentMethod": "cash"}"#);
        assert!(result.is_err());
    }
}
