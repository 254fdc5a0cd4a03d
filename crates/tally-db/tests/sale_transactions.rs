//! End-to-end sale transactions against a real SQLite database.
//!
//! Concurrency tests use a file-backed database: the in-memory one has a
//! single connection and would serialise everything trivially.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tally_core::{
    Buyer, CartLine, CoreError, DiscountRate, FixedClock, LineChange, PaymentMethod, Product,
    SaleDraft, SaleMetadata, SaleModification, SaleStatus, ValidationError,
};
use tally_db::{Database, DbConfig, SaleError};

// =============================================================================
// Fixtures
// =============================================================================

fn metadata() -> SaleMetadata {
    SaleMetadata {
        buyer: Buyer {
            name: "Ana Gomez".to_string(),
            national_id: "12345678".to_string(),
            phone: None,
            email: Some("ana@example.com".to_string()),
            tax_id: "20-12345678-3".to_string(),
            address: "Calle 1 123".to_string(),
        },
        seller: "maria".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 12, 12).unwrap(),
        payment_method: Some(PaymentMethod::Cash),
    }
}

async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn add_product(db: &Database, code: &str, name: &str, price: i64, qty: i64) -> Product {
    db.products()
        .insert(&Product::new(code, name, price, qty))
        .await
        .unwrap()
}

async fn stock(db: &Database, code: &str) -> i64 {
    db.products()
        .get_by_code(code)
        .await
        .unwrap()
        .unwrap()
        .quantity_on_hand
}

fn draft(lines: Vec<CartLine>) -> SaleDraft {
    SaleDraft::new(metadata(), lines)
}

fn line(product: &Product, quantity: i64) -> CartLine {
    CartLine::from_product(product, quantity, DiscountRate::zero())
}

fn modification(code: &str, quantity: i64) -> SaleModification {
    SaleModification {
        metadata: metadata(),
        line: LineChange {
            product_code: code.to_string(),
            quantity,
            unit_price_cents: None,
            discount: DiscountRate::zero(),
        },
    }
}

// =============================================================================
// Commit
// =============================================================================

#[tokio::test]
async fn commit_decrements_stock_and_records_line_total() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;

    let sale_id = db
        .coordinator()
        .commit_sale(&draft(vec![line(&p1, 4)]))
        .await
        .unwrap();

    assert_eq!(stock(&db, "P1").await, 6);

    let lines = db.sales().get_lines(sale_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_total_cents, 4000);
    assert_eq!(lines[0].line_total().to_string(), "$40.00");

    let header = db.sales().get_by_id(sale_id).await.unwrap().unwrap();
    assert_eq!(header.total_cents, 4000);
    assert_eq!(header.status, SaleStatus::Completed);
}

#[tokio::test]
async fn commit_with_insufficient_stock_creates_nothing() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 3).await;

    let err = db
        .coordinator()
        .commit_sale(&draft(vec![line(&p1, 5)]))
        .await
        .unwrap_err();

    assert_eq!(
        err.as_core(),
        Some(&CoreError::InsufficientStock {
            code: "P1".to_string(),
            available: 3,
            requested: 5,
        })
    );
    assert_eq!(stock(&db, "P1").await, 3);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn huge_quantity_is_insufficient_stock_not_overflow() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;

    let err = db
        .coordinator()
        .commit_sale(&draft(vec![line(&p1, 100_000_000_000_000_000)]))
        .await
        .unwrap_err();

    assert_eq!(
        err.as_core(),
        Some(&CoreError::InsufficientStock {
            code: "P1".to_string(),
            available: 10,
            requested: 100_000_000_000_000_000,
        })
    );
    assert_eq!(stock(&db, "P1").await, 10);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn overflowing_total_rolls_back_with_out_of_range() {
    let db = memory_db().await;
    let bar = add_product(&db, "BAR", "Gold Bar", i64::MAX / 2 + 1, 2).await;

    let err = db
        .coordinator()
        .commit_sale(&draft(vec![line(&bar, 2)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SaleError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
    ));
    assert_eq!(stock(&db, "BAR").await, 2);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn failure_on_a_later_line_rolls_back_earlier_lines() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    let p2 = add_product(&db, "P2", "Gadget", 2500, 3).await;

    let result = db
        .coordinator()
        .commit_sale(&draft(vec![line(&p1, 2), line(&p2, 5)]))
        .await;

    assert!(matches!(
        result,
        Err(SaleError::Core(CoreError::InsufficientStock { .. }))
    ));
    assert_eq!(stock(&db, "P1").await, 10);
    assert_eq!(stock(&db, "P2").await, 3);
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert!(db.coordinator().list_sales().await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_fails_when_product_was_deleted() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    db.products().delete("P1").await.unwrap();

    let result = db
        .coordinator()
        .commit_sale(&draft(vec![line(&p1, 1)]))
        .await;

    assert!(matches!(
        result,
        Err(SaleError::Core(CoreError::ProductNotFound(code))) if code == "P1"
    ));
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn line_keeps_commit_time_name_and_price() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;

    let sale_id = db
        .coordinator()
        .commit_sale(&draft(vec![line(&p1, 1)]))
        .await
        .unwrap();

    let mut renamed = db.products().get_by_code("P1").await.unwrap().unwrap();
    renamed.name = "Widget Deluxe".to_string();
    renamed.unit_price_cents = 5000;
    db.products().update(&renamed).await.unwrap();

    let lines = db.sales().get_lines(sale_id).await.unwrap();
    assert_eq!(lines[0].product_name, "Widget");
    assert_eq!(lines[0].unit_price_cents, 1000);
}

#[tokio::test]
async fn sale_ids_increase() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    let coordinator = db.coordinator();

    let first = coordinator
        .commit_sale(&draft(vec![line(&p1, 1)]))
        .await
        .unwrap();
    let second = coordinator
        .commit_sale(&draft(vec![line(&p1, 1)]))
        .await
        .unwrap();

    assert!(second > first);
}

#[tokio::test]
async fn discount_applies_to_line_and_header_total() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 999, 10).await;

    let discounted = CartLine::from_product(&p1, 3, DiscountRate::from_percent(15));
    let sale_id = db
        .coordinator()
        .commit_sale(&draft(vec![discounted]))
        .await
        .unwrap();

    // 2997 less 449.55 rounded to 450
    let header = db.sales().get_by_id(sale_id).await.unwrap().unwrap();
    assert_eq!(header.total_cents, 2547);
}

// =============================================================================
// Modify
// =============================================================================

#[tokio::test]
async fn modify_restores_then_applies_new_quantity() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    let coordinator = db.coordinator();

    let sale_id = coordinator
        .commit_sale(&draft(vec![line(&p1, 4)]))
        .await
        .unwrap();
    assert_eq!(stock(&db, "P1").await, 6);

    coordinator
        .modify_sale(sale_id, &modification("P1", 2))
        .await
        .unwrap();
    assert_eq!(stock(&db, "P1").await, 8);

    let lines = db.sales().get_lines(sale_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
    let header = db.sales().get_by_id(sale_id).await.unwrap().unwrap();
    assert_eq!(header.total_cents, 2000);
}

#[tokio::test]
async fn repeating_a_modification_leaves_stock_unchanged() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    let coordinator = db.coordinator();

    let sale_id = coordinator
        .commit_sale(&draft(vec![line(&p1, 4)]))
        .await
        .unwrap();

    coordinator
        .modify_sale(sale_id, &modification("P1", 2))
        .await
        .unwrap();
    coordinator
        .modify_sale(sale_id, &modification("P1", 2))
        .await
        .unwrap();

    assert_eq!(stock(&db, "P1").await, 8);
}

#[tokio::test]
async fn modify_to_another_product_restores_the_previous_one() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    add_product(&db, "P2", "Gadget", 2500, 5).await;
    let coordinator = db.coordinator();

    let sale_id = coordinator
        .commit_sale(&draft(vec![line(&p1, 4)]))
        .await
        .unwrap();

    let mut change = modification("P2", 2);
    change.metadata.payment_method = Some(PaymentMethod::Credit);
    change.metadata.buyer.name = "Ana M. Gomez".to_string();
    coordinator.modify_sale(sale_id, &change).await.unwrap();

    assert_eq!(stock(&db, "P1").await, 10);
    assert_eq!(stock(&db, "P2").await, 3);

    let lines = db.sales().get_lines(sale_id).await.unwrap();
    assert_eq!(lines[0].product_code, "P2");
    assert_eq!(lines[0].product_name, "Gadget");
    assert_eq!(lines[0].unit_price_cents, 2500);

    let header = db.sales().get_by_id(sale_id).await.unwrap().unwrap();
    assert_eq!(header.payment_method, PaymentMethod::Credit);
    assert_eq!(header.buyer_name, "Ana M. Gomez");
    assert_eq!(header.total_cents, 5000);
}

#[tokio::test]
async fn failed_modify_changes_nothing() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    add_product(&db, "P2", "Gadget", 2500, 1).await;
    let coordinator = db.coordinator();

    let sale_id = coordinator
        .commit_sale(&draft(vec![line(&p1, 4)]))
        .await
        .unwrap();

    let err = coordinator
        .modify_sale(sale_id, &modification("P2", 3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SaleError::Core(CoreError::InsufficientStock { available: 1, requested: 3, .. })
    ));

    assert_eq!(stock(&db, "P1").await, 6);
    assert_eq!(stock(&db, "P2").await, 1);
    let lines = db.sales().get_lines(sale_id).await.unwrap();
    assert_eq!(lines[0].product_code, "P1");
    assert_eq!(lines[0].quantity, 4);
}

#[tokio::test]
async fn modify_with_overflowing_amounts_changes_nothing() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    let coordinator = db.coordinator();

    let sale_id = coordinator
        .commit_sale(&draft(vec![line(&p1, 4)]))
        .await
        .unwrap();

    let mut pricey = modification("P1", 2);
    pricey.line.unit_price_cents = Some(i64::MAX);
    assert!(matches!(
        coordinator.modify_sale(sale_id, &pricey).await,
        Err(SaleError::Core(CoreError::Validation(ValidationError::OutOfRange { .. })))
    ));

    assert!(matches!(
        coordinator
            .modify_sale(sale_id, &modification("P1", 100_000_000_000_000_000))
            .await,
        Err(SaleError::Core(CoreError::InsufficientStock { available: 10, .. }))
    ));

    assert_eq!(stock(&db, "P1").await, 6);
    let lines = db.sales().get_lines(sale_id).await.unwrap();
    assert_eq!(lines[0].quantity, 4);
    assert_eq!(lines[0].unit_price_cents, 1000);
    let header = db.sales().get_by_id(sale_id).await.unwrap().unwrap();
    assert_eq!(header.total_cents, 4000);
}

#[tokio::test]
async fn modify_rejects_missing_and_multi_line_sales() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    let p2 = add_product(&db, "P2", "Gadget", 2500, 10).await;
    let coordinator = db.coordinator();

    assert!(matches!(
        coordinator.modify_sale(99, &modification("P1", 1)).await,
        Err(SaleError::Core(CoreError::SaleNotFound(99)))
    ));

    let sale_id = coordinator
        .commit_sale(&draft(vec![line(&p1, 1), line(&p2, 1)]))
        .await
        .unwrap();

    assert!(matches!(
        coordinator.modify_sale(sale_id, &modification("P1", 1)).await,
        Err(SaleError::Core(CoreError::MultiLineSale { line_count: 2, .. }))
    ));
    assert_eq!(stock(&db, "P1").await, 9);
}

// =============================================================================
// Void
// =============================================================================

#[tokio::test]
async fn void_restores_stock_once() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    let p2 = add_product(&db, "P2", "Gadget", 2500, 10).await;
    let coordinator = db.coordinator();

    let sale_id = coordinator
        .commit_sale(&draft(vec![line(&p1, 3), line(&p2, 2)]))
        .await
        .unwrap();

    coordinator.void_sale(sale_id).await.unwrap();
    assert_eq!(stock(&db, "P1").await, 10);
    assert_eq!(stock(&db, "P2").await, 10);

    let err = coordinator.void_sale(sale_id).await.unwrap_err();
    assert!(matches!(
        err,
        SaleError::Core(CoreError::InvalidSaleStatus { ref current_status, .. })
            if current_status == "voided"
    ));
    assert_eq!(stock(&db, "P1").await, 10);

    assert!(matches!(
        coordinator.modify_sale(sale_id, &modification("P1", 1)).await,
        Err(SaleError::Core(CoreError::InvalidSaleStatus { .. }))
    ));
    assert!(matches!(
        coordinator.void_sale(sale_id + 1).await,
        Err(SaleError::Core(CoreError::SaleNotFound(_)))
    ));

    let rows = coordinator.list_sales().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.status == SaleStatus::Voided));
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn listing_is_ordered_by_sale_then_line() {
    let db = memory_db().await;
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;
    let p2 = add_product(&db, "P2", "Gadget", 2500, 10).await;
    let coordinator = db.coordinator();

    let first = coordinator
        .commit_sale(&draft(vec![line(&p2, 1), line(&p1, 1)]))
        .await
        .unwrap();
    let second = coordinator
        .commit_sale(&draft(vec![line(&p1, 2)]))
        .await
        .unwrap();

    let rows = coordinator.list_sales().await.unwrap();
    let keys: Vec<(i64, &str)> = rows
        .iter()
        .map(|r| (r.sale_id, r.product_code.as_str()))
        .collect();
    assert_eq!(keys, vec![(first, "P2"), (first, "P1"), (second, "P1")]);
    assert_eq!(rows[0].buyer_name, "Ana Gomez");
    assert_eq!(rows[0].display_date(), "12/12/2024");
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("tally.db")).max_connections(4))
        .await
        .unwrap();
    let p1 = add_product(&db, "P1", "Widget", 1000, 10).await;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let coordinator = db.coordinator();
            let sale = draft(vec![line(&p1, 6)]);
            tokio::spawn(async move { coordinator.commit_sale(&sale).await })
        })
        .collect();

    let mut successes = 0;
    let mut failures = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => failures.push(err),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        SaleError::Core(CoreError::InsufficientStock { available: 4, requested: 6, .. })
    ));
    assert_eq!(stock(&db, "P1").await, 4);
    assert_eq!(db.sales().count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_quotation_numbers_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("tally.db")).max_connections(4))
        .await
        .unwrap();
    let clock = Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2024, 12, 12).unwrap()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sequencer = db.quotations_with_clock(clock.clone());
            tokio::spawn(async move {
                let mut issued = Vec::new();
                for _ in 0..5 {
                    issued.push(sequencer.issue().await.unwrap());
                }
                issued
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        let issued = handle.await.unwrap();
        // each register sees its own numbers strictly increasing
        assert!(issued.windows(2).all(|w| w[0] < w[1]));
        all.extend(issued);
    }

    let unique: HashSet<_> = all.iter().map(|q| q.to_string()).collect();
    assert_eq!(unique.len(), 20);

    let last = db.quotations().last_issued().await.unwrap();
    assert_eq!(last.to_string(), "20241212-020");
}
