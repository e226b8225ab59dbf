//! Stock ledger tests
//!
//! Tests for the ledger-consistency rules including:
//! - Every quantity change is paired with exactly one movement
//! - Exits never take stock below zero
//! - A failed unit of work leaves item and ledger untouched
//! - Replaying the ledger from zero gives the live quantity

mod common;

use chrono::Duration;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    MovementFilter, MovementKind, RecordMovementInput, RecordSaleInput, RestockInput,
    INITIAL_STOCK_NOTE,
};
use uuid::Uuid;

use common::{friday_morning, item_input, Harness};
use pos_tracker_backend::{AppError, Clock, InventoryStore};

fn movement(item_id: Uuid, kind: MovementKind, quantity: i64) -> RecordMovementInput {
    RecordMovementInput {
        item_id,
        kind,
        quantity,
        unit_price: None,
        note: None,
    }
}

// ============================================================================
// Scenarios
// ============================================================================

/// Create SH-001 empty, then ENTRY 20 @1000
#[tokio::test]
async fn scenario_a_entry_on_new_item() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 0)).await.unwrap();
    assert_eq!(item.current_quantity, 0);

    let mut input = movement(item.id, MovementKind::Entry, 20);
    input.unit_price = Some(Decimal::from(1000));
    let recorded = h.ledger().record_movement(input).await.unwrap();

    assert_eq!(recorded.resulting_balance, 20);
    let item = h.items().get_item(item.id).await.unwrap();
    assert_eq!(item.current_quantity, 20);
    assert!(h.reports().low_stock_report().await.unwrap().is_empty());
}

/// EXIT 25 against 20 in stock is refused and changes nothing
#[tokio::test]
async fn scenario_b_exit_beyond_stock_is_refused() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 20)).await.unwrap();

    let err = h
        .ledger()
        .record_movement(movement(item.id, MovementKind::Exit, 25))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, 25);
            assert_eq!(available, 20);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(h.items().get_item(item.id).await.unwrap().current_quantity, 20);
    assert_eq!(h.store_movements(item.id).await.len(), 1);
}

/// EXIT 17 leaves 3, which is at or below the threshold of 5
#[tokio::test]
async fn scenario_c_exit_drops_item_into_low_stock() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 20)).await.unwrap();

    let recorded = h
        .ledger()
        .record_movement(movement(item.id, MovementKind::Exit, 17))
        .await
        .unwrap();
    assert_eq!(recorded.resulting_balance, 3);

    let low = h.reports().low_stock_report().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].reference, "SH-001");
    assert_eq!(low[0].current_quantity, 3);
}

/// ENTRY 10 @1000 and EXIT 4 @1500 on the same day
#[tokio::test]
async fn scenario_d_daily_totals() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 0)).await.unwrap();

    h.ledger()
        .restock(
            item.id,
            RestockInput {
                quantity: 10,
                unit_price: None,
                note: None,
            },
        )
        .await
        .unwrap();
    h.clock.advance(Duration::hours(2));
    h.ledger()
        .record_sale(RecordSaleInput {
            item_id: item.id,
            quantity: 4,
            note: None,
        })
        .await
        .unwrap();

    let report = h.reports().daily_report(None).await.unwrap();
    assert_eq!(report.entries.quantity, 10);
    assert_eq!(report.entries.total, Decimal::from(10_000));
    assert_eq!(report.exits.quantity, 4);
    assert_eq!(report.exits.total, Decimal::from(6_000));
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].stock_final, Some(6));
    assert_eq!(report.items[0].closing_balance, 6);
}

/// EXITs A:5, B:9, A:3 rank B (9) before A (8)
#[tokio::test]
async fn scenario_e_top_sellers() {
    let h = Harness::new();
    let a = h.items().create_item(item_input("A-1", "Alpha", 20)).await.unwrap();
    let b = h.items().create_item(item_input("B-1", "Bravo", 20)).await.unwrap();

    for (id, quantity) in [(a.id, 5), (b.id, 9), (a.id, 3)] {
        h.ledger()
            .record_movement(movement(id, MovementKind::Exit, quantity))
            .await
            .unwrap();
    }

    let top = h.reports().top_sellers(Some(5)).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!((top[0].item_id, top[0].quantity), (b.id, 9));
    assert_eq!((top[1].item_id, top[1].quantity), (a.id, 8));
}

// ============================================================================
// Consistency
// ============================================================================

impl Harness {
    async fn store_movements(&self, item_id: Uuid) -> Vec<shared::Movement> {
        self.state
            .store
            .list_movements(&MovementFilter::for_item(item_id))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_initial_stock_is_booked_as_entry() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 12)).await.unwrap();

    let movements = h.store_movements(item.id).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].kind, MovementKind::Entry);
    assert_eq!(movements[0].quantity, 12);
    assert_eq!(movements[0].unit_price, Decimal::from(1000));
    assert_eq!(movements[0].note.as_deref(), Some(INITIAL_STOCK_NOTE));
    assert_eq!(item.current_quantity, 12);
}

#[tokio::test]
async fn test_failed_quantity_update_rolls_back_movement() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 20)).await.unwrap();

    h.store.fail_next_quantity_update();
    let err = h
        .ledger()
        .record_movement(movement(item.id, MovementKind::Exit, 5))
        .await
        .unwrap_err();
    assert!(err.is_transient());

    assert_eq!(h.items().get_item(item.id).await.unwrap().current_quantity, 20);
    assert_eq!(h.store_movements(item.id).await.len(), 1);

    // The store recovers and the next movement goes through
    let recorded = h
        .ledger()
        .record_movement(movement(item.id, MovementKind::Exit, 5))
        .await
        .unwrap();
    assert_eq!(recorded.resulting_balance, 15);
}

#[tokio::test]
async fn test_failed_initial_stock_leaves_no_item() {
    let h = Harness::new();
    h.store.fail_next_quantity_update();

    assert!(h
        .items()
        .create_item(item_input("SH-001", "Sneakers", 8))
        .await
        .is_err());

    let (items, meta) = h
        .items()
        .list_items(Default::default(), Default::default())
        .await
        .unwrap();
    assert!(items.is_empty());
    assert_eq!(meta.total_items, 0);
}

#[tokio::test]
async fn test_non_positive_quantity_is_rejected() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 5)).await.unwrap();

    for quantity in [0, -3] {
        let err = h
            .ledger()
            .record_movement(movement(item.id, MovementKind::Entry, quantity))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }), "{err:?}");
    }
    assert_eq!(h.store_movements(item.id).await.len(), 1);
}

#[tokio::test]
async fn test_movement_on_unknown_or_archived_item_is_not_found() {
    let h = Harness::new();
    let err = h
        .ledger()
        .record_movement(movement(Uuid::new_v4(), MovementKind::Entry, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let item = h.items().create_item(item_input("SH-001", "Sneakers", 5)).await.unwrap();
    h.items().archive_item(item.id).await.unwrap();
    let err = h
        .ledger()
        .record_movement(movement(item.id, MovementKind::Entry, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_exit_of_entire_stock_reaches_zero() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 7)).await.unwrap();

    let recorded = h
        .ledger()
        .record_movement(movement(item.id, MovementKind::Exit, 7))
        .await
        .unwrap();
    assert_eq!(recorded.resulting_balance, 0);
}

#[tokio::test]
async fn test_list_movements_newest_first_and_by_day() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 10)).await.unwrap();
    h.clock.advance(Duration::days(1));
    h.ledger()
        .record_movement(movement(item.id, MovementKind::Exit, 2))
        .await
        .unwrap();

    let offset = h.state.config.reports.offset();
    let all = h
        .ledger()
        .list_movements(MovementFilter::for_item(item.id), None, offset)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].sequence > all[1].sequence);

    let saturday = h.clock_date();
    let same_day = h
        .ledger()
        .list_movements(MovementFilter::default(), Some(saturday), offset)
        .await
        .unwrap();
    assert_eq!(same_day.len(), 1);
    assert_eq!(same_day[0].kind, MovementKind::Exit);
}

impl Harness {
    fn clock_date(&self) -> chrono::NaiveDate {
        self.clock.now().date_naive()
    }
}

#[tokio::test]
async fn test_item_ledger_replays_to_current_quantity() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 10)).await.unwrap();
    for (kind, quantity) in [
        (MovementKind::Exit, 4),
        (MovementKind::Entry, 6),
        (MovementKind::Exit, 12),
    ] {
        h.ledger()
            .record_movement(movement(item.id, kind, quantity))
            .await
            .unwrap();
    }

    let ledger = h.ledger().item_ledger(item.id).await.unwrap();
    assert_eq!(ledger.current_quantity, 0);
    assert_eq!(ledger.replayed_quantity, 0);
    assert!(ledger.consistent);
    assert_eq!(ledger.movements.len(), 4);
    assert!(ledger
        .movements
        .windows(2)
        .all(|pair| pair[0].sequence < pair[1].sequence));
}

// ============================================================================
// Concurrency
// ============================================================================

/// Twenty concurrent exits of 3 against 50 in stock: 16 succeed, 4 are refused
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_exits_never_go_negative() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 50)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let ledger = h.ledger();
        let item_id = item.id;
        handles.push(tokio::spawn(async move {
            ledger
                .record_movement(movement(item_id, MovementKind::Exit, 3))
                .await
        }));
    }

    let mut accepted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(recorded) => {
                assert!(recorded.resulting_balance >= 0);
                accepted += 1;
            }
            Err(AppError::InsufficientStock { .. }) => refused += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(accepted, 16);
    assert_eq!(refused, 4);

    let ledger = h.ledger().item_ledger(item.id).await.unwrap();
    assert_eq!(ledger.current_quantity, 2);
    assert!(ledger.consistent);
}

// ============================================================================
// Bounds and timestamps
// ============================================================================

#[tokio::test]
async fn test_out_of_range_movements_are_rejected() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 0)).await.unwrap();

    let err = h
        .ledger()
        .record_movement(movement(item.id, MovementKind::Entry, 1_000_000_001))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantity"));

    let err = h
        .ledger()
        .restock(
            item.id,
            RestockInput {
                quantity: 1,
                unit_price: Some(Decimal::new(1005, 3)),
                note: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "unit_price"));

    let err = h
        .ledger()
        .record_movement(RecordMovementInput {
            unit_price: Some(Decimal::from(1_000_000_000_000i64)),
            ..movement(item.id, MovementKind::Entry, 1)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "unit_price"));

    assert!(h.ledger().item_ledger(item.id).await.unwrap().movements.is_empty());
}

/// A movement waiting for the item lock is stamped when it gets the lock
#[tokio::test]
async fn test_movement_time_is_read_under_the_lock() {
    let h = Harness::new();
    let item = h.items().create_item(item_input("SH-001", "Sneakers", 5)).await.unwrap();

    let held = h.store.begin().await.unwrap();
    let ledger = h.ledger();
    let pending = tokio::spawn(async move { ledger
            .record_sale(RecordSaleInput {
                item_id: item.id,
                quantity: 1,
                note: None,
            })
            .await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    h.clock.advance(Duration::minutes(3));
    drop(held);

    let recorded = pending.await.unwrap().unwrap();
    assert_eq!(recorded.created_at, friday_morning() + Duration::minutes(3));

    let ledger = h.ledger().item_ledger(item.id).await.unwrap();
    assert!(ledger
        .movements
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at));
}

#[tokio::test]
async fn test_item_creation_time_is_read_inside_the_unit_of_work() {
    let h = Harness::new();

    let held = h.store.begin().await.unwrap();
    let items = h.items();
    let pending =
        tokio::spawn(async move { items.create_item(item_input("SH-001", "Sneakers", 2)).await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    h.clock.advance(Duration::minutes(2));
    drop(held);

    let item = pending.await.unwrap().unwrap();
    assert_eq!(item.created_at, friday_morning() + Duration::minutes(2));
    let ledger = h.ledger().item_ledger(item.id).await.unwrap();
    assert_eq!(ledger.movements[0].created_at, item.created_at);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any sequence of requests keeps stock non-negative and the ledger replayable
    #[test]
    fn prop_ledger_stays_consistent(
        initial in 0i64..30,
        steps in prop::collection::vec((any::<bool>(), 1i64..15), 1..25)
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let h = Harness::new();
            let item = h.items().create_item(item_input("P-1", "Prop", initial)).await.unwrap();
            let mut expected = initial;

            for (is_entry, quantity) in steps {
                let kind = if is_entry { MovementKind::Entry } else { MovementKind::Exit };
                match h.ledger().record_movement(movement(item.id, kind, quantity)).await {
                    Ok(recorded) => {
                        expected += kind.signed(quantity);
                        assert_eq!(recorded.resulting_balance, expected);
                    }
                    Err(AppError::InsufficientStock { available, .. }) => {
                        assert!(!is_entry);
                        assert_eq!(available, expected);
                        assert!(quantity > expected);
                    }
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }

            let ledger = h.ledger().item_ledger(item.id).await.unwrap();
            assert_eq!(ledger.current_quantity, expected);
            assert!(ledger.current_quantity >= 0);
            assert!(ledger.consistent);
        });
    }
}
