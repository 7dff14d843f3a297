//! Confirmation state machine integration tests

use chrono::{Duration, TimeZone, Utc};
use move_screener::clock::ManualClock;
use move_screener::confirmation::{ConfirmationConfig, ConfirmationManager};
use move_screener::market::{Direction, Period};
use std::sync::Arc;

fn setup() -> (Arc<ConfirmationManager>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    ));
    let manager = Arc::new(ConfirmationManager::new(
        &ConfirmationConfig::default(),
        clock.clone(),
    ));
    (manager, clock)
}

#[tokio::test]
async fn test_six_confirmations_signal_at_three_and_six() {
    let (manager, clock) = setup();
    let mut fired = Vec::new();
    for call in 1..=6 {
        let outcome = manager
            .add_confirmation("BTCUSDT", Period::M15, Direction::Growth)
            .await;
        assert_eq!(outcome.count, call);
        if outcome.threshold_reached {
            fired.push(call);
        }
        clock.advance(Duration::minutes(1));
    }
    assert_eq!(fired, vec![3, 6]);
}

#[tokio::test]
async fn test_flip_then_expiry() {
    let (manager, clock) = setup();
    for _ in 0..2 {
        manager
            .add_confirmation("ETHUSDT", Period::M5, Direction::Growth)
            .await;
    }
    let flipped = manager
        .add_confirmation("ETHUSDT", Period::M5, Direction::Fall)
        .await;
    assert_eq!(flipped.count, 1);

    manager
        .add_confirmation("ETHUSDT", Period::M5, Direction::Fall)
        .await;
    clock.advance(Duration::minutes(5) + Duration::seconds(1));
    let expired = manager
        .add_confirmation("ETHUSDT", Period::M5, Direction::Fall)
        .await;
    assert_eq!(expired.count, 1);
    assert!(!expired.threshold_reached);
}

#[tokio::test]
async fn test_exact_period_boundary_does_not_expire() {
    let (manager, clock) = setup();
    manager
        .add_confirmation("SOLUSDT", Period::M5, Direction::Fall)
        .await;
    clock.advance(Duration::minutes(5));
    let outcome = manager
        .add_confirmation("SOLUSDT", Period::M5, Direction::Fall)
        .await;
    assert_eq!(outcome.count, 2);
}

#[tokio::test]
async fn test_concurrent_symbols_are_isolated() {
    let (manager, _) = setup();
    let mut handles = Vec::new();
    for symbol in ["BTCUSDT", "ETHUSDT", "SOLUSDT", "XRPUSDT"] {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            let mut last = None;
            for _ in 0..9 {
                last = Some(
                    manager
                        .add_confirmation(symbol, Period::H1, Direction::Growth)
                        .await,
                );
            }
            last
        }));
    }

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.count, 9);
        assert!(outcome.threshold_reached);
    }
    assert_eq!(manager.len().await, 4);
}

#[tokio::test]
async fn test_cleanup_keeps_recent_counters() {
    let (manager, clock) = setup();
    manager
        .add_confirmation("BTCUSDT", Period::M5, Direction::Growth)
        .await;
    clock.advance(Duration::minutes(30));
    manager
        .add_confirmation("ETHUSDT", Period::M5, Direction::Growth)
        .await;
    clock.advance(Duration::minutes(31));

    assert_eq!(manager.cleanup(Duration::hours(1)).await, 1);
    assert!(manager.progress("ETHUSDT", Period::M5).await.is_some());
}
