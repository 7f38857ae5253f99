//! Races on a single user's balance.
//!
//! Debiting operations run their check and their append inside one
//! exclusive store transaction, so out of N calls racing on the same
//! funds, exactly the calls whose cumulative amount fits may succeed.

use balance_engine::{Amount, Ledger};
use std::sync::Arc;
use std::thread;

fn spawn_and_count<F>(threads: u64, op: F) -> usize
where
    F: Fn(u64) -> bool + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let op = Arc::clone(&op);
            thread::spawn(move || op(i))
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("worker thread panicked"))
        .filter(|ok| *ok)
        .count()
}

#[test]
fn test_racing_reserves_never_overdraw() {
    let ledger = Arc::new(Ledger::in_memory());
    ledger.deposit(1, Amount::new(100)).unwrap();

    let l = Arc::clone(&ledger);
    let successes = spawn_and_count(10, move |order| {
        l.reserve(1, 7, order, Amount::new(30)).is_ok()
    });

    // 100 covers exactly three reservations of 30.
    assert_eq!(successes, 3);
    assert_eq!(ledger.balance(1).unwrap(), Amount::new(10));
}

#[test]
fn test_racing_transfers_never_overdraw() {
    let ledger = Arc::new(Ledger::in_memory());
    ledger.deposit(1, Amount::new(100)).unwrap();

    let l = Arc::clone(&ledger);
    let successes = spawn_and_count(10, move |i| {
        l.transfer(1, i + 2, Amount::new(30)).is_ok()
    });

    assert_eq!(successes, 3);
    assert_eq!(ledger.balance(1).unwrap(), Amount::new(10));

    let received: i64 = (2..12)
        .filter(|&u| ledger.has_balance(u).unwrap())
        .map(|u| ledger.balance(u).unwrap().get())
        .sum();
    assert_eq!(received, 90);
}

#[test]
fn test_mixed_debits_share_one_budget() {
    let ledger = Arc::new(Ledger::in_memory());
    ledger.deposit(1, Amount::new(50)).unwrap();

    let l = Arc::clone(&ledger);
    let successes = spawn_and_count(10, move |i| {
        if i % 2 == 0 {
            l.reserve(1, 9, i, Amount::new(20)).is_ok()
        } else {
            l.transfer(1, 99, Amount::new(20)).is_ok()
        }
    });

    // 50 covers exactly two debits of 20, whatever their mix.
    assert_eq!(successes, 2);
    assert_eq!(ledger.balance(1).unwrap(), Amount::new(10));
}

#[test]
fn test_racing_duplicate_reservations_admit_one() {
    let ledger = Arc::new(Ledger::in_memory());
    ledger.deposit(1, Amount::new(1_000)).unwrap();

    let l = Arc::clone(&ledger);
    let successes = spawn_and_count(8, move |_| {
        l.reserve(1, 5, 9, Amount::new(10)).is_ok()
    });

    assert_eq!(successes, 1);
    assert_eq!(ledger.balance(1).unwrap(), Amount::new(990));
}

#[test]
fn test_concurrent_deposits_all_land() {
    let ledger = Arc::new(Ledger::in_memory());

    let l = Arc::clone(&ledger);
    let successes = spawn_and_count(10, move |_| {
        l.deposit(1, Amount::new(10)).is_ok()
    });

    assert_eq!(successes, 10);
    assert_eq!(ledger.balance(1).unwrap(), Amount::new(100));
}
