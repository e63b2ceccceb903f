//! Integration tests for the bounded stock under real thread contention.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use stockpile::{StockError, Stockpile};

#[test]
fn test_no_lost_updates() {
    let store = Arc::new(Stockpile::new(1_000).unwrap());
    let amounts: Vec<u32> = vec![5, 17, 1, 42, 9, 100, 3, 23];
    let expected: u32 = amounts.iter().sum();

    // All deposits fit at once, so none should block
    let handles: Vec<_> = amounts
        .into_iter()
        .map(|amount| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.deposit(amount))
        })
        .collect();

    for h in handles {
        h.join().unwrap().unwrap();
    }

    assert_eq!(store.level(), expected);
    assert_eq!(store.stats().deposits, 8);
}

#[test]
fn test_withdraw_blocks_until_deposit() {
    let store = Arc::new(Stockpile::new(10).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let withdrawer = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            store.withdraw(5).unwrap();
            done.store(true, Ordering::Release);
        })
    };

    // Nothing to take yet, the withdrawer must be asleep
    thread::sleep(Duration::from_millis(100));
    assert!(!done.load(Ordering::Acquire));
    assert_eq!(store.level(), 0);

    store.deposit(5).unwrap();
    withdrawer.join().unwrap();

    assert!(done.load(Ordering::Acquire));
    assert_eq!(store.level(), 0);
}

#[test]
fn test_deposit_blocks_until_room() {
    let store = Arc::new(Stockpile::new(10).unwrap());
    store.deposit(8).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let depositor = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            store.deposit(5).unwrap();
            done.store(true, Ordering::Release);
        })
    };

    // 8 + 5 > 10: the depositor must be asleep, level untouched
    thread::sleep(Duration::from_millis(100));
    assert!(!done.load(Ordering::Acquire));
    assert_eq!(store.level(), 8);

    store.withdraw(4).unwrap();
    depositor.join().unwrap();

    assert_eq!(store.level(), 9);
}

#[test]
fn test_progress_at_full_capacity() {
    let store = Arc::new(Stockpile::new(100).unwrap());
    store.deposit(100).unwrap();

    let withdrawer = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.withdraw(100))
    };

    withdrawer.join().unwrap().unwrap();
    assert_eq!(store.level(), 0);
}

#[test]
fn test_invariant_under_stress() {
    // Tiny capacity relative to traffic so both directions block often
    let store = Arc::new(Stockpile::new(8).unwrap());
    let stop_sampling = Arc::new(AtomicBool::new(false));
    let rounds = 200u32;
    let batches: [u32; 3] = [1, 2, 3];
    let pairs = 4;

    // Sampler: level() is taken under the lock, so any observation
    // outside [0, capacity] is a real invariant violation
    let sampler = {
        let store = Arc::clone(&store);
        let stop = Arc::clone(&stop_sampling);
        thread::spawn(move || {
            while !stop.load(Ordering::Acquire) {
                assert!(store.level() <= store.capacity());
                thread::yield_now();
            }
        })
    };

    // Matched producer/consumer pairs: identical batch sequences, so
    // totals balance and the run must drain to exactly zero
    let mut handles = Vec::new();
    for _ in 0..pairs {
        let producer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..rounds {
                    for amount in batches {
                        store.deposit(amount).unwrap();
                    }
                }
            })
        };
        let consumer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..rounds {
                    for amount in batches {
                        store.withdraw(amount).unwrap();
                    }
                }
            })
        };
        handles.push(producer);
        handles.push(consumer);
    }

    for h in handles {
        h.join().unwrap();
    }
    stop_sampling.store(true, Ordering::Release);
    sampler.join().unwrap();

    assert_eq!(store.level(), 0);

    let stats = store.stats();
    let moved = u64::from(rounds) * u64::from(batches.iter().sum::<u32>()) * pairs;
    assert_eq!(stats.units_deposited, moved);
    assert_eq!(stats.units_withdrawn, moved);
    println!(
        "moved {} units, deposit waits: {}, withdraw waits: {}",
        moved, stats.deposit_waits, stats.withdraw_waits
    );
}

#[test]
fn test_large_withdraw_waits_for_cumulative_deposits() {
    let store = Arc::new(Stockpile::new(100).unwrap());

    // Five sequential batches of 5
    for _ in 0..5 {
        store.deposit(5).unwrap();
    }
    assert_eq!(store.level(), 25);

    // Satisfiable immediately
    store.withdraw(3).unwrap();
    assert_eq!(store.level(), 22);

    // 30 > 22: must sleep until cumulative deposits raise the level
    let done = Arc::new(AtomicBool::new(false));
    let withdrawer = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            store.withdraw(30).unwrap();
            done.store(true, Ordering::Release);
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(!done.load(Ordering::Acquire));
    assert_eq!(store.level(), 22);

    for _ in 0..5 {
        store.deposit(5).unwrap();
    }
    withdrawer.join().unwrap();

    assert_eq!(store.level(), 22 + 25 - 30);
}

#[test]
fn test_timeout_succeeds_when_stock_arrives() {
    let store = Arc::new(Stockpile::new(10).unwrap());

    let supplier = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            store.deposit(5).unwrap();
        })
    };

    store
        .withdraw_timeout(5, Duration::from_secs(5))
        .unwrap();
    supplier.join().unwrap();

    assert_eq!(store.level(), 0);
}

#[test]
fn test_close_wakes_blocked_withdrawer() {
    let store = Arc::new(Stockpile::new(10).unwrap());

    let withdrawer = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.withdraw(5))
    };

    thread::sleep(Duration::from_millis(100));
    store.close();

    assert_eq!(withdrawer.join().unwrap(), Err(StockError::Closed));
    // Pre-close state preserved exactly
    assert_eq!(store.level(), 0);
}

#[test]
fn test_close_wakes_blocked_depositor() {
    let store = Arc::new(Stockpile::new(10).unwrap());
    store.deposit(10).unwrap();

    let depositor = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.deposit(1))
    };

    thread::sleep(Duration::from_millis(100));
    store.close();

    assert_eq!(depositor.join().unwrap(), Err(StockError::Closed));
    assert_eq!(store.level(), 10);
}
