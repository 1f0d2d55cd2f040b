//! Order-number uniqueness properties.
//!
//! The database enforces uniqueness with an index; these tests model the
//! reserve-and-retry protocol the checkout transaction follows, showing
//! that concurrent writers converge on distinct numbers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use groenmarkt_core::OrderNumber;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// A stand-in for the unique index: insert fails when the number is
/// already taken, exactly like the constraint violation checkout
/// retries on.
#[derive(Default)]
struct NumberTable {
    taken: HashSet<String>,
}

impl NumberTable {
    fn highest_for(&self, prefix: &str) -> Option<OrderNumber> {
        self.taken
            .iter()
            .filter(|n| n.starts_with(prefix))
            .max()
            .and_then(|n| n.parse().ok())
    }

    fn try_insert(&mut self, number: &OrderNumber) -> bool {
        self.taken.insert(number.to_string())
    }
}

#[test]
fn sequences_increment_within_a_day_and_reset_across_days() {
    let mut table = NumberTable::default();
    let monday = day(2026, 8, 3);
    let tuesday = day(2026, 8, 4);

    for expected in 1..=5u16 {
        let highest = table.highest_for(&OrderNumber::day_prefix(monday));
        let next = OrderNumber::next(monday, highest.as_ref());
        assert_eq!(next.sequence(), expected);
        assert!(table.try_insert(&next));
    }

    let highest = table.highest_for(&OrderNumber::day_prefix(tuesday));
    let next = OrderNumber::next(tuesday, highest.as_ref());
    assert_eq!(next.sequence(), 1, "a new day restarts the sequence");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_checkouts_never_share_a_number() {
    // 8 workers race to reserve 5 numbers each. Every worker reads the
    // highest existing number, computes the next, and retries when the
    // "unique index" rejects it — the protocol from the checkout
    // transaction.
    let table = Arc::new(Mutex::new(NumberTable::default()));
    let today = day(2026, 8, 7);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let table = Arc::clone(&table);
        handles.push(tokio::spawn(async move {
            let mut reserved = Vec::new();
            for _ in 0..5 {
                loop {
                    // Read outside the "insert" to widen the race window.
                    let highest = {
                        let guard = table.lock().expect("lock");
                        guard.highest_for(&OrderNumber::day_prefix(today))
                    };
                    let candidate = OrderNumber::next(today, highest.as_ref());

                    tokio::task::yield_now().await;

                    let inserted = {
                        let mut guard = table.lock().expect("lock");
                        guard.try_insert(&candidate)
                    };
                    if inserted {
                        reserved.push(candidate);
                        break;
                    }
                    // Conflict: retry, exactly like the checkout loop.
                }
            }
            reserved
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.expect("worker panicked"));
    }

    let unique: HashSet<String> = all.iter().map(ToString::to_string).collect();
    assert_eq!(unique.len(), 40, "every reserved number is distinct");

    // And the reserved numbers are exactly the first 40 of the day.
    let mut sequences: Vec<u16> = all.iter().map(OrderNumber::sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=40).collect::<Vec<u16>>());
}

#[test]
fn numbers_sort_lexicographically_within_a_day() {
    // highest_for relies on string MAX picking the highest sequence.
    let today = day(2026, 8, 7);
    let numbers: Vec<String> = (1..=1500u16)
        .map(|s| OrderNumber::new(today, s).to_string())
        .collect();
    let max = numbers.iter().max().expect("non-empty");
    assert_eq!(max, &OrderNumber::new(today, 1500).to_string());
}
