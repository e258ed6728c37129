//! # Example: timeout_rollback
//!
//! Demonstrates a transaction that is rolled back when its deadline passes,
//! and one that commits in time.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► slow: reserve seat, deadline 100ms elapses → seat released
//!   └─► fast: reserve seat, finish() before deadline → seat kept,
//!             finish_with() arms a "send receipt" undo that fires on the deadline
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example timeout_rollback
//! ```

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cancelscope::{CancellationSignal, Rollback, Transaction};

fn reserve(seats: &Arc<AtomicI32>) -> impl FnOnce() -> Rollback {
    let seats = seats.clone();
    move || {
        seats.fetch_add(1, Ordering::SeqCst);
        Rollback::new(move |_| {
            seats.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== timeout_rollback example ===\n");
    let seats = Arc::new(AtomicI32::new(0));

    let mut slow = Transaction::new(CancellationSignal::timeout(Duration::from_millis(100)));
    slow.act(reserve(&seats))?;
    println!("slow: reserved, seats={}", seats.load(Ordering::SeqCst));
    slow.signal().cancelled().await;
    println!("slow: deadline hit, seats={}", seats.load(Ordering::SeqCst));

    let mut fast = Transaction::new(CancellationSignal::timeout(Duration::from_millis(100)));
    fast.act(reserve(&seats))?;
    fast.finish_with(|| {
        println!("fast: committed, receipt sent");
        Rollback::new(|reason| println!("fast: receipt voided ({reason})"))
    })?;
    fast.signal().cancelled().await;
    println!("fast: deadline hit, seats={}", seats.load(Ordering::SeqCst));

    Ok(())
}
