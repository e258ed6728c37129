//! # Example: switch_rotation
//!
//! Demonstrates a search box that restarts its lookup on every keystroke.
//!
//! Shows how to:
//! - Wrap a function with [`SignalSwitch::wrap`] so each call gets its own scope
//! - Register setup/teardown pairs on that scope with a [`Transaction`]
//! - Watch the lifecycle through the built-in [`LogWriter`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► search("r")    → scope 1 opened, request 1 started
//!   ├─► search("ru")   → scope 1 superseded, request 1 aborted, scope 2 opened
//!   ├─► search("rus")  → scope 2 superseded, request 2 aborted, scope 3 opened
//!   └─► shutdown       → scope 3 cancelled, request 3 aborted
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example switch_rotation --features logging
//! ```

use std::sync::Arc;

use cancelscope::{
    CancellationController, LogWriter, Rollback, SignalSwitch, Subscribe, SwitchConfig,
    Transaction,
};

fn main() -> anyhow::Result<()> {
    println!("=== switch_rotation example ===\n");

    let shutdown = CancellationController::new();
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let switch = SignalSwitch::builder(shutdown.signal().clone())
        .with_config(SwitchConfig {
            label: "search".into(),
            ..SwitchConfig::default()
        })
        .with_subscribers(subs)
        .build();

    let events = switch.subscribers();
    let mut search = switch.wrap(move |scope, query: &'static str| {
        let mut tx = Transaction::new(scope)
            .with_label(format!("query:{query}"))
            .with_subscribers(events.clone());

        tx.act(move || {
            println!("  -> request {query:?} started");
            Rollback::new(move |reason| println!("  <- request {query:?} aborted ({reason})"))
        })
    });

    for query in ["r", "ru", "rus"] {
        search(query)?;
    }

    println!("\nshutting down");
    shutdown.cancel();
    Ok(())
}
