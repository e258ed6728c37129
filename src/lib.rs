//! # cancelscope
//!
//! **cancelscope** ties resource setup and teardown to cancellation signals.
//!
//! It provides two small primitives built on a listener-carrying
//! [`CancellationSignal`]:
//! - [`Transaction`] runs actions immediately and arms their [`Rollback`]s on a
//!   signal, so cancellation undoes them exactly once, in registration order.
//!   [`Transaction::finish`] commits by detaching the pending rollbacks.
//! - [`SignalSwitch`] gives every call of a function its own cancellation scope
//!   under a parent signal; calling again cancels the previous scope first.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   parent signal ─────────────┐
//!                              ▼
//!     ┌───────────────────────────────────────────────┐
//!     │  SignalSwitch                                 │
//!     │  - slot: at most one live controller          │
//!     │  - rotate(): cancel old → any(parent, new)    │
//!     └──────────────────────┬────────────────────────┘
//!                            │ scope signal (per call)
//!                            ▼
//!     ┌───────────────────────────────────────────────┐
//!     │  Transaction                                  │
//!     │  - act(action)       → rollback armed         │
//!     │  - finish([action])  → rollbacks detached     │
//!     └──────────────────────┬────────────────────────┘
//!                            │ events
//!                            ▼
//!                 SubscriberSet ──► LogWriter / custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! wrapped(args) #1 ──► scope₁ ──► tx.act(open)          [close armed on scope₁]
//! wrapped(args) #2 ──► cancel scope₁ ──► close(Superseded)
//!                  └─► scope₂ ──► tx.act(open)          [close armed on scope₂]
//! parent.cancel()  ──► scope₂ fires ──► close(Requested)
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                              |
//! |-------------------|----------------------------------------------------------|-------------------------------------------------|
//! | **Signals**       | One-shot cancellation with ordered sync listeners.       | [`CancellationSignal`], [`CancellationController`] |
//! | **Transactions**  | Actions with rollbacks tied to a signal.                 | [`Transaction`], [`Rollback`], [`IntoRollback`] |
//! | **Switching**     | Fresh per-call scope, previous one superseded.           | [`SignalSwitch`], [`SwitchConfig`]              |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics).           | [`Subscribe`], [`SubscriberSet`]                |
//! | **Errors**        | Typed error for work registered too late.                | [`CancelError`]                                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use cancelscope::{CancellationController, Rollback, SignalSwitch, Transaction};
//!
//! let shutdown = CancellationController::new();
//! let switch = SignalSwitch::new(shutdown.signal().clone());
//! let open = Arc::new(Mutex::new(Vec::new()));
//!
//! let o = open.clone();
//! let mut connect = switch.wrap(move |scope, host: String| {
//!     let o = o.clone();
//!     let mut tx = Transaction::new(scope);
//!     tx.act(move || {
//!         o.lock().unwrap().push(host.clone());
//!         Rollback::new(move |_| o.lock().unwrap().retain(|h| h != &host))
//!     })
//! });
//!
//! connect("a.example".to_string())?;
//! connect("b.example".to_string())?;
//! assert_eq!(*open.lock().unwrap(), ["b.example"]);
//!
//! shutdown.cancel();
//! assert!(open.lock().unwrap().is_empty());
//! # Ok::<(), cancelscope::CancelError>(())
//! ```

mod error;
mod events;
mod signal;
mod subscribers;
mod switch;
mod transaction;

// ---- Public re-exports ----

pub use error::CancelError;
pub use events::{Event, EventKind};
pub use signal::{CancelReason, CancellationController, CancellationSignal, ListenerId};
pub use subscribers::{Subscribe, SubscriberSet};
pub use switch::{SignalSwitch, SignalSwitchBuilder, SwitchConfig};
pub use transaction::{transaction, IntoRollback, Rollback, Transaction};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
