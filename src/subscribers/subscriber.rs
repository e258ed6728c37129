//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom event handlers
//! into transactions and switches.
//!
//! ## Rules
//! - Events are delivered synchronously, on the thread that produced them, in
//!   the order they were produced.
//! - A subscriber must not block: it runs inside `act`, `finish`, rollbacks and
//!   scope rotation.
//! - Panics are caught by [`SubscriberSet`](crate::SubscriberSet) and reported to the
//!   other subscribers as `EventKind::SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use cancelscope::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct RollbackCounter(AtomicUsize);
//!
//! impl Subscribe for RollbackCounter {
//!     fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::RolledBack) {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "rollback-counter" }
//! }
//! ```

use crate::events::Event;

/// Event subscriber for lifecycle observability.
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in panic reports.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
