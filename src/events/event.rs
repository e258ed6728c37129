//! # Scope lifecycle events emitted by transactions and switches.
//!
//! The [`EventKind`] enum classifies event types across two categories:
//! - **Transaction events**: actions applied or rejected, rollbacks run, commits
//! - **Switch events**: scopes opened and superseded
//!
//! The [`Event`] struct carries additional metadata such as the scope label,
//! generation, counts and the cancellation reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events are delivered synchronously, so within one thread `seq` matches delivery order.
//!
//! ## Example
//! ```rust
//! use cancelscope::{CancelReason, Event, EventKind};
//!
//! let ev = Event::new(EventKind::ScopeSuperseded)
//!     .with_scope("search")
//!     .with_generation(3)
//!     .with_reason(CancelReason::Superseded);
//!
//! assert_eq!(ev.kind, EventKind::ScopeSuperseded);
//! assert_eq!(ev.scope.as_deref(), Some("search"));
//! assert_eq!(ev.generation, Some(3));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::signal::CancelReason;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Transaction events ===
    /// An action ran inside a transaction.
    ///
    /// Sets:
    /// - `scope`: transaction label
    /// - `count`: pending rollbacks after the action (1 more than before if it returned one)
    ActionApplied,

    /// An action was refused because the signal had already fired.
    ///
    /// Sets:
    /// - `scope`: transaction label
    /// - `reason`: reason carried by the signal
    ActionRejected,

    /// A registered rollback ran because the signal fired.
    ///
    /// Sets:
    /// - `scope`: transaction label
    /// - `reason`: why the signal fired
    RolledBack,

    /// Pending rollbacks were detached by `finish`.
    ///
    /// Sets:
    /// - `scope`: transaction label
    /// - `count`: number of rollbacks detached
    Committed,

    // === Switch events ===
    /// A switch opened a fresh per-call scope.
    ///
    /// Sets:
    /// - `scope`: switch label
    /// - `generation`: 1-based scope number
    ScopeOpened,

    /// A switch cancelled the previous scope before opening the next one.
    ///
    /// Sets:
    /// - `scope`: switch label
    /// - `generation`: number of the superseded scope
    /// - `reason`: always [`CancelReason::Superseded`]
    ScopeSuperseded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `scope`: subscriber name
    /// - `message`: panic payload, if it was a string
    SubscriberPanicked,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Label of the transaction, switch or subscriber involved.
    pub scope: Option<Arc<str>>,
    /// Switch scope number (starting from 1).
    pub generation: Option<u64>,
    /// Rollback count (pending or detached, depending on the kind).
    pub count: Option<usize>,
    /// Cancellation reason, when a signal is involved.
    pub reason: Option<CancelReason>,
    /// Free-form detail (panic messages).
    pub message: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            scope: None,
            generation: None,
            count: None,
            reason: None,
            message: None,
        }
    }

    /// Attaches a scope label.
    #[inline]
    pub fn with_scope(mut self, scope: impl Into<Arc<str>>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Attaches a switch generation.
    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attaches a rollback count.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Attaches a cancellation reason.
    #[inline]
    pub fn with_reason(mut self, reason: CancelReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Attaches a free-form message.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_scope(subscriber)
            .with_message(info)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
