//! # SubscriberSet: synchronous fan-out over multiple subscribers
//!
//! [`SubscriberSet`] delivers each [`Event`] to every subscriber in turn.
//! It is cheap to clone, so one set can be shared by a switch and every
//! transaction opened under it.
//!
//! ## What it guarantees
//! - Subscribers see events in the order they were emitted.
//! - Panics inside subscribers are caught (isolation) and reported to the others.
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        ├──► S1.on_event()   (catch_unwind)
//!        ├──► S2.on_event()   (catch_unwind)
//!        └──► SN.on_event()   (catch_unwind)
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::events::Event;

use super::Subscribe;

/// Composite fan-out over a fixed list of subscribers.
#[derive(Clone)]
pub struct SubscriberSet {
    subs: Arc<[Arc<dyn Subscribe>]>,
}

impl SubscriberSet {
    /// Creates a new set.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs: subs.into() }
    }

    /// Delivers one event to all subscribers.
    pub fn emit(&self, event: &Event) {
        for (idx, sub) in self.subs.iter().enumerate() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sub.on_event(event))) {
                let info = panic_message(payload.as_ref());
                eprintln!("[cancelscope] subscriber '{}' panicked: {info}", sub.name());
                self.report_panic(idx, Event::subscriber_panicked(sub.name(), info));
            }
        }
    }

    /// Tells every other subscriber about a panic; nested panics are swallowed.
    fn report_panic(&self, culprit: usize, event: Event) {
        for (idx, sub) in self.subs.iter().enumerate() {
            if idx != culprit {
                let _ = panic::catch_unwind(AssertUnwindSafe(|| sub.on_event(&event)));
            }
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len()
    }
}

impl Default for SubscriberSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
