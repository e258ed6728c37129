//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [scope-opened] scope="search" generation=2
//! [scope-superseded] scope="search" generation=1 reason=superseded
//! [rolled-back] scope="search" reason=superseded
//! [applied] scope="search" pending=1
//! [rejected] scope="search" reason=timeout
//! [committed] scope="search" detached=3
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let reason = e.reason.as_ref().map(|r| r.as_label());
        match e.kind {
            EventKind::ScopeOpened => {
                println!("[scope-opened] scope={:?} generation={:?}", e.scope, e.generation);
            }
            EventKind::ScopeSuperseded => {
                println!(
                    "[scope-superseded] scope={:?} generation={:?} reason={:?}",
                    e.scope, e.generation, reason
                );
            }
            EventKind::RolledBack => {
                println!("[rolled-back] scope={:?} reason={:?}", e.scope, reason);
            }
            EventKind::ActionApplied => {
                println!("[applied] scope={:?} pending={:?}", e.scope, e.count);
            }
            EventKind::ActionRejected => {
                println!("[rejected] scope={:?} reason={:?}", e.scope, reason);
            }
            EventKind::Committed => {
                println!("[committed] scope={:?} detached={:?}", e.scope, e.count);
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={} info={}",
                    e.scope.as_deref().unwrap_or("unknown"),
                    e.message.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
