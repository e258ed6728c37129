//! # Cancellation signals and controllers.
//!
//! This module provides the cancellation capability the rest of the crate is
//! built on:
//! - [`CancellationSignal`] observable one-shot flag with ordered, synchronous listeners
//! - [`CancellationController`] the only handle allowed to fire a signal
//! - [`CancelReason`] why a signal fired
//! - [`ListenerId`] registration handle used to detach a listener unrun
//!
//! ## Composition
//! ```text
//! parent ──┐
//!          ├─► CancellationSignal::any([..]) ──► fires when any input fires
//! child  ──┘
//! ```

mod reason;
mod signal;

pub use reason::CancelReason;
pub use signal::{CancellationController, CancellationSignal, ListenerId};
