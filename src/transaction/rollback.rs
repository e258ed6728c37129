//! # Rollbacks and the values actions may return.
//!
//! An action passed to [`Transaction::act`](crate::Transaction::act) returns
//! anything implementing [`IntoRollback`]:
//! - `()` the action has nothing to undo
//! - [`Rollback`] undo step to arm on the signal
//! - `Option<Rollback>` decided at runtime

use std::fmt;

use crate::signal::CancelReason;

/// Undo step paired with an action.
///
/// Runs at most once, receiving the reason the governing signal fired.
pub struct Rollback(Box<dyn FnOnce(&CancelReason) + Send + 'static>);

impl Rollback {
    /// Wraps a closure as a rollback.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&CancelReason) + Send + 'static,
    {
        Self(Box::new(f))
    }

    pub(crate) fn run(self, reason: &CancelReason) {
        (self.0)(reason)
    }
}

impl fmt::Debug for Rollback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rollback(..)")
    }
}

/// Conversion from an action's return value into an optional rollback.
pub trait IntoRollback {
    fn into_rollback(self) -> Option<Rollback>;
}

impl IntoRollback for () {
    fn into_rollback(self) -> Option<Rollback> {
        None
    }
}

impl IntoRollback for Rollback {
    fn into_rollback(self) -> Option<Rollback> {
        Some(self)
    }
}

impl IntoRollback for Option<Rollback> {
    fn into_rollback(self) -> Option<Rollback> {
        self
    }
}
