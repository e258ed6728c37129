//! Error types used by transactions and cancellation signals.
//!
//! There is a single failure kind, [`CancelError::AlreadyCancelled`], raised when
//! work is registered against a signal that has already fired. Everything else
//! (panics inside actions, rollbacks or wrapped functions) propagates unchanged.
//!
//! Like the rest of the crate the error carries helper methods (`as_label`,
//! `as_message`) for logs and metrics.

use thiserror::Error;

use crate::signal::CancelReason;

/// # Errors produced by cancellation-scoped operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CancelError {
    /// The governing signal was already cancelled; the action was not invoked.
    #[error("signal already cancelled ({reason})")]
    AlreadyCancelled {
        /// Why the signal fired.
        reason: CancelReason,
    },
}

impl CancelError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cancelscope::{CancelError, CancelReason};
    ///
    /// let err = CancelError::AlreadyCancelled { reason: CancelReason::Requested };
    /// assert_eq!(err.as_label(), "already_cancelled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CancelError::AlreadyCancelled { .. } => "already_cancelled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CancelError::AlreadyCancelled { reason } => {
                format!("already cancelled: {}", reason.as_label())
            }
        }
    }

    /// Returns the reason carried by the cancelled signal.
    pub fn reason(&self) -> &CancelReason {
        match self {
            CancelError::AlreadyCancelled { reason } => reason,
        }
    }
}
