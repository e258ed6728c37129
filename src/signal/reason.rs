use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Why a [`CancellationSignal`](crate::CancellationSignal) fired.
///
/// The reason is captured once, at the live→cancelled transition, and handed
/// to every listener. Combined signals adopt the reason of whichever input
/// fired first.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit [`CancellationController::cancel`](crate::CancellationController::cancel).
    Requested,

    /// The signal was created with [`CancellationSignal::timeout`](crate::CancellationSignal::timeout)
    /// and its deadline elapsed.
    Timeout {
        /// The configured duration.
        after: Duration,
    },

    /// A [`SignalSwitch`](crate::SignalSwitch) opened a newer scope.
    Superseded,

    /// Caller-supplied reason.
    Custom(Arc<str>),
}

impl CancelReason {
    /// Builds a [`CancelReason::Custom`] from any string-like value.
    pub fn custom(reason: impl Into<Arc<str>>) -> Self {
        CancelReason::Custom(reason.into())
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cancelscope::CancelReason;
    ///
    /// assert_eq!(CancelReason::Superseded.as_label(), "superseded");
    /// assert_eq!(CancelReason::custom("shutdown").as_label(), "custom");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CancelReason::Requested => "requested",
            CancelReason::Timeout { .. } => "timeout",
            CancelReason::Superseded => "superseded",
            CancelReason::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => f.write_str("cancellation requested"),
            CancelReason::Timeout { after } => write!(f, "timed out after {after:?}"),
            CancelReason::Superseded => f.write_str("superseded by a newer scope"),
            CancelReason::Custom(reason) => f.write_str(reason),
        }
    }
}
