//! # Switch configuration.
//!
//! Provides [`SwitchConfig`], the settings applied to every scope a
//! [`SignalSwitch`](crate::SignalSwitch) opens.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no per-scope deadline (see [`SwitchConfig::scope_timeout`])

use std::borrow::Cow;
use std::time::Duration;

/// Configuration for a [`SignalSwitch`](crate::SignalSwitch).
///
/// ## Field semantics
/// - `label`: Name reported in events emitted by the switch
/// - `timeout`: Deadline applied to each scope from the moment it opens (`0s` = none)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct SwitchConfig {
    /// Name reported in [`Event::scope`](crate::Event::scope).
    pub label: Cow<'static, str>,

    /// Per-scope deadline.
    ///
    /// - `Duration::ZERO` = scopes live until superseded or the parent fires
    /// - `> 0` = each scope is also cancelled with `CancelReason::Timeout`
    ///   once the duration elapses (requires a Tokio runtime)
    pub timeout: Duration,
}

impl SwitchConfig {
    /// Returns the per-scope deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → each scope is cancelled `d` after it opens
    #[inline]
    pub fn scope_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }
}

impl Default for SwitchConfig {
    /// Default configuration:
    ///
    /// - `label = "switch"`
    /// - `timeout = 0s` (no deadline)
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("switch"),
            timeout: Duration::ZERO,
        }
    }
}
