//! Lifecycle events: types only.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publishers**: [`Transaction`](crate::Transaction) (actions, rollbacks, commits)
//!   and [`SignalSwitch`](crate::SignalSwitch) (scope rotation).
//! - **Consumers**: any [`Subscribe`](crate::Subscribe) implementation, reached
//!   through a [`SubscriberSet`](crate::SubscriberSet).

mod event;

pub use event::{Event, EventKind};
