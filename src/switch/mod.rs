//! # Signal switch: one fresh cancellation scope per call.
//!
//! - [`SignalSwitch`] rotates scopes under a parent signal
//! - [`SignalSwitchBuilder`] optional configuration and subscribers
//! - [`SwitchConfig`] per-scope settings
//!
//! ## Rotation
//! ```text
//! call N+1
//!   ├─► cancel controller N (Superseded) ──► scope N listeners run, fully
//!   ├─► controller N+1 = new
//!   ├─► scope N+1 = any(parent, controller N+1 [, deadline])
//!   └─► f(scope N+1, args)
//! ```

mod builder;
mod config;
mod switch;

pub use builder::SignalSwitchBuilder;
pub use config::SwitchConfig;
pub use switch::SignalSwitch;
