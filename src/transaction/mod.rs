//! # Cancellation-scoped transactions.
//!
//! - [`Transaction`] runs actions and arms their rollbacks on a signal
//! - [`Rollback`] / [`IntoRollback`] what an action hands back

mod rollback;
mod transaction;

pub use rollback::{IntoRollback, Rollback};
pub use transaction::{transaction, Transaction};
