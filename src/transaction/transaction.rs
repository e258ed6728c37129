//! # Transaction: actions with rollbacks armed on a cancellation signal.
//!
//! [`Transaction`] runs each action immediately and, if the action returns a
//! [`Rollback`], attaches it as a listener on the governing signal. When the
//! signal fires, every armed rollback runs once, in registration order.
//! [`Transaction::finish`] commits: pending rollbacks are detached unrun.
//!
//! ## Lifecycle
//! ```text
//! act(a₁) ──► a₁() ──► rollback r₁ armed      pending = [r₁]
//! act(a₂) ──► a₂() ──► rollback r₂ armed      pending = [r₁, r₂]
//!   │
//!   ├─ signal fires ──► r₁(reason) → r₂(reason)
//!   │
//!   └─ finish()     ──► r₁, r₂ detached       pending = []
//!        finish_with(a₃) ──► finish() then act(a₃)   pending = [r₃]
//! ```
//!
//! ## Rules
//! - `act` on a cancelled signal fails with [`CancelError::AlreadyCancelled`]
//!   and never invokes the action.
//! - An action that itself cancels the signal has its rollback dropped unrun,
//!   the same as a listener added after the signal fired.
//! - Dropping a transaction leaves pending rollbacks armed.
//! - Panics from actions and rollbacks propagate unchanged.

use std::fmt;
use std::sync::Arc;

use crate::error::CancelError;
use crate::events::{Event, EventKind};
use crate::signal::{CancelReason, CancellationSignal, ListenerId};
use crate::subscribers::SubscriberSet;
use crate::transaction::rollback::IntoRollback;

/// Set of actions whose rollbacks are tied to one [`CancellationSignal`].
///
/// ## Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use cancelscope::{CancellationController, Rollback, Transaction};
///
/// let ctrl = CancellationController::new();
/// let mut tx = Transaction::new(ctrl.signal().clone());
/// let open = Arc::new(Mutex::new(0));
///
/// let o = open.clone();
/// tx.act(move || {
///     *o.lock().unwrap() += 1;
///     Rollback::new(move |_| *o.lock().unwrap() -= 1)
/// })?;
/// assert_eq!(*open.lock().unwrap(), 1);
///
/// ctrl.cancel();
/// assert_eq!(*open.lock().unwrap(), 0);
/// # Ok::<(), cancelscope::CancelError>(())
/// ```
pub struct Transaction {
    signal: CancellationSignal,
    pending: Vec<ListenerId>,
    label: Arc<str>,
    subs: SubscriberSet,
}

impl Transaction {
    /// Creates a transaction governed by `signal`.
    pub fn new(signal: CancellationSignal) -> Self {
        Self {
            signal,
            pending: Vec::new(),
            label: Arc::from("transaction"),
            subs: SubscriberSet::default(),
        }
    }

    /// Sets the label reported in events.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets event subscribers for observability.
    pub fn with_subscribers(mut self, subs: SubscriberSet) -> Self {
        self.subs = subs;
        self
    }

    /// Returns the governing signal.
    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    /// Number of rollbacks registered since the last [`finish`](Self::finish).
    ///
    /// Rollbacks that already ran because the signal fired are still counted.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Runs `action` now and arms the rollback it returns, if any.
    ///
    /// # Errors
    /// [`CancelError::AlreadyCancelled`] if the signal has already fired; the
    /// action is not invoked.
    pub fn act<A, R>(&mut self, action: A) -> Result<(), CancelError>
    where
        A: FnOnce() -> R,
        R: IntoRollback,
    {
        if let Err(err) = self.signal.check() {
            self.emit(Event::new(EventKind::ActionRejected).with_reason(err.reason().clone()));
            return Err(err);
        }

        if let Some(rollback) = action().into_rollback() {
            let subs = self.subs.clone();
            let label = Arc::clone(&self.label);
            let armed = move |reason: &CancelReason| {
                rollback.run(reason);
                subs.emit(
                    &Event::new(EventKind::RolledBack)
                        .with_scope(label)
                        .with_reason(reason.clone()),
                );
            };

            // None when the action cancelled its own signal
            if let Some(id) = self.signal.add_listener(armed) {
                self.pending.push(id);
            }
        }

        self.emit(Event::new(EventKind::ActionApplied).with_count(self.pending.len()));
        Ok(())
    }

    /// Commits: detaches every pending rollback without running it.
    ///
    /// Calling it with nothing pending is a no-op.
    pub fn finish(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let detached = pending
            .into_iter()
            .filter(|id| self.signal.remove_listener(*id))
            .count();

        self.emit(Event::new(EventKind::Committed).with_count(detached));
    }

    /// Commits, then registers `action` as with [`act`](Self::act).
    ///
    /// The rollback of `action` survives this call; only a later
    /// [`finish`](Self::finish) detaches it.
    ///
    /// # Errors
    /// [`CancelError::AlreadyCancelled`] if the signal has already fired. The
    /// commit still happens.
    pub fn finish_with<A, R>(&mut self, action: A) -> Result<(), CancelError>
    where
        A: FnOnce() -> R,
        R: IntoRollback,
    {
        self.finish();
        self.act(action)
    }

    fn emit(&self, event: Event) {
        if !self.subs.is_empty() {
            self.subs.emit(&event.with_scope(Arc::clone(&self.label)));
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("label", &self.label)
            .field("signal", &self.signal)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Shorthand for `Transaction::new(signal.clone())`.
pub fn transaction(signal: &CancellationSignal) -> Transaction {
    Transaction::new(signal.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::CancellationController;
    use crate::subscribers::Subscribe;
    use crate::transaction::Rollback;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn prefixing(value: &Arc<Mutex<String>>, prefix: &'static str) -> impl FnOnce() -> Rollback {
        let value = value.clone();
        move || {
            {
                let mut v = value.lock().unwrap();
                let next = format!("{prefix}{}", *v);
                *v = next;
            }
            Rollback::new(move |_| {
                let mut v = value.lock().unwrap();
                let rest = v.strip_prefix(prefix).map(str::to_string);
                if let Some(rest) = rest {
                    *v = rest;
                }
            })
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(EventKind, Option<usize>)>>);

    impl Subscribe for Recorder {
        fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push((ev.kind, ev.count));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollback_runs_when_timeout_fires() {
        let mut tx = Transaction::new(CancellationSignal::timeout(Duration::from_millis(100)));
        let count = Arc::new(AtomicI32::new(0));

        let c = count.clone();
        tx.act(move || {
            c.fetch_add(1, Ordering::SeqCst);
            Rollback::new(move |_| {
                c.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tx.signal().cancelled().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_act_on_cancelled_signal_fails_without_running() {
        let mut tx = Transaction::new(CancellationSignal::cancelled_with(CancelReason::Requested));
        let ran = Arc::new(AtomicUsize::new(0));

        let r = ran.clone();
        let err = tx
            .act(move || {
                r.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap_err();

        assert_eq!(
            err,
            CancelError::AlreadyCancelled {
                reason: CancelReason::Requested
            }
        );
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn test_rollbacks_run_once_in_registration_order() {
        let ctrl = CancellationController::new();
        let mut tx = transaction(ctrl.signal());
        let trace = Arc::new(Mutex::new(Vec::new()));

        for n in 0..4 {
            let t = trace.clone();
            tx.act(move || Rollback::new(move |_| t.lock().unwrap().push(n)))
                .unwrap();
        }
        assert_eq!(tx.pending(), 4);

        ctrl.cancel();
        ctrl.cancel();
        assert_eq!(*trace.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_action_without_rollback_arms_nothing() {
        let ctrl = CancellationController::new();
        let mut tx = transaction(ctrl.signal());

        tx.act(|| ()).unwrap();
        tx.act(|| None::<Rollback>).unwrap();

        assert_eq!(tx.pending(), 0);
        assert_eq!(ctrl.signal().listener_count(), 0);
    }

    #[test]
    fn test_finish_detaches_pending_rollbacks() {
        let ctrl = CancellationController::new();
        let mut tx = transaction(ctrl.signal());
        let value = Arc::new(Mutex::new(String::new()));

        tx.act(prefixing(&value, "foo")).unwrap();
        tx.act(prefixing(&value, "hello: ")).unwrap();
        assert_eq!(*value.lock().unwrap(), "hello: foo");

        tx.finish();
        assert_eq!(tx.pending(), 0);
        assert_eq!(ctrl.signal().listener_count(), 0);

        ctrl.cancel();
        assert_eq!(*value.lock().unwrap(), "hello: foo");
    }

    #[test]
    fn test_finish_with_installs_surviving_rollback() {
        let ctrl = CancellationController::new();
        let mut tx = transaction(ctrl.signal());
        let value = Arc::new(Mutex::new(String::new()));

        tx.act(prefixing(&value, "foo")).unwrap();
        tx.act(prefixing(&value, "hello: ")).unwrap();

        let v = value.clone();
        tx.finish_with(move || Rollback::new(move |_| *v.lock().unwrap() = "FINISH".to_string()))
            .unwrap();
        assert_eq!(tx.pending(), 1);
        assert_eq!(*value.lock().unwrap(), "hello: foo");

        ctrl.cancel();
        assert_eq!(*value.lock().unwrap(), "FINISH");
    }

    #[test]
    fn test_later_finish_clears_final_rollback() {
        let ctrl = CancellationController::new();
        let mut tx = transaction(ctrl.signal());
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        tx.finish_with(move || {
            Rollback::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            })
        })
        .unwrap();
        tx.finish();
        tx.finish();

        ctrl.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_finish_with_on_cancelled_signal_still_commits() {
        let ctrl = CancellationController::new();
        let mut tx = transaction(ctrl.signal());

        tx.act(|| Rollback::new(|_| {})).unwrap();
        ctrl.cancel();

        let res = tx.finish_with(|| ());
        assert!(matches!(res, Err(CancelError::AlreadyCancelled { .. })));
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn test_action_cancelling_its_signal_drops_rollback() {
        let ctrl = Arc::new(CancellationController::new());
        let mut tx = transaction(ctrl.signal());
        let count = Arc::new(AtomicI32::new(0));

        let (c, k) = (count.clone(), ctrl.clone());
        tx.act(move || {
            c.fetch_add(1, Ordering::SeqCst);
            k.cancel();
            Rollback::new(move |_| {
                c.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .unwrap();

        assert!(ctrl.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn test_pending_counts_until_finish() {
        let ctrl = CancellationController::new();
        let mut tx = transaction(ctrl.signal());

        tx.act(|| Rollback::new(|_| {})).unwrap();
        tx.act(|| Rollback::new(|_| {})).unwrap();
        assert_eq!(tx.pending(), 2);

        ctrl.cancel();
        assert_eq!(tx.pending(), 2);

        tx.finish();
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn test_panicking_action_arms_nothing() {
        let ctrl = CancellationController::new();
        let mut tx = transaction(ctrl.signal());

        let res = panic::catch_unwind(AssertUnwindSafe(|| {
            tx.act(|| -> Rollback { panic!("setup failed") })
        }));

        assert!(res.is_err());
        assert_eq!(tx.pending(), 0);
        assert_eq!(ctrl.signal().listener_count(), 0);
    }

    #[test]
    fn test_events_follow_lifecycle() {
        let ctrl = CancellationController::new();
        let rec = Arc::new(Recorder::default());
        let mut tx = transaction(ctrl.signal())
            .with_label("upload")
            .with_subscribers(SubscriberSet::new(vec![rec.clone() as Arc<dyn Subscribe>]));

        tx.act(|| Rollback::new(|_| {})).unwrap();
        tx.act(|| Rollback::new(|_| {})).unwrap();
        tx.finish();
        tx.act(|| Rollback::new(|_| {})).unwrap();
        ctrl.cancel();
        let _ = tx.act(|| ());

        assert_eq!(
            *rec.0.lock().unwrap(),
            vec![
                (EventKind::ActionApplied, Some(1)),
                (EventKind::ActionApplied, Some(2)),
                (EventKind::Committed, Some(2)),
                (EventKind::ActionApplied, Some(1)),
                (EventKind::RolledBack, None),
                (EventKind::ActionRejected, None),
            ]
        );
    }
}
