//! # Cancellation signal with synchronous listeners.
//!
//! [`CancellationSignal`] is a one-shot live→cancelled flag. Unlike a bare
//! [`CancellationToken`], it carries an ordered list of listeners that run
//! synchronously, on the cancelling thread, as part of the transition. Async
//! consumers can still await [`CancellationSignal::cancelled`] or derive a
//! token with [`CancellationSignal::token`].
//!
//! ## Transition
//! ```text
//! cancel(reason)
//!   ├─► lock: reason already set? ──► return false
//!   ├─► store reason, take listeners (unlock)
//!   ├─► listener₁(&reason) → listener₂(&reason) → ...   (registration order)
//!   ├─► token.cancel()  (async waiters released)
//!   └─► first listener panic, if any, resumed on the caller
//! ```
//!
//! ## Rules
//! - Every listener runs at most once.
//! - A listener added to an already-cancelled signal is dropped unrun.
//! - Removing a listener never runs it.
//! - A panicking listener does not stop dispatch: every other listener still
//!   runs, then the first panic is resumed.
//! - Listeners may freely touch the signal (remove, query) while it fires.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::error::CancelError;
use crate::signal::reason::CancelReason;

type Listener = Box<dyn FnOnce(&CancelReason) + Send + 'static>;

/// Handle to a listener registered with [`CancellationSignal::add_listener`].
///
/// Pass it to [`CancellationSignal::remove_listener`] to detach the listener
/// without running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct State {
    reason: Option<CancelReason>,
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

struct Inner {
    state: Mutex<State>,
    token: CancellationToken,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: Mutex::new(State {
                reason: None,
                listeners: Vec::new(),
                next_id: 0,
            }),
            token: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reason(&self) -> Option<CancelReason> {
        self.lock().reason.clone()
    }

    /// Registers `listener`, or hands it back with the reason if already cancelled.
    fn try_add(&self, listener: Listener) -> Result<ListenerId, (CancelReason, Listener)> {
        let mut state = self.lock();
        if let Some(reason) = &state.reason {
            return Err((reason.clone(), listener));
        }
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, listener));
        Ok(id)
    }

    fn remove(&self, id: ListenerId) -> bool {
        let removed = {
            let mut state = self.lock();
            let idx = state.listeners.iter().position(|(lid, _)| *lid == id);
            idx.map(|idx| state.listeners.remove(idx))
        };
        // dropped outside the lock: the closure may own other signals
        removed.is_some()
    }

    fn cancel(&self, reason: CancelReason) -> bool {
        let listeners = {
            let mut state = self.lock();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason.clone());
            std::mem::take(&mut state.listeners)
        };

        let mut first_panic = None;
        for (_, listener) in listeners {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(&reason))) {
                first_panic.get_or_insert(payload);
            }
        }
        self.token.cancel();

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        true
    }
}

/// Observable one-shot cancellation flag.
///
/// Cloning is cheap; all clones observe the same transition. Only the owning
/// [`CancellationController`] (or the signal's own timer, or its inputs for a
/// combined signal) can trigger it.
///
/// ## Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use cancelscope::{CancellationController, CancelReason};
///
/// let ctrl = CancellationController::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let log = seen.clone();
/// ctrl.signal().add_listener(move |reason| log.lock().unwrap().push(reason.clone()));
///
/// assert!(ctrl.cancel());
/// assert!(!ctrl.cancel()); // idempotent
/// assert_eq!(*seen.lock().unwrap(), vec![CancelReason::Requested]);
/// ```
#[derive(Clone)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl CancellationSignal {
    fn live() -> Self {
        Self {
            inner: Arc::new(Inner::new()),
        }
    }

    /// Returns a signal that is already cancelled with `reason`.
    pub fn cancelled_with(reason: CancelReason) -> Self {
        let signal = Self::live();
        signal.inner.cancel(reason);
        signal
    }

    /// Returns a signal that cancels itself with [`CancelReason::Timeout`] after `after`.
    ///
    /// The deadline is driven by a Tokio timer task, which keeps the signal
    /// alive until it fires.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn timeout(after: Duration) -> Self {
        let signal = Self::live();
        let inner = Arc::clone(&signal.inner);

        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            inner.cancel(CancelReason::Timeout { after });
        });
        signal
    }

    /// Combines `signals` into one that fires as soon as any input fires.
    ///
    /// The combined signal adopts the reason of the input that fired. If an
    /// input is already cancelled, the result is born cancelled. After firing
    /// it detaches itself from the remaining inputs, so long-lived inputs do
    /// not accumulate listeners.
    ///
    /// An input keeps the combined signal alive while its forwarding listener
    /// is attached; the combined signal only holds weak links to its inputs.
    pub fn any<'a, I>(signals: I) -> Self
    where
        I: IntoIterator<Item = &'a CancellationSignal>,
    {
        let combined = Self::live();
        let mut links: Vec<(Weak<Inner>, ListenerId)> = Vec::new();

        for source in signals {
            let target = Arc::clone(&combined.inner);
            let forward: Listener = Box::new(move |reason: &CancelReason| {
                target.cancel(reason.clone());
            });
            match source.inner.try_add(forward) {
                Ok(id) => links.push((Arc::downgrade(&source.inner), id)),
                Err((reason, _)) => {
                    unlink(&links);
                    combined.inner.cancel(reason);
                    return combined;
                }
            }
        }

        let detach: Listener = Box::new(move |_: &CancelReason| unlink(&links));
        if let Err((_, detach)) = combined.inner.try_add(detach) {
            // an input fired concurrently while links were being set up
            detach(&CancelReason::Requested);
        }
        combined
    }

    /// Returns `true` once the signal has transitioned to cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().reason.is_some()
    }

    /// Returns the cancellation reason, or `None` while the signal is live.
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.reason()
    }

    /// Fails with [`CancelError::AlreadyCancelled`] if the signal has fired.
    pub fn check(&self) -> Result<(), CancelError> {
        match self.inner.reason() {
            Some(reason) => Err(CancelError::AlreadyCancelled { reason }),
            None => Ok(()),
        }
    }

    /// Registers a listener invoked once, synchronously, when the signal fires.
    ///
    /// Listeners run in registration order. Returns `None` (and drops the
    /// listener without running it) if the signal is already cancelled.
    pub fn add_listener<F>(&self, listener: F) -> Option<ListenerId>
    where
        F: FnOnce(&CancelReason) + Send + 'static,
    {
        self.inner.try_add(Box::new(listener)).ok()
    }

    /// Detaches a listener without running it.
    ///
    /// Returns `false` if the listener already ran, was already removed, or
    /// belongs to another signal.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.remove(id)
    }

    /// Number of listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Waits until the signal is cancelled and all of its listeners have run.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    /// Returns a [`CancellationToken`] cancelled together with this signal.
    ///
    /// The token is a child: cancelling it does not cancel the signal.
    pub fn token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }
}

impl fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("CancellationSignal")
            .field("reason", &state.reason)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

fn unlink(links: &[(Weak<Inner>, ListenerId)]) {
    for (source, id) in links {
        if let Some(source) = source.upgrade() {
            source.remove(*id);
        }
    }
}

/// Sole authority allowed to cancel its [`CancellationSignal`].
///
/// Cancelling twice has no additional effect.
#[derive(Debug)]
pub struct CancellationController {
    signal: CancellationSignal,
}

impl CancellationController {
    /// Creates a controller owning a fresh, live signal.
    pub fn new() -> Self {
        Self {
            signal: CancellationSignal::live(),
        }
    }

    /// Returns the controlled signal.
    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    /// Cancels with [`CancelReason::Requested`].
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn cancel(&self) -> bool {
        self.cancel_with(CancelReason::Requested)
    }

    /// Cancels with an explicit reason.
    ///
    /// Listeners run before this returns. If any listener panics, the rest
    /// still run and the first panic is resumed on the caller afterwards.
    pub fn cancel_with(&self, reason: CancelReason) -> bool {
        self.signal.inner.cancel(reason)
    }

    /// Returns `true` once the controlled signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }
}

impl Default for CancellationController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn FnOnce(&CancelReason) + Send>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |tag: &str| {
            let sink = sink.clone();
            let tag = tag.to_string();
            Box::new(move |_: &CancelReason| sink.lock().unwrap().push(tag))
                as Box<dyn FnOnce(&CancelReason) + Send>
        };
        (log, make)
    }

    #[test]
    fn test_listeners_run_once_in_registration_order() {
        let ctrl = CancellationController::new();
        let (log, make) = recorder();

        ctrl.signal().add_listener(make("a"));
        ctrl.signal().add_listener(make("b"));
        ctrl.signal().add_listener(make("c"));

        assert!(ctrl.cancel());
        assert!(!ctrl.cancel());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(ctrl.signal().listener_count(), 0);
    }

    #[test]
    fn test_removed_listener_never_runs() {
        let ctrl = CancellationController::new();
        let (log, make) = recorder();

        let a = ctrl.signal().add_listener(make("a")).unwrap();
        ctrl.signal().add_listener(make("b"));

        assert!(ctrl.signal().remove_listener(a));
        assert!(!ctrl.signal().remove_listener(a));

        ctrl.cancel();
        assert_eq!(*log.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_add_after_cancel_is_dropped() {
        let signal = CancellationSignal::cancelled_with(CancelReason::custom("gone"));
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        let id = signal.add_listener(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(id.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(signal.reason(), Some(CancelReason::custom("gone")));
    }

    #[test]
    fn test_check_reports_reason() {
        let ctrl = CancellationController::new();
        assert!(ctrl.signal().check().is_ok());

        ctrl.cancel_with(CancelReason::Superseded);
        assert_eq!(
            ctrl.signal().check(),
            Err(CancelError::AlreadyCancelled {
                reason: CancelReason::Superseded
            })
        );
    }

    #[test]
    fn test_signal_is_cancelled_while_listeners_run() {
        let ctrl = CancellationController::new();
        let observed = Arc::new(Mutex::new(None));

        let signal = ctrl.signal().clone();
        let slot = observed.clone();
        ctrl.signal().add_listener(move |_| {
            *slot.lock().unwrap() = Some(signal.is_cancelled());
        });

        ctrl.cancel();
        assert_eq!(*observed.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_any_fires_with_first_reason() {
        let a = CancellationController::new();
        let b = CancellationController::new();
        let combined = CancellationSignal::any([a.signal(), b.signal()]);

        assert!(!combined.is_cancelled());
        b.cancel_with(CancelReason::Superseded);
        assert_eq!(combined.reason(), Some(CancelReason::Superseded));

        a.cancel();
        assert_eq!(combined.reason(), Some(CancelReason::Superseded));
    }

    #[test]
    fn test_any_born_cancelled_when_input_already_fired() {
        let live = CancellationController::new();
        let dead = CancellationSignal::cancelled_with(CancelReason::Requested);

        let combined = CancellationSignal::any([live.signal(), &dead]);
        assert!(combined.is_cancelled());
        assert_eq!(live.signal().listener_count(), 0);
    }

    #[test]
    fn test_any_detaches_from_inputs_after_firing() {
        let parent = CancellationController::new();
        let child = CancellationController::new();

        let combined = CancellationSignal::any([parent.signal(), child.signal()]);
        assert_eq!(parent.signal().listener_count(), 1);

        child.cancel();
        assert!(combined.is_cancelled());
        assert_eq!(parent.signal().listener_count(), 0);
    }

    #[test]
    fn test_any_survives_dropped_handle() {
        let parent = CancellationController::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let combined = CancellationSignal::any([parent.signal()]);
            let h = hits.clone();
            combined.add_listener(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            });
        }

        parent.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_dispatch() {
        let ctrl = CancellationController::new();
        let (log, make) = recorder();

        ctrl.signal().add_listener(make("before"));
        ctrl.signal().add_listener(|_| panic!("boom"));
        ctrl.signal().add_listener(|_| panic!("second"));
        ctrl.signal().add_listener(make("after"));
        let combined = CancellationSignal::any([ctrl.signal()]);
        let token = ctrl.signal().token();

        let res = panic::catch_unwind(AssertUnwindSafe(|| ctrl.cancel()));
        let payload = res.expect_err("listener panic must reach the canceller");
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));

        assert!(ctrl.is_cancelled());
        assert!(token.is_cancelled());
        assert!(combined.is_cancelled());
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
        assert_eq!(ctrl.signal().listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_signal_fires() {
        let signal = CancellationSignal::timeout(Duration::from_millis(100));
        assert!(!signal.is_cancelled());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!signal.is_cancelled());

        signal.cancelled().await;
        assert_eq!(
            signal.reason(),
            Some(CancelReason::Timeout {
                after: Duration::from_millis(100)
            })
        );
    }

    #[tokio::test]
    async fn test_token_and_future_follow_signal() {
        let ctrl = CancellationController::new();
        let token = ctrl.signal().token();
        let signal = ctrl.signal().clone();

        let waiter = tokio::spawn(async move {
            signal.cancelled().await;
            signal.reason()
        });

        ctrl.cancel();
        assert_eq!(waiter.await.unwrap(), Some(CancelReason::Requested));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_child_token_does_not_cancel_signal() {
        let ctrl = CancellationController::new();
        ctrl.signal().token().cancel();
        assert!(!ctrl.is_cancelled());
    }
}
