//! # SignalSwitch: supersede-on-reentry cancellation scopes.
//!
//! Every call through a [`SignalSwitch`] opens a new scope: a combined signal
//! that fires when either the parent signal fires or the switch moves on to
//! the next call. The previous scope is cancelled, and all of its listeners
//! have run, before the next scope exists.
//!
//! ## Rules
//! - At most one controller created by the switch is live at any time.
//! - The first call has nothing to supersede.
//! - The switch never listens to the parent itself; each scope observes the
//!   parent through [`CancellationSignal::any`].
//! - Clones share the same slot.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::events::{Event, EventKind};
use crate::signal::{CancelReason, CancellationController, CancellationSignal};
use crate::subscribers::SubscriberSet;

use super::{builder::SignalSwitchBuilder, config::SwitchConfig};

/// The live scope, if any.
struct Current {
    controller: CancellationController,
    scope: CancellationSignal,
}

struct Slot {
    current: Option<Current>,
    generation: u64,
}

struct Shared {
    parent: CancellationSignal,
    cfg: SwitchConfig,
    subs: SubscriberSet,
    slot: Mutex<Slot>,
}

/// Hands out a fresh per-call cancellation scope under a parent signal.
///
/// ## Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use cancelscope::{transaction, CancellationController, Rollback, SignalSwitch};
///
/// let parent = CancellationController::new();
/// let switch = SignalSwitch::new(parent.signal().clone());
/// let trace = Arc::new(Mutex::new(Vec::new()));
///
/// let t = trace.clone();
/// let mut search = switch.wrap(move |scope, query: &'static str| {
///     let t = t.clone();
///     let mut tx = transaction(&scope);
///     tx.act(move || {
///         t.lock().unwrap().push(format!("start {query}"));
///         Rollback::new(move |_| t.lock().unwrap().push(format!("abort {query}")))
///     })
/// });
///
/// search("ru")?;
/// search("rus")?;
/// assert_eq!(*trace.lock().unwrap(), ["start ru", "abort ru", "start rus"]);
/// # Ok::<(), cancelscope::CancelError>(())
/// ```
#[derive(Clone)]
pub struct SignalSwitch {
    shared: Arc<Shared>,
}

impl SignalSwitch {
    /// Creates a switch over `parent` with the default configuration.
    pub fn new(parent: CancellationSignal) -> Self {
        SignalSwitchBuilder::new(parent).build()
    }

    /// Returns a builder for a switch over `parent`.
    pub fn builder(parent: CancellationSignal) -> SignalSwitchBuilder {
        SignalSwitchBuilder::new(parent)
    }

    pub(super) fn new_internal(
        parent: CancellationSignal,
        cfg: SwitchConfig,
        subs: SubscriberSet,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                parent,
                cfg,
                subs,
                slot: Mutex::new(Slot {
                    current: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Cancels the previous scope, then opens and returns a new one.
    ///
    /// Listeners of the previous scope run before this returns, on this
    /// thread, with [`CancelReason::Superseded`].
    ///
    /// # Panics
    /// Panics if a per-scope timeout is configured and no Tokio runtime is
    /// running. Panics raised by listeners of the superseded scope propagate.
    pub fn rotate(&self) -> CancellationSignal {
        let previous = {
            let mut slot = self.lock();
            let generation = slot.generation;
            slot.current.take().map(|current| (current, generation))
        };
        if let Some((previous, generation)) = previous {
            self.emit(
                Event::new(EventKind::ScopeSuperseded)
                    .with_generation(generation)
                    .with_reason(CancelReason::Superseded),
            );
            previous.controller.cancel_with(CancelReason::Superseded);
        }

        let controller = CancellationController::new();
        let deadline = self.shared.cfg.scope_timeout().map(CancellationSignal::timeout);

        let mut inputs = vec![&self.shared.parent, controller.signal()];
        if let Some(deadline) = &deadline {
            inputs.push(deadline);
        }
        let scope = CancellationSignal::any(inputs);

        let (generation, displaced) = {
            let mut slot = self.lock();
            slot.generation += 1;
            let displaced = slot.current.replace(Current {
                controller,
                scope: scope.clone(),
            });
            (slot.generation, displaced)
        };
        // a listener of the superseded scope rotated reentrantly
        if let Some(displaced) = displaced {
            displaced.controller.cancel_with(CancelReason::Superseded);
        }

        self.emit(Event::new(EventKind::ScopeOpened).with_generation(generation));
        scope
    }

    /// Returns a callable performing [`rotate`](Self::rotate) on each call.
    pub fn rotator(&self) -> impl Fn() -> CancellationSignal {
        let switch = self.clone();
        move || switch.rotate()
    }

    /// Wraps `f` so that each call runs it inside a freshly rotated scope.
    ///
    /// The wrapper forwards its argument (use a tuple for several) after the
    /// scope signal and returns `f`'s result unchanged.
    pub fn wrap<F, A, R>(&self, mut f: F) -> impl FnMut(A) -> R
    where
        F: FnMut(CancellationSignal, A) -> R,
    {
        let switch = self.clone();
        move |args| f(switch.rotate(), args)
    }

    /// Returns the parent signal.
    pub fn parent(&self) -> &CancellationSignal {
        &self.shared.parent
    }

    /// Returns the signal of the most recent scope, if one was opened.
    ///
    /// The scope may already be cancelled through the parent or its deadline.
    pub fn current(&self) -> Option<CancellationSignal> {
        self.lock().current.as_ref().map(|current| current.scope.clone())
    }

    /// Number of scopes opened so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SwitchConfig {
        &self.shared.cfg
    }

    /// Returns the subscribers, for transactions opened inside wrapped calls.
    pub fn subscribers(&self) -> SubscriberSet {
        self.shared.subs.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.shared.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: Event) {
        if !self.shared.subs.is_empty() {
            let label = self.shared.cfg.label.as_ref();
            self.shared.subs.emit(&event.with_scope(label));
        }
    }
}

impl fmt::Debug for SignalSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSwitch")
            .field("label", &self.shared.cfg.label)
            .field("parent", &self.shared.parent)
            .field("generation", &self.generation())
            .finish()
    }
}
