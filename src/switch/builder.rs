use std::sync::Arc;

use crate::signal::CancellationSignal;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::{config::SwitchConfig, switch::SignalSwitch};

/// Builder for constructing a [`SignalSwitch`] with optional features.
pub struct SignalSwitchBuilder {
    parent: CancellationSignal,
    cfg: SwitchConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SignalSwitchBuilder {
    /// Creates a new builder over `parent` with the default configuration.
    pub fn new(parent: CancellationSignal) -> Self {
        Self {
            parent,
            cfg: SwitchConfig::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: SwitchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// The same set is exposed through [`SignalSwitch::subscribers`] so wrapped
    /// functions can hand it to the transactions they open.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the switch. No scope is opened until the first rotation.
    pub fn build(self) -> SignalSwitch {
        SignalSwitch::new_internal(self.parent, self.cfg, SubscriberSet::new(self.subscribers))
    }
}
