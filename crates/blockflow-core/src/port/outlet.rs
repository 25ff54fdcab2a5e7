use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::buffer::TimestampedValue;
use super::inlet::Inlet;
use super::listeners::{EventHandler, Listeners, SubscriptionToken};
use crate::error::Result;
use crate::runtime::Timestamp;
use crate::value::{Converter, TypeKind, TypedValue};

/// Handler object notified with each value an outlet publishes.
pub type OutletHandler = dyn EventHandler<TimestampedValue>;

/// Result of capturing an outlet after a block update.
#[derive(Debug, Clone, PartialEq)]
pub enum OutletUpdate {
    Published(TimestampedValue),
    /// The block did not write this outlet; nothing is propagated.
    Discarded,
}

impl OutletUpdate {
    pub fn is_discarded(&self) -> bool {
        matches!(self, OutletUpdate::Discarded)
    }
}

/// A downstream inlet fed by an outlet, with the converter chosen at link time.
#[derive(Clone)]
pub struct LinkTarget {
    pub inlet: Arc<Inlet>,
    pub converter: Option<Converter>,
}

/// A typed output endpoint.
pub struct Outlet {
    name: String,
    owner: String,
    kind: TypeKind,
    staging: Mutex<Option<TypedValue>>,
    last: Mutex<TimestampedValue>,
    listeners: Listeners<TimestampedValue>,
    targets: Mutex<Vec<LinkTarget>>,
}

impl fmt::Debug for Outlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outlet")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("targets", &self.targets.lock().len())
            .finish()
    }
}

impl Outlet {
    pub fn new(name: impl Into<String>, owner: impl Into<String>, initial: TypedValue) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            kind: initial.kind(),
            staging: Mutex::new(None),
            last: Mutex::new(TimestampedValue::new(initial, 0)),
            listeners: Listeners::new(),
            targets: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Stage a value for the current update. Only the last write before `update` counts.
    pub fn write(&self, value: TypedValue) -> Result<()> {
        value.expect_kind(&self.kind, &format!("outlet {} of {}", self.name, self.owner))?;
        *self.staging.lock() = Some(value);
        Ok(())
    }

    /// Capture the staged value into the last-published slot.
    pub fn update(&self, now: Timestamp) -> OutletUpdate {
        match self.staging.lock().take() {
            Some(value) => {
                let published = TimestampedValue::new(value, now);
                *self.last.lock() = published.clone();
                OutletUpdate::Published(published)
            }
            None => OutletUpdate::Discarded,
        }
    }

    /// Notify listeners and push the value into every linked inlet.
    pub fn publish(&self, data: &TimestampedValue) {
        self.listeners.notify(data);
        let targets = self.targets.lock().clone();
        for target in targets {
            let value = match &target.converter {
                Some(convert) => match convert(&data.value) {
                    Ok(converted) => converted,
                    Err(e) => {
                        tracing::warn!(
                            outlet = %self.name,
                            owner = %self.owner,
                            inlet = %target.inlet.name(),
                            error = %e,
                            "link conversion failed"
                        );
                        continue;
                    }
                },
                None => data.value.clone(),
            };
            if let Err(e) = target.inlet.insert_data(value, data.timestamp) {
                tracing::warn!(
                    outlet = %self.name,
                    inlet = %target.inlet.name(),
                    error = %e,
                    "linked inlet rejected value"
                );
            }
        }
    }

    pub fn last(&self) -> TimestampedValue {
        self.last.lock().clone()
    }

    pub fn clear_staging(&self) {
        self.staging.lock().take();
    }

    pub fn register_callback(
        &self,
        callback: impl Fn(&TimestampedValue) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        self.listeners.register(callback)
    }

    pub fn register_handler(&self, handler: Arc<OutletHandler>) -> SubscriptionToken {
        self.listeners.register_handler(handler)
    }

    pub fn unregister(&self, token: SubscriptionToken) -> bool {
        self.listeners.unregister(token)
    }

    pub fn unregister_handler(&self, handler: &Arc<OutletHandler>) -> bool {
        self.listeners.unregister_handler(handler)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn add_target(&self, inlet: Arc<Inlet>, converter: Option<Converter>) {
        let mut targets = self.targets.lock();
        if targets.iter().any(|t| Arc::ptr_eq(&t.inlet, &inlet)) {
            return;
        }
        targets.push(LinkTarget { inlet, converter });
    }

    pub fn remove_target(&self, inlet: &Arc<Inlet>) -> bool {
        let mut targets = self.targets.lock();
        let before = targets.len();
        targets.retain(|t| !Arc::ptr_eq(&t.inlet, inlet));
        targets.len() != before
    }

    pub fn target_count(&self) -> usize {
        self.targets.lock().len()
    }

    pub fn reset_links(&self) {
        self.targets.lock().clear();
    }

    pub fn clear(&self) {
        self.reset_links();
        self.listeners.clear();
        self.clear_staging();
    }
}
