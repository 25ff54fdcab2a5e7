use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::buffer::{InletBuffer, TimestampedValue};
use crate::error::Result;
use crate::policy::InletPolicy;
use crate::runtime::Timestamp;
use crate::value::{OptionSet, TypeKind, TypedValue};

/// Predicate deciding whether an inlet value counts as valid for [`InletPolicy::ValidData`].
pub type Validator = Arc<dyn Fn(&TypedValue) -> bool + Send + Sync>;

/// Text snapshot of an inlet, as shown to applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InletState {
    pub default_value: String,
    pub current_value: String,
    pub update_policy: String,
    pub buffer_size: usize,
}

struct InletData {
    default: TypedValue,
    pending: Option<TimestampedValue>,
    buffer: InletBuffer,
    /// Block-visible value. Timestamp 0 means the default has never been replaced.
    current: TimestampedValue,
    last_consumed: Timestamp,
    policy: Option<InletPolicy>,
    options: Option<OptionSet>,
    validator: Option<Validator>,
}

impl InletData {
    fn is_fresh(&self, item: &TimestampedValue) -> bool {
        item.timestamp > self.last_consumed
    }

    /// The value the next sync would make visible, if any.
    fn next_candidate(&self) -> Option<&TimestampedValue> {
        self.buffer
            .iter()
            .find(|item| self.is_fresh(item))
            .or_else(|| self.pending.as_ref().filter(|p| self.is_fresh(p)))
    }

    fn is_valid(&self, value: &TypedValue) -> bool {
        match &self.validator {
            Some(validator) => validator(value),
            None => *value != self.default,
        }
    }
}

/// A typed input endpoint.
///
/// Values arrive by [`Inlet::set_data`] (overwrites the pending slot) or by
/// [`Inlet::insert_data`] (appends to the bounded buffer, used by links). Neither touches the
/// block-visible value until [`Inlet::sync`] runs at the start of an update.
pub struct Inlet {
    name: String,
    owner: String,
    kind: TypeKind,
    data: Mutex<InletData>,
}

impl fmt::Debug for Inlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inlet")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Inlet {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        default: TypedValue,
        buffer_size: usize,
    ) -> Self {
        let kind = default.kind();
        Self {
            name: name.into(),
            owner: owner.into(),
            kind,
            data: Mutex::new(InletData {
                current: TimestampedValue::new(default.clone(), 0),
                default,
                pending: None,
                buffer: InletBuffer::new(buffer_size),
                last_consumed: 0,
                policy: None,
                options: None,
                validator: None,
            }),
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

    fn check(&self, value: &TypedValue, data: &InletData) -> Result<()> {
        value.expect_kind(&self.kind, &format!("inlet {} of {}", self.name, self.owner))?;
        if let Some(options) = &data.options {
            options.check(value, &format!("inlet {} of {}", self.name, self.owner))?;
        }
        Ok(())
    }

    /// Overwrite the pending slot.
    pub fn set_data(&self, value: TypedValue, timestamp: Timestamp) -> Result<()> {
        let mut data = self.data.lock();
        self.check(&value, &data)?;
        data.pending = Some(TimestampedValue::new(value, timestamp));
        Ok(())
    }

    /// Append to the bounded buffer, evicting the oldest item on overflow.
    pub fn insert_data(&self, value: TypedValue, timestamp: Timestamp) -> Result<()> {
        let mut data = self.data.lock();
        self.check(&value, &data)?;
        if data
            .buffer
            .push(TimestampedValue::new(value, timestamp))
            .is_some()
        {
            tracing::trace!(inlet = %self.name, owner = %self.owner, "inlet buffer full, dropped oldest");
        }
        Ok(())
    }

    /// Move the next fresh value (oldest buffered first, then pending) into the visible slot.
    /// Returns whether the visible value changed.
    pub fn sync(&self) -> bool {
        let mut data = self.data.lock();
        while let Some(item) = data.buffer.pop_front() {
            if data.is_fresh(&item) {
                data.last_consumed = item.timestamp;
                data.current = item;
                return true;
            }
        }
        match data.pending.take() {
            Some(item) if data.is_fresh(&item) => {
                data.last_consumed = item.timestamp;
                data.current = item;
                true
            }
            _ => false,
        }
    }

    pub fn has_newer_data(&self) -> bool {
        self.data.lock().next_candidate().is_some()
    }

    /// Validity of the value the block would see after the next sync.
    pub fn has_valid_data(&self) -> bool {
        let data = self.data.lock();
        let value = data
            .next_candidate()
            .map(|item| &item.value)
            .unwrap_or(&data.current.value);
        data.is_valid(value)
    }

    /// Whether this inlet lets its block run, given the block's default policy.
    pub fn is_ready(&self, block_default: InletPolicy) -> bool {
        match self.policy().unwrap_or(block_default) {
            InletPolicy::Always => true,
            InletPolicy::NewerTimestamp => self.has_newer_data(),
            InletPolicy::ValidData => self.has_valid_data(),
        }
    }

    pub fn current(&self) -> TimestampedValue {
        self.data.lock().current.clone()
    }

    pub fn value(&self) -> TypedValue {
        self.data.lock().current.value.clone()
    }

    pub fn default_value(&self) -> TypedValue {
        self.data.lock().default.clone()
    }

    /// Replace the default. The visible value follows while no data has arrived yet.
    pub fn set_default(&self, value: TypedValue) -> Result<()> {
        let mut data = self.data.lock();
        self.check(&value, &data)?;
        if data.current.timestamp == 0 {
            data.current.value = value.clone();
        }
        data.default = value;
        Ok(())
    }

    pub fn buffer_size(&self) -> usize {
        self.data.lock().buffer.capacity()
    }

    pub fn set_buffer_size(&self, size: usize) {
        self.data.lock().buffer.set_capacity(size);
    }

    pub fn buffered(&self) -> usize {
        self.data.lock().buffer.len()
    }

    pub fn policy(&self) -> Option<InletPolicy> {
        self.data.lock().policy
    }

    /// Takes effect on the next readiness evaluation.
    pub fn set_policy(&self, policy: Option<InletPolicy>) {
        self.data.lock().policy = policy;
    }

    pub fn options(&self) -> Option<OptionSet> {
        self.data.lock().options.clone()
    }

    pub fn set_options(&self, options: Option<OptionSet>) {
        self.data.lock().options = options;
    }

    pub fn set_validator(&self, validator: Option<Validator>) {
        self.data.lock().validator = validator;
    }

    pub fn state(&self, block_default: InletPolicy) -> InletState {
        let data = self.data.lock();
        InletState {
            default_value: data.default.to_text(),
            current_value: data.current.value.to_text(),
            update_policy: data.policy.unwrap_or(block_default).name().to_string(),
            buffer_size: data.buffer.capacity(),
        }
    }

    /// Drop buffered and pending data and show the default again.
    pub fn reset(&self) {
        let mut data = self.data.lock();
        data.buffer.clear();
        data.pending = None;
        data.current = TimestampedValue::new(data.default.clone(), 0);
        data.last_consumed = 0;
    }
}
