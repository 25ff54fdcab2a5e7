use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{EngineError, Result};
use crate::policy::InletPolicy;
use crate::port::{
    BlockMetadata, Inlet, InletMetadata, Listeners, Outlet, OutletUpdate, Parameter,
};
use crate::runtime::Timestamp;
use crate::value::TypedValue;

/// Event fired once per update that published at least one outlet.
pub type NewBlockData = Vec<(String, TypedValue)>;

fn not_found(kind: &str, name: &str, owner: &str) -> EngineError {
    EngineError::NotFound(format!("{} {} not found in {}", kind, name, owner))
}

/// One declared inlet. A plain inlet has exactly one member of the same name; a multi-inlet
/// holds zero or more members named `<name>[i]`.
pub struct InletGroup {
    meta: InletMetadata,
    owner: String,
    buffer_size: Mutex<usize>,
    policy: Mutex<Option<InletPolicy>>,
    members: RwLock<Vec<Arc<Inlet>>>,
    visible: RwLock<Vec<Arc<Inlet>>>,
    next_index: Mutex<usize>,
}

impl fmt::Debug for InletGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InletGroup")
            .field("name", &self.meta.name)
            .field("multi", &self.meta.multi)
            .field("members", &self.members.read().len())
            .finish()
    }
}

impl InletGroup {
    fn new(meta: InletMetadata, owner: &str, default_buffer_size: usize) -> Self {
        let buffer_size = meta.buffer_size.unwrap_or(default_buffer_size);
        let group = Self {
            policy: Mutex::new(meta.policy),
            owner: owner.to_string(),
            buffer_size: Mutex::new(buffer_size),
            members: RwLock::new(Vec::new()),
            visible: RwLock::new(Vec::new()),
            next_index: Mutex::new(0),
            meta,
        };
        if !group.meta.multi {
            let inlet = Arc::new(group.make_member(group.meta.name.clone()));
            *group.members.write() = vec![inlet.clone()];
            *group.visible.write() = vec![inlet];
        }
        group
    }

    fn make_member(&self, name: String) -> Inlet {
        let inlet = Inlet::new(
            name,
            self.owner.clone(),
            self.meta.default.clone(),
            *self.buffer_size.lock(),
        );
        inlet.set_policy(*self.policy.lock());
        inlet.set_options(self.meta.options.clone());
        inlet
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn metadata(&self) -> &InletMetadata {
        &self.meta
    }

    pub fn is_multi(&self) -> bool {
        self.meta.multi
    }

    /// The only member of a plain inlet.
    pub fn single(&self) -> Option<Arc<Inlet>> {
        if self.meta.multi {
            return None;
        }
        self.members.read().first().cloned()
    }

    pub fn members(&self) -> Vec<Arc<Inlet>> {
        self.members.read().clone()
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn at(&self, index: usize) -> Result<Arc<Inlet>> {
        self.members.read().get(index).cloned().ok_or_else(|| {
            not_found(
                "inlet",
                &format!("{}[{}]", self.meta.name, index),
                &self.owner,
            )
        })
    }

    pub fn find_member(&self, name: &str) -> Option<Arc<Inlet>> {
        self.members
            .read()
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Append a sub-inlet to a multi-inlet.
    pub fn add_member(&self) -> Result<Arc<Inlet>> {
        if !self.meta.multi {
            return Err(EngineError::InvalidState(format!(
                "inlet {} of {} is not a multi-inlet",
                self.meta.name, self.owner
            )));
        }
        let name = {
            let mut next = self.next_index.lock();
            let name = format!("{}[{}]", self.meta.name, *next);
            *next += 1;
            name
        };
        let inlet = Arc::new(self.make_member(name));
        self.members.write().push(inlet.clone());
        Ok(inlet)
    }

    pub fn remove_member(&self, inlet: &Arc<Inlet>) -> bool {
        let mut members = self.members.write();
        let before = members.len();
        members.retain(|m| !Arc::ptr_eq(m, inlet));
        members.len() != before
    }

    pub fn policy(&self) -> Option<InletPolicy> {
        *self.policy.lock()
    }

    /// Applies to every current member and to members added later.
    pub fn set_policy(&self, policy: Option<InletPolicy>) {
        *self.policy.lock() = policy;
        for member in self.members.read().iter() {
            member.set_policy(policy);
        }
    }

    /// Back to the trigger declared in the block metadata.
    pub fn reset_policy(&self) {
        self.set_policy(self.meta.policy);
    }

    pub fn buffer_size(&self) -> usize {
        *self.buffer_size.lock()
    }

    /// Resizes every current member; members added later get the new size too.
    pub fn set_buffer_size(&self, size: usize) {
        *self.buffer_size.lock() = size;
        for member in self.members.read().iter() {
            member.set_buffer_size(size);
        }
    }

    fn sync(&self) {
        let members = self.members.read().clone();
        for member in &members {
            member.sync();
        }
        *self.visible.write() = members;
    }

    fn is_ready(&self, block_default: InletPolicy) -> bool {
        self.members
            .read()
            .iter()
            .all(|m| m.is_ready(block_default))
    }

    /// Members as of the last synchronization.
    pub fn visible(&self) -> Vec<Arc<Inlet>> {
        self.visible.read().clone()
    }

    fn reset(&self) {
        for member in self.members.read().iter() {
            member.reset();
        }
    }
}

/// Ports of one block instance, created from its block metadata.
pub struct IoManager {
    owner: String,
    inlets: Vec<Arc<InletGroup>>,
    outlets: Vec<Arc<Outlet>>,
    parameters: Vec<Arc<Parameter>>,
    new_data: Listeners<NewBlockData>,
}

impl fmt::Debug for IoManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoManager")
            .field("owner", &self.owner)
            .field("inlets", &self.inlets)
            .field("outlets", &self.outlets.len())
            .field("parameters", &self.parameters.len())
            .finish()
    }
}

impl IoManager {
    pub fn from_metadata(meta: &BlockMetadata, owner: &str, default_buffer_size: usize) -> Self {
        Self {
            owner: owner.to_string(),
            inlets: meta
                .inlets
                .iter()
                .map(|i| Arc::new(InletGroup::new(i.clone(), owner, default_buffer_size)))
                .collect(),
            outlets: meta
                .outlets
                .iter()
                .map(|o| Arc::new(Outlet::new(o.name.clone(), owner, o.initial.clone())))
                .collect(),
            parameters: meta
                .parameters
                .iter()
                .map(|p| {
                    Arc::new(Parameter::new(
                        p.name.clone(),
                        owner,
                        p.default.clone(),
                        p.options.clone(),
                    ))
                })
                .collect(),
            new_data: Listeners::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn inlet_group(&self, name: &str) -> Result<Arc<InletGroup>> {
        self.inlets
            .iter()
            .find(|g| g.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| not_found("inlet", name, &self.owner))
    }

    /// A plain inlet by name, or a multi-inlet member by its `<name>[i]` name.
    pub fn inlet(&self, name: &str) -> Result<Arc<Inlet>> {
        if let Ok(group) = self.inlet_group(name)
            && let Some(inlet) = group.single()
        {
            return Ok(inlet);
        }
        self.inlets
            .iter()
            .filter(|g| g.is_multi())
            .find_map(|g| g.find_member(name))
            .ok_or_else(|| not_found("inlet", name, &self.owner))
    }

    /// The group that owns a given inlet.
    pub fn group_of(&self, inlet: &Arc<Inlet>) -> Option<Arc<InletGroup>> {
        self.inlets
            .iter()
            .find(|g| g.members.read().iter().any(|m| Arc::ptr_eq(m, inlet)))
            .cloned()
    }

    pub fn outlet(&self, name: &str) -> Result<Arc<Outlet>> {
        self.outlets
            .iter()
            .find(|o| o.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| not_found("outlet", name, &self.owner))
    }

    pub fn parameter(&self, name: &str) -> Result<Arc<Parameter>> {
        self.parameters
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| not_found("parameter", name, &self.owner))
    }

    pub fn inlet_groups(&self) -> &[Arc<InletGroup>] {
        &self.inlets
    }

    pub fn outlets(&self) -> &[Arc<Outlet>] {
        &self.outlets
    }

    pub fn parameters(&self) -> &[Arc<Parameter>] {
        &self.parameters
    }

    pub fn new_data(&self) -> &Listeners<NewBlockData> {
        &self.new_data
    }

    pub fn sync_parameters(&self) {
        for parameter in &self.parameters {
            parameter.synchronize();
        }
    }

    /// The synchronization boundary before user update code runs.
    pub fn sync_inlets(&self) {
        for group in &self.inlets {
            group.sync();
        }
    }

    /// Every inlet trigger ready. An empty multi-inlet never blocks.
    pub fn inlets_ready(&self, block_default: InletPolicy) -> bool {
        self.inlets.iter().all(|g| g.is_ready(block_default))
    }

    /// Capture and propagate outlets the block wrote. Returns the number published.
    pub fn publish_outlets(&self, now: Timestamp) -> usize {
        let mut published = Vec::new();
        for outlet in &self.outlets {
            if let OutletUpdate::Published(data) = outlet.update(now) {
                outlet.publish(&data);
                published.push((outlet.name().to_string(), data.value));
            }
        }
        let count = published.len();
        if count > 0 {
            self.new_data.notify(&published);
        }
        count
    }

    pub fn clear_staging(&self) {
        for outlet in &self.outlets {
            outlet.clear_staging();
        }
    }

    /// Release all port state: buffered data, listeners, link targets.
    pub fn clear(&self) {
        for group in &self.inlets {
            group.reset();
        }
        for outlet in &self.outlets {
            outlet.clear();
        }
        for parameter in &self.parameters {
            parameter.reset();
        }
        self.new_data.clear();
    }
}
