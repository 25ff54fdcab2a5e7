//! Cheap, cloneable references to engine objects.
//!
//! A handle stores a weak engine reference plus the target's id or port address. A
//! default-constructed handle, or one whose engine or target is gone, fails every operation
//! with `UninitializedHandle` (or `NotFound` once the target was removed).

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use super::{EngineShared, InletTarget};
use crate::block::{BlockInstance, BlockState, NewBlockData};
use crate::error::{EngineError, Result};
use crate::link::PortAddress;
use crate::policy::{Gating, InletPolicy, UpdatePolicy};
use crate::port::{
    BlockInfo, EventHandler, InletState, OutletHandler, SubscriptionToken, TimestampedValue,
    Validator,
};
use crate::registry::{BlockId, BundleId, BundleInfo};
use crate::value::{OptionSet, TypeKind, TypedValue, ValueType};

fn upgrade(engine: &Weak<EngineShared>, what: &str) -> Result<Arc<EngineShared>> {
    engine
        .upgrade()
        .ok_or_else(|| EngineError::UninitializedHandle(format!("{} handle has no engine", what)))
}

fn require<'a, T>(target: &'a Option<T>, what: &str) -> Result<&'a T> {
    target
        .as_ref()
        .ok_or_else(|| EngineError::UninitializedHandle(format!("{} handle is not initialized", what)))
}

// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BundleHandle {
    engine: Weak<EngineShared>,
    id: Option<BundleId>,
}

impl BundleHandle {
    pub(crate) fn new(engine: &Arc<EngineShared>, id: BundleId) -> Self {
        Self {
            engine: Arc::downgrade(engine),
            id: Some(id),
        }
    }

    fn resolve(&self) -> Result<(Arc<EngineShared>, BundleId)> {
        let id = *require(&self.id, "bundle")?;
        Ok((upgrade(&self.engine, "bundle")?, id))
    }

    pub fn is_valid(&self) -> bool {
        self.resolve()
            .map(|(engine, id)| engine.bundles.get(&id).is_some())
            .unwrap_or(false)
    }

    pub fn id(&self) -> Result<BundleId> {
        require(&self.id, "bundle").copied()
    }

    pub fn name(&self) -> Result<String> {
        let (engine, id) = self.resolve()?;
        Ok(engine.bundle(&id)?.name().to_string())
    }

    pub fn path(&self) -> Result<PathBuf> {
        let (engine, id) = self.resolve()?;
        Ok(engine.bundle(&id)?.path().to_path_buf())
    }

    pub fn info(&self) -> Result<BundleInfo> {
        let (engine, id) = self.resolve()?;
        Ok(engine.bundle(&id)?.bundle().metadata().info())
    }

    /// Instantiate a block type declared by this bundle. Instance names count up per type:
    /// `Doubler # 0`, `Doubler # 1`, ...
    pub fn create_block_instance(&self, block_type: &str) -> Result<BlockHandle> {
        let (engine, id) = self.resolve()?;
        let block = engine.create_block(&id, block_type)?;
        Ok(BlockHandle::new(&engine, block))
    }

    pub fn block_instances(&self) -> Result<Vec<BlockHandle>> {
        let (engine, id) = self.resolve()?;
        Ok(engine
            .bundle(&id)?
            .instances()
            .into_iter()
            .map(|b| BlockHandle::new(&engine, b))
            .collect())
    }

    /// The bundle's context block, if it declares one.
    pub fn context_block(&self) -> Result<Option<BlockHandle>> {
        let (engine, id) = self.resolve()?;
        Ok(engine
            .bundle(&id)?
            .context_block()
            .map(|b| BlockHandle::new(&engine, b)))
    }

    /// Shut down every instance of this bundle and unload it.
    pub fn unload(&self) -> Result<()> {
        let (engine, id) = self.resolve()?;
        engine.unload_bundle(&id)
    }
}

// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BlockHandle {
    engine: Weak<EngineShared>,
    id: Option<BlockId>,
}

impl PartialEq for BlockHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.engine, &other.engine)
    }
}

impl BlockHandle {
    pub(crate) fn new(engine: &Arc<EngineShared>, id: BlockId) -> Self {
        Self {
            engine: Arc::downgrade(engine),
            id: Some(id),
        }
    }

    fn resolve(&self) -> Result<(Arc<EngineShared>, BlockId)> {
        let id = *require(&self.id, "block")?;
        Ok((upgrade(&self.engine, "block")?, id))
    }

    fn instance(&self) -> Result<Arc<BlockInstance>> {
        let (engine, id) = self.resolve()?;
        engine.instance(&id)
    }

    pub fn is_valid(&self) -> bool {
        self.instance().is_ok()
    }

    pub fn id(&self) -> Result<BlockId> {
        require(&self.id, "block").copied()
    }

    pub fn name(&self) -> Result<String> {
        Ok(self.instance()?.name().to_string())
    }

    pub fn type_name(&self) -> Result<String> {
        Ok(self.instance()?.type_name().to_string())
    }

    pub fn is_context(&self) -> Result<bool> {
        Ok(self.instance()?.is_context())
    }

    pub fn state(&self) -> Result<BlockState> {
        Ok(self.instance()?.state())
    }

    pub fn bundle(&self) -> Result<BundleHandle> {
        let (engine, _) = self.resolve()?;
        Ok(BundleHandle::new(&engine, self.instance()?.bundle()))
    }

    pub fn info(&self) -> Result<BlockInfo> {
        let (engine, _) = self.resolve()?;
        let block = self.instance()?;
        let bundle = engine.bundle(&block.bundle())?;
        let meta = bundle.bundle().metadata();
        let info = if block.is_context() {
            meta.context.as_ref().map(|m| m.info())
        } else {
            meta.find_block(block.type_name()).map(|m| m.info())
        };
        info.ok_or_else(|| {
            EngineError::NotFound(format!(
                "block {} not found in bundle {}",
                block.type_name(),
                bundle.name()
            ))
        })
    }

    /// Run the block's setup on a worker and wait for it. A failing setup leaves the block in
    /// `SetupFailed` and reports through the exception callbacks; the call itself succeeds.
    pub fn setup(&self) -> Result<()> {
        let (engine, id) = self.resolve()?;
        engine.setup(&id)
    }

    pub fn start(&self) -> Result<()> {
        let (engine, id) = self.resolve()?;
        engine.start(&id)
    }

    pub fn stop(&self) -> Result<()> {
        let (engine, id) = self.resolve()?;
        engine.stop(&id)
    }

    /// Destroy the block. Its links are removed; the handle is invalid afterwards.
    pub fn shutdown(&self) -> Result<()> {
        let (engine, id) = self.resolve()?;
        engine.shutdown(&id)
    }

    pub fn policy(&self) -> Result<UpdatePolicy> {
        Ok(self.instance()?.policy())
    }

    pub fn update_policy(&self) -> UpdatePolicyHandle {
        UpdatePolicyHandle {
            block: self.clone(),
        }
    }

    pub fn set_update_rate(&self, hz: f64) -> Result<()> {
        self.instance()?.update_policy(|p| p.set_rate(hz));
        Ok(())
    }

    pub fn inlet(&self, name: &str) -> Result<InletHandle> {
        let (engine, id) = self.resolve()?;
        let address = PortAddress::new(id, name);
        let (_, target) = engine.resolve_inlet(&address)?;
        let canonical = match &target {
            InletTarget::Multi(group) => group.name().to_string(),
            InletTarget::Plain(_, inlet) | InletTarget::Member(_, inlet) => inlet.name().to_string(),
        };
        Ok(InletHandle::new(&engine, PortAddress::new(id, canonical)))
    }

    pub fn outlet(&self, name: &str) -> Result<OutletHandle> {
        let (engine, id) = self.resolve()?;
        let (_, outlet) = engine.resolve_outlet(&PortAddress::new(id, name))?;
        Ok(OutletHandle::new(&engine, PortAddress::new(id, outlet.name())))
    }

    pub fn parameter(&self, name: &str) -> Result<ParameterHandle> {
        let (engine, id) = self.resolve()?;
        let parameter = engine.instance(&id)?.io().parameter(name)?;
        Ok(ParameterHandle::new(&engine, PortAddress::new(id, parameter.name())))
    }

    pub fn inlets(&self) -> Result<Vec<InletHandle>> {
        let (engine, id) = self.resolve()?;
        Ok(engine
            .instance(&id)?
            .io()
            .inlet_groups()
            .iter()
            .map(|g| InletHandle::new(&engine, PortAddress::new(id, g.name())))
            .collect())
    }

    pub fn outlets(&self) -> Result<Vec<OutletHandle>> {
        let (engine, id) = self.resolve()?;
        Ok(engine
            .instance(&id)?
            .io()
            .outlets()
            .iter()
            .map(|o| OutletHandle::new(&engine, PortAddress::new(id, o.name())))
            .collect())
    }

    pub fn parameters(&self) -> Result<Vec<ParameterHandle>> {
        let (engine, id) = self.resolve()?;
        Ok(engine
            .instance(&id)?
            .io()
            .parameters()
            .iter()
            .map(|p| ParameterHandle::new(&engine, PortAddress::new(id, p.name())))
            .collect())
    }

    /// Called once per update that published at least one outlet, with every published
    /// `(outlet, value)` pair.
    pub fn register_to_new_data(
        &self,
        callback: impl Fn(&NewBlockData) + Send + Sync + 'static,
    ) -> Result<SubscriptionToken> {
        Ok(self.instance()?.io().new_data().register(callback))
    }

    pub fn register_new_data_handler(
        &self,
        handler: Arc<dyn EventHandler<NewBlockData>>,
    ) -> Result<SubscriptionToken> {
        Ok(self.instance()?.io().new_data().register_handler(handler))
    }

    pub fn unregister_from_new_data(&self, token: SubscriptionToken) -> Result<bool> {
        Ok(self.instance()?.io().new_data().unregister(token))
    }
}

// ---------------------------------------------------------------------------------------------

/// Edits one block's update policy.
#[derive(Debug, Clone, Default)]
pub struct UpdatePolicyHandle {
    block: BlockHandle,
}

impl UpdatePolicyHandle {
    /// Fire every `1/hz` seconds. Zero or negative disables the timer.
    pub fn update_with_fixed_rate(&self, hz: f64) -> Result<()> {
        self.block.set_update_rate(hz)
    }

    pub fn set_gating(&self, gating: Gating) -> Result<()> {
        self.block.instance()?.update_policy(|p| p.gating = gating);
        Ok(())
    }

    /// New block default. Runtime overrides are dropped; triggers declared in the block
    /// metadata stay.
    fn set_all(&self, policy: InletPolicy) -> Result<()> {
        let block = self.block.instance()?;
        block.update_policy(|p| p.default_inlet_policy = policy);
        for group in block.io().inlet_groups() {
            group.reset_policy();
        }
        Ok(())
    }

    fn set_one(&self, inlet: &str, policy: InletPolicy) -> Result<()> {
        let handle = self.block.inlet(inlet)?;
        handle.set_update_policy(Some(policy))
    }

    /// Every inlet must carry data newer than the last update.
    pub fn update_when_all_inlet_data_new(&self) -> Result<()> {
        self.set_all(InletPolicy::NewerTimestamp)
    }

    pub fn update_when_inlet_data_new(&self, inlet: &str) -> Result<()> {
        self.set_one(inlet, InletPolicy::NewerTimestamp)
    }

    pub fn update_when_all_inlet_data_valid(&self) -> Result<()> {
        self.set_all(InletPolicy::ValidData)
    }

    pub fn update_when_inlet_data_valid(&self, inlet: &str) -> Result<()> {
        self.set_one(inlet, InletPolicy::ValidData)
    }

    /// Inlets never hold the block back; only the timer (if any) decides.
    pub fn update_always(&self) -> Result<()> {
        self.set_all(InletPolicy::Always)
    }
}

// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InletHandle {
    engine: Weak<EngineShared>,
    address: Option<PortAddress>,
}

impl InletHandle {
    pub(crate) fn new(engine: &Arc<EngineShared>, address: PortAddress) -> Self {
        Self {
            engine: Arc::downgrade(engine),
            address: Some(address),
        }
    }

    fn resolve(&self) -> Result<(Arc<EngineShared>, PortAddress, Arc<BlockInstance>, InletTarget)> {
        let address = require(&self.address, "inlet")?.clone();
        let engine = upgrade(&self.engine, "inlet")?;
        let (block, target) = engine.resolve_inlet(&address)?;
        Ok((engine, address, block, target))
    }

    fn single(&self) -> Result<(Arc<EngineShared>, Arc<crate::port::Inlet>)> {
        let (engine, _, block, target) = self.resolve()?;
        let inlet = target.inlet(block.name())?;
        Ok((engine, inlet))
    }

    pub fn is_valid(&self) -> bool {
        self.resolve().is_ok()
    }

    pub fn address(&self) -> Result<&PortAddress> {
        require(&self.address, "inlet")
    }

    pub fn name(&self) -> Result<String> {
        Ok(require(&self.address, "inlet")?.port.clone())
    }

    pub fn block(&self) -> Result<BlockHandle> {
        let (engine, address, _, _) = self.resolve()?;
        Ok(BlockHandle::new(&engine, address.block))
    }

    pub fn kind(&self) -> Result<TypeKind> {
        let (_, _, _, target) = self.resolve()?;
        Ok(target.group().metadata().kind())
    }

    /// Link an upstream outlet. Returns `false` when the types differ. A previous upstream of
    /// this inlet is replaced; linking a multi-inlet adds a new member.
    pub fn link(&self, outlet: &OutletHandle) -> Result<bool> {
        self.link_inner(outlet, false)
    }

    /// Like [`link`](Self::link), but accepts mismatched types with a registered converter.
    pub fn link_with_conversion(&self, outlet: &OutletHandle) -> Result<bool> {
        self.link_inner(outlet, true)
    }

    fn link_inner(&self, outlet: &OutletHandle, with_conversion: bool) -> Result<bool> {
        let (engine, address, _, _) = self.resolve()?;
        let outlet_address = require(&outlet.address, "outlet")?;
        engine.link(&address, outlet_address, with_conversion)
    }

    pub fn unlink_from(&self, outlet: &OutletHandle) -> Result<()> {
        let (engine, address, _, _) = self.resolve()?;
        let outlet_address = require(&outlet.address, "outlet")?;
        engine.unlink(&address, outlet_address)
    }

    /// Remove any upstream link.
    pub fn unlink(&self) -> Result<()> {
        let (engine, address, _, _) = self.resolve()?;
        engine.unlink_inlet(&address)
    }

    /// The outlet currently feeding this inlet.
    pub fn upstream(&self) -> Result<Option<OutletHandle>> {
        let (engine, address, _, _) = self.resolve()?;
        Ok(engine
            .upstream_of(&address)
            .map(|key| OutletHandle::new(&engine, key.outlet)))
    }

    /// Deliver a value as new data; the block sees it after its next synchronization.
    pub fn set_value<T: ValueType>(&self, value: T) -> Result<()> {
        self.set_typed_value(TypedValue::new(value))
    }

    pub fn set_typed_value(&self, value: TypedValue) -> Result<()> {
        let (engine, inlet) = self.single()?;
        inlet.set_data(value, engine.now())
    }

    pub fn set_value_from_text(&self, text: &str) -> Result<()> {
        let (engine, inlet) = self.single()?;
        let value = TypedValue::from_text(inlet.kind(), text)?;
        inlet.set_data(value, engine.now())
    }

    pub fn set_default_value<T: ValueType>(&self, value: T) -> Result<()> {
        let (_, inlet) = self.single()?;
        inlet.set_default(TypedValue::new(value))
    }

    pub fn set_default_value_from_text(&self, text: &str) -> Result<()> {
        let (_, inlet) = self.single()?;
        let value = TypedValue::from_text(inlet.kind(), text)?;
        inlet.set_default(value)
    }

    /// The value visible to the block since its last synchronization.
    pub fn value(&self) -> Result<TypedValue> {
        Ok(self.single()?.1.value())
    }

    pub fn get<T: ValueType>(&self) -> Result<T> {
        self.value()?.extract()
    }

    pub fn current(&self) -> Result<TimestampedValue> {
        Ok(self.single()?.1.current())
    }

    pub fn default_value(&self) -> Result<TypedValue> {
        Ok(self.single()?.1.default_value())
    }

    pub fn state(&self) -> Result<InletState> {
        let (_, _, block, target) = self.resolve()?;
        let inlet = target.inlet(block.name())?;
        Ok(inlet.state(block.policy().default_inlet_policy))
    }

    pub fn options(&self) -> Result<Option<OptionSet>> {
        let (_, _, _, target) = self.resolve()?;
        Ok(target.group().metadata().options.clone())
    }

    /// Per-inlet trigger. `None` falls back to the block's default policy. On a multi-inlet
    /// it applies to every member.
    pub fn set_update_policy(&self, policy: Option<InletPolicy>) -> Result<()> {
        let (_, _, _, target) = self.resolve()?;
        match &target {
            InletTarget::Multi(group) => group.set_policy(policy),
            InletTarget::Plain(_, inlet) | InletTarget::Member(_, inlet) => inlet.set_policy(policy),
        }
        Ok(())
    }

    pub fn set_buffer_size(&self, size: usize) -> Result<()> {
        let (_, _, _, target) = self.resolve()?;
        match &target {
            InletTarget::Multi(group) => group.set_buffer_size(size),
            InletTarget::Plain(_, inlet) | InletTarget::Member(_, inlet) => inlet.set_buffer_size(size),
        }
        Ok(())
    }

    pub fn buffer_size(&self) -> Result<usize> {
        let (_, _, block, target) = self.resolve()?;
        match &target {
            InletTarget::Multi(group) => Ok(group.buffer_size()),
            _ => Ok(target.inlet(block.name())?.buffer_size()),
        }
    }

    pub fn set_validator(&self, validator: Option<Validator>) -> Result<()> {
        self.single()?.1.set_validator(validator);
        Ok(())
    }

    pub fn is_multi_inlet(&self) -> Result<bool> {
        let (_, _, _, target) = self.resolve()?;
        Ok(matches!(target, InletTarget::Multi(_)))
    }

    /// Number of members of a multi-inlet; 1 for a plain inlet.
    pub fn size(&self) -> Result<usize> {
        let (_, _, _, target) = self.resolve()?;
        Ok(match &target {
            InletTarget::Multi(group) => group.len(),
            _ => 1,
        })
    }

    pub fn at(&self, index: usize) -> Result<InletHandle> {
        let (engine, address, block, target) = self.resolve()?;
        let InletTarget::Multi(group) = &target else {
            return Err(not_multi(&address, block.name()));
        };
        let member = group.at(index)?;
        Ok(InletHandle::new(&engine, PortAddress::new(address.block, member.name())))
    }

    /// Append an unlinked member to a multi-inlet.
    pub fn add(&self) -> Result<InletHandle> {
        let (engine, address, block, target) = self.resolve()?;
        let InletTarget::Multi(group) = &target else {
            return Err(not_multi(&address, block.name()));
        };
        let member = group.add_member()?;
        Ok(InletHandle::new(&engine, PortAddress::new(address.block, member.name())))
    }

    /// Remove a member from this multi-inlet, unlinking it first.
    pub fn remove(&self, member: &InletHandle) -> Result<()> {
        let (engine, address, _, _) = self.resolve()?;
        let member = require(&member.address, "inlet")?;
        engine.remove_inlet_member(&address, member)
    }
}

fn not_multi(address: &PortAddress, owner: &str) -> EngineError {
    EngineError::InvalidState(format!(
        "inlet {} of {} is not a multi-inlet",
        address.port, owner
    ))
}

// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct OutletHandle {
    engine: Weak<EngineShared>,
    address: Option<PortAddress>,
}

impl OutletHandle {
    pub(crate) fn new(engine: &Arc<EngineShared>, address: PortAddress) -> Self {
        Self {
            engine: Arc::downgrade(engine),
            address: Some(address),
        }
    }

    fn outlet(&self) -> Result<(Arc<EngineShared>, PortAddress, Arc<crate::port::Outlet>)> {
        let address = require(&self.address, "outlet")?.clone();
        let engine = upgrade(&self.engine, "outlet")?;
        let (_, outlet) = engine.resolve_outlet(&address)?;
        Ok((engine, address, outlet))
    }

    pub fn is_valid(&self) -> bool {
        self.outlet().is_ok()
    }

    pub fn address(&self) -> Result<&PortAddress> {
        require(&self.address, "outlet")
    }

    pub fn name(&self) -> Result<String> {
        Ok(require(&self.address, "outlet")?.port.clone())
    }

    pub fn block(&self) -> Result<BlockHandle> {
        let (engine, address, _) = self.outlet()?;
        Ok(BlockHandle::new(&engine, address.block))
    }

    pub fn kind(&self) -> Result<TypeKind> {
        Ok(self.outlet()?.2.kind().clone())
    }

    pub fn link(&self, inlet: &InletHandle) -> Result<bool> {
        inlet.link(self)
    }

    pub fn link_with_conversion(&self, inlet: &InletHandle) -> Result<bool> {
        inlet.link_with_conversion(self)
    }

    pub fn unlink_from(&self, inlet: &InletHandle) -> Result<()> {
        inlet.unlink_from(self)
    }

    /// Remove every link leaving this outlet.
    pub fn unlink(&self) -> Result<()> {
        let (engine, address, _) = self.outlet()?;
        engine.unlink_outlet(&address)
    }

    /// The last published value, or the initial value before the first publication.
    pub fn last_value(&self) -> Result<TimestampedValue> {
        Ok(self.outlet()?.2.last())
    }

    pub fn register_to_new_data(
        &self,
        callback: impl Fn(&TimestampedValue) + Send + Sync + 'static,
    ) -> Result<SubscriptionToken> {
        Ok(self.outlet()?.2.register_callback(callback))
    }

    /// Registering the same handler twice yields the existing token.
    pub fn register_handler(&self, handler: Arc<OutletHandler>) -> Result<SubscriptionToken> {
        Ok(self.outlet()?.2.register_handler(handler))
    }

    pub fn unregister_from_new_data(&self, token: SubscriptionToken) -> Result<bool> {
        Ok(self.outlet()?.2.unregister(token))
    }

    pub fn unregister_handler(&self, handler: &Arc<OutletHandler>) -> Result<bool> {
        Ok(self.outlet()?.2.unregister_handler(handler))
    }
}

// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ParameterHandle {
    engine: Weak<EngineShared>,
    address: Option<PortAddress>,
}

impl ParameterHandle {
    pub(crate) fn new(engine: &Arc<EngineShared>, address: PortAddress) -> Self {
        Self {
            engine: Arc::downgrade(engine),
            address: Some(address),
        }
    }

    fn parameter(&self) -> Result<Arc<crate::port::Parameter>> {
        let address = require(&self.address, "parameter")?;
        let engine = upgrade(&self.engine, "parameter")?;
        engine.instance(&address.block)?.io().parameter(&address.port)
    }

    pub fn is_valid(&self) -> bool {
        self.parameter().is_ok()
    }

    pub fn name(&self) -> Result<String> {
        Ok(require(&self.address, "parameter")?.port.clone())
    }

    pub fn kind(&self) -> Result<TypeKind> {
        Ok(self.parameter()?.kind().clone())
    }

    /// Takes effect at the block's next synchronization.
    pub fn set_value<T: ValueType>(&self, value: T) -> Result<()> {
        self.parameter()?.set(TypedValue::new(value))
    }

    pub fn set_typed_value(&self, value: TypedValue) -> Result<()> {
        self.parameter()?.set(value)
    }

    pub fn set_value_from_text(&self, text: &str) -> Result<()> {
        let parameter = self.parameter()?;
        let value = TypedValue::from_text(parameter.kind(), text)?;
        parameter.set(value)
    }

    pub fn set_default_value<T: ValueType>(&self, value: T) -> Result<()> {
        self.parameter()?.set_default(TypedValue::new(value))
    }

    /// The value the block currently sees.
    pub fn value(&self) -> Result<TypedValue> {
        Ok(self.parameter()?.value())
    }

    /// The most recently set value, synchronized or not.
    pub fn latest(&self) -> Result<TypedValue> {
        Ok(self.parameter()?.latest())
    }

    pub fn default_value(&self) -> Result<TypedValue> {
        Ok(self.parameter()?.default_value())
    }

    pub fn options(&self) -> Result<Option<OptionSet>> {
        Ok(self.parameter()?.options())
    }
}
