//! # Engine
//!
//! The explicit engine object a host constructs once. It owns every loaded bundle, the block
//! instance arena, the link set, the worker pool and the scheduler. Applications address
//! bundles, blocks and ports through the handles in [`handles`], which hold a weak reference
//! back to the engine and fail with `UninitializedHandle` once the engine or target is gone.
//!
//! Structural errors (unknown names, duplicate loads, bad handles, invalid lifecycle
//! transitions) are returned from the call that caused them. Errors raised inside block code
//! are delivered to exception callbacks instead.

pub mod handles;
pub mod persist;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::block::{BlockInstance, BlockState, ContextAdapter, InletGroup};
use crate::config::EngineConfig;
use crate::error::{BlockError, EngineError, Result};
use crate::link::{Link, LinkInfo, LinkKey, LinkSet, PortAddress};
use crate::port::{BlockMetadata, Inlet, Outlet, SubscriptionToken};
use crate::registry::{
    BlockId, BundleCollection, BundleId, BundleLoader, CONTEXT_INSTANCE_NAME, LoadedBundle,
};
use crate::runtime::{
    BlockException, Clock, ExceptionHandler, ExceptionRegistry, Phase, Scheduler, Task,
    TaskOutcome, ThreadPool,
};
use crate::value::{ConversionRegistry, TypeKind, TypedValue};

pub use handles::{
    BlockHandle, BundleHandle, InletHandle, OutletHandle, ParameterHandle, UpdatePolicyHandle,
};
pub use persist::{
    BlockConfig, BundleConfig, GraphConfig, InletConfig, LinkConfig, ParameterConfig,
};

/// Update rate of a bundle's context block.
const CONTEXT_RATE_HZ: f64 = 1.0;

/// How an inlet address resolved.
#[derive(Clone)]
pub(crate) enum InletTarget {
    Plain(Arc<InletGroup>, Arc<Inlet>),
    Multi(Arc<InletGroup>),
    Member(Arc<InletGroup>, Arc<Inlet>),
}

impl InletTarget {
    pub(crate) fn group(&self) -> &Arc<InletGroup> {
        match self {
            InletTarget::Plain(g, _) | InletTarget::Multi(g) | InletTarget::Member(g, _) => g,
        }
    }

    pub(crate) fn inlet(&self, owner: &str) -> Result<Arc<Inlet>> {
        match self {
            InletTarget::Plain(_, inlet) | InletTarget::Member(_, inlet) => Ok(inlet.clone()),
            InletTarget::Multi(group) => Err(EngineError::InvalidState(format!(
                "inlet {} of {} is a multi-inlet; address one of its members",
                group.name(),
                owner
            ))),
        }
    }
}

pub(crate) struct EngineShared {
    config: RwLock<EngineConfig>,
    clock: Arc<Clock>,
    exceptions: Arc<ExceptionRegistry>,
    pool: Arc<ThreadPool>,
    scheduler: Scheduler,
    conversions: RwLock<ConversionRegistry>,
    loader: Arc<dyn BundleLoader>,
    bundles: BundleCollection,
    blocks: DashMap<BlockId, Arc<BlockInstance>>,
    links: Mutex<LinkSet>,
}

impl EngineShared {
    fn join_timeout(&self) -> Duration {
        self.config.read().join_timeout()
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now()
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.config.read().base_directory {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }

    pub(crate) fn bundle(&self, id: &BundleId) -> Result<Arc<LoadedBundle>> {
        self.bundles
            .get(id)
            .ok_or_else(|| EngineError::NotFound(format!("bundle {} not found", id)))
    }

    pub(crate) fn instance(&self, id: &BlockId) -> Result<Arc<BlockInstance>> {
        self.blocks
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| EngineError::NotFound(format!("block {} not found", id)))
    }

    pub(crate) fn find_instance(&self, name: &str) -> Result<Arc<BlockInstance>> {
        self.blocks
            .iter()
            .find(|e| e.value().name().eq_ignore_ascii_case(name))
            .map(|e| e.value().clone())
            .ok_or_else(|| EngineError::NotFound(format!("block {} not found", name)))
    }

    pub(crate) fn resolve_inlet(
        &self,
        address: &PortAddress,
    ) -> Result<(Arc<BlockInstance>, InletTarget)> {
        let block = self.instance(&address.block)?;
        let io = block.io();
        let target = match io.inlet_group(&address.port) {
            Ok(group) => match group.single() {
                Some(inlet) => InletTarget::Plain(group, inlet),
                None => InletTarget::Multi(group),
            },
            Err(not_found) => {
                let inlet = io.inlet(&address.port).map_err(|_| not_found)?;
                let group = io.group_of(&inlet).ok_or_else(|| {
                    EngineError::NotFound(format!(
                        "inlet {} not found in {}",
                        address.port,
                        block.name()
                    ))
                })?;
                InletTarget::Member(group, inlet)
            }
        };
        Ok((block, target))
    }

    pub(crate) fn resolve_outlet(
        &self,
        address: &PortAddress,
    ) -> Result<(Arc<BlockInstance>, Arc<Outlet>)> {
        let block = self.instance(&address.block)?;
        let outlet = block.io().outlet(&address.port)?;
        Ok((block, outlet))
    }

    // ---- bundles ----

    pub(crate) fn load_bundle(&self, path: &Path) -> Result<BundleId> {
        let resolved = self.resolve_path(path);
        if self.bundles.find_by_path(&resolved).is_some() {
            return Err(EngineError::AlreadyExists(format!(
                "bundle {} is already loaded",
                resolved.display()
            )));
        }
        let bundle = self.loader.load(&resolved)?;
        let loaded = Arc::new(LoadedBundle::new(resolved.clone(), bundle));
        self.bundles.insert(loaded.clone());
        tracing::info!(bundle = %loaded.name(), path = %resolved.display(), "bundle loaded");

        let context = match loaded.bundle().create_context() {
            Ok(context) => context,
            Err(e) => {
                self.bundles.remove(&loaded.id());
                return Err(EngineError::InvalidState(format!(
                    "context of bundle {} could not be created: {}",
                    loaded.name(),
                    e
                )));
            }
        };
        if let Some(context) = context {
            let meta = loaded
                .bundle()
                .metadata()
                .context
                .clone()
                .unwrap_or_else(|| BlockMetadata::new(CONTEXT_INSTANCE_NAME).context());
            let instance = Arc::new(BlockInstance::new(
                BlockId::new(),
                CONTEXT_INSTANCE_NAME.to_string(),
                loaded.id(),
                &meta,
                Box::new(ContextAdapter(context.clone())),
                Some(context.clone()),
                true,
                self.config.read().default_buffer_size,
            ));
            let id = instance.id();
            self.blocks.insert(id, instance.clone());
            loaded.set_context(context, id);
            self.setup(&id)?;
            instance.update_policy(|p| p.set_rate(CONTEXT_RATE_HZ));
            if instance.state() == BlockState::SetUp {
                self.start(&id)?;
            }
        }
        Ok(loaded.id())
    }

    pub(crate) fn unload_bundle(&self, id: &BundleId) -> Result<()> {
        let loaded = self.bundle(id)?;
        for block in loaded.instances() {
            self.shutdown_if_present(&block);
        }
        if let Some(context) = loaded.context_block() {
            self.shutdown_if_present(&context);
        }
        self.bundles.remove(id);
        tracing::info!(bundle = %loaded.name(), "bundle unloaded");
        Ok(())
    }

    fn shutdown_if_present(&self, id: &BlockId) {
        if self.blocks.contains_key(id)
            && let Err(e) = self.shutdown(id)
        {
            tracing::warn!(block = %id, error = %e, "shutdown during teardown failed");
        }
    }

    // ---- blocks ----

    pub(crate) fn create_block(&self, bundle: &BundleId, block_type: &str) -> Result<BlockId> {
        let loaded = self.bundle(bundle)?;
        let meta = loaded
            .bundle()
            .metadata()
            .find_block(block_type)
            .cloned()
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "block {} not found in bundle {}",
                    block_type,
                    loaded.name()
                ))
            })?;
        let context = loaded.context();
        let user = loaded
            .bundle()
            .create_block(&meta.name, context.as_ref())
            .map_err(|e| {
                EngineError::InvalidState(format!("block {} could not be created: {}", meta.name, e))
            })?;
        let name = loaded.next_instance_name(&meta.name);
        let instance = Arc::new(BlockInstance::new(
            BlockId::new(),
            name,
            loaded.id(),
            &meta,
            user,
            context,
            false,
            self.config.read().default_buffer_size,
        ));
        let id = instance.id();
        self.blocks.insert(id, instance.clone());
        loaded.add_instance(id);
        tracing::info!(block = %instance.name(), bundle = %loaded.name(), "block created");
        Ok(id)
    }

    /// Run a lifecycle call on a worker and wait for it. The in-flight slot is held for the
    /// duration so no update overlaps.
    fn run_exclusive(
        &self,
        block: &Arc<BlockInstance>,
        phase: Phase,
        call: fn(&BlockInstance) -> std::result::Result<(), BlockError>,
    ) -> Result<TaskOutcome> {
        if !block.in_flight().acquire(self.join_timeout()) {
            return Err(EngineError::InvalidState(format!(
                "{} is still executing",
                block.name()
            )));
        }
        let job_block = block.clone();
        let task = Task::new(block.id(), block.name(), phase, move || call(&job_block));
        let outcome = self.pool.submit_blocking(task).map(|handle| handle.wait());
        block.in_flight().release();
        outcome
    }

    pub(crate) fn setup(&self, id: &BlockId) -> Result<()> {
        let block = self.instance(id)?;
        let state = block.state();
        state.ensure(state.can_setup(), "set up", block.name())?;
        self.scheduler.deregister(id);
        let outcome = self.run_exclusive(&block, Phase::Setup, BlockInstance::run_setup)?;
        // restart the rate timer from setup
        block.update_policy(|_| {});
        match outcome {
            TaskOutcome::Completed => {
                block.set_state(BlockState::SetUp);
                tracing::info!(block = %block.name(), "block set up");
            }
            TaskOutcome::Failed(_) => block.set_state(BlockState::SetupFailed),
        }
        Ok(())
    }

    pub(crate) fn start(&self, id: &BlockId) -> Result<()> {
        let block = self.instance(id)?;
        block.transition(|s| s.can_start(), "start", BlockState::Running)?;
        self.scheduler.register(block.clone());
        tracing::info!(block = %block.name(), "block started");
        Ok(())
    }

    pub(crate) fn stop(&self, id: &BlockId) -> Result<()> {
        let block = self.instance(id)?;
        block.transition(|s| s.can_stop(), "stop", BlockState::Stopped)?;
        self.scheduler.deregister(id);
        if !block.in_flight().wait_idle(self.join_timeout()) {
            tracing::warn!(block = %block.name(), "stop timed out waiting for in-flight update");
        }
        tracing::info!(block = %block.name(), "block stopped");
        Ok(())
    }

    pub(crate) fn shutdown(&self, id: &BlockId) -> Result<()> {
        let block = self.instance(id)?;
        let previous =
            block.transition(|s| s.can_shutdown(), "shut down", BlockState::ShuttingDown)?;
        self.scheduler.deregister(id);
        if !block.in_flight().wait_idle(self.join_timeout()) {
            tracing::warn!(block = %block.name(), "shutdown timed out waiting for in-flight update");
        }
        if previous.was_set_up()
            && let Err(e) = self.run_exclusive(&block, Phase::Shutdown, BlockInstance::run_shutdown)
        {
            tracing::warn!(block = %block.name(), error = %e, "user shutdown skipped");
        }
        let removed = self.links.lock().remove_touching(id);
        if !removed.is_empty() {
            tracing::debug!(block = %block.name(), links = removed.len(), "links removed");
        }
        block.io().clear();
        self.blocks.remove(id);
        if let Some(bundle) = self.bundles.get(&block.bundle()) {
            bundle.remove_instance(id);
        }
        block.set_state(BlockState::Destroyed);
        tracing::info!(block = %block.name(), "block shut down");
        Ok(())
    }

    // ---- links ----

    /// Wire `outlet` into `inlet`. `Ok(false)` when the types are incompatible.
    pub(crate) fn link(
        &self,
        inlet: &PortAddress,
        outlet: &PortAddress,
        with_conversion: bool,
    ) -> Result<bool> {
        let (inlet_block, target) = self.resolve_inlet(inlet)?;
        let (_, outlet_port) = self.resolve_outlet(outlet)?;
        let outlet_key = PortAddress::new(outlet.block, outlet_port.name());

        let mut links = self.links.lock();
        let (member, added) = match &target {
            InletTarget::Multi(group) => {
                let existing = links.iter().find(|l| {
                    l.key().outlet == outlet_key
                        && l.key().inlet.block == inlet.block
                        && group.members().iter().any(|m| Arc::ptr_eq(m, l.inlet()))
                });
                if existing.is_some() {
                    return Ok(true);
                }
                if !self.compatible(outlet_port.kind(), &group.metadata().kind(), with_conversion) {
                    return Ok(false);
                }
                (group.add_member()?, true)
            }
            InletTarget::Plain(_, inlet) | InletTarget::Member(_, inlet) => (inlet.clone(), false),
        };
        let key = LinkKey {
            inlet: PortAddress::new(inlet.block, member.name()),
            outlet: outlet_key,
        };
        if links.contains(&key) {
            return Ok(true);
        }
        let link = {
            let conversions = self.conversions.read();
            Link::new(
                key.clone(),
                outlet_port,
                member.clone(),
                with_conversion.then_some(&*conversions),
            )
        };
        let link = match link {
            Ok(link) => link,
            Err(EngineError::TypeMismatch(reason)) => {
                tracing::debug!("link rejected: {}", reason);
                if added {
                    target.group().remove_member(&member);
                }
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        if let Some(previous) = links.upstream_of(&key.inlet) {
            links.remove(&previous);
        }
        let info = link.info();
        links.insert(link);
        tracing::info!(link = %info, block = %inlet_block.name(), "linked");
        Ok(true)
    }

    fn compatible(&self, from: &TypeKind, to: &TypeKind, with_conversion: bool) -> bool {
        from == to || (with_conversion && self.conversions.read().can_convert(from, to))
    }

    /// Remove the link between a specific inlet and outlet. Unknown links are a no-op.
    pub(crate) fn unlink(&self, inlet: &PortAddress, outlet: &PortAddress) -> Result<()> {
        let (_, target) = self.resolve_inlet(inlet)?;
        let (_, outlet_port) = self.resolve_outlet(outlet)?;
        let outlet_key = PortAddress::new(outlet.block, outlet_port.name());
        let mut links = self.links.lock();
        let members = match &target {
            InletTarget::Multi(group) => group.members(),
            InletTarget::Plain(_, inlet) | InletTarget::Member(_, inlet) => vec![inlet.clone()],
        };
        for member in members {
            let key = LinkKey {
                inlet: PortAddress::new(inlet.block, member.name()),
                outlet: outlet_key.clone(),
            };
            if let Some(link) = links.remove(&key) {
                tracing::info!(link = %link.info(), "unlinked");
            }
        }
        Ok(())
    }

    /// Remove every link touching an inlet (all members of a multi-inlet).
    pub(crate) fn unlink_inlet(&self, inlet: &PortAddress) -> Result<()> {
        let (_, target) = self.resolve_inlet(inlet)?;
        let members = match &target {
            InletTarget::Multi(group) => group.members(),
            InletTarget::Plain(_, inlet) | InletTarget::Member(_, inlet) => vec![inlet.clone()],
        };
        let mut links = self.links.lock();
        for member in members {
            let address = PortAddress::new(inlet.block, member.name());
            if let Some(key) = links.upstream_of(&address) {
                links.remove(&key);
            }
        }
        Ok(())
    }

    pub(crate) fn unlink_outlet(&self, outlet: &PortAddress) -> Result<()> {
        let (_, outlet_port) = self.resolve_outlet(outlet)?;
        let outlet_key = PortAddress::new(outlet.block, outlet_port.name());
        let mut links = self.links.lock();
        let keys: Vec<LinkKey> = links
            .iter()
            .filter(|l| l.key().outlet == outlet_key)
            .map(|l| l.key().clone())
            .collect();
        for key in keys {
            links.remove(&key);
        }
        Ok(())
    }

    /// Remove a multi-inlet member, unlinking it first.
    pub(crate) fn remove_inlet_member(&self, group: &PortAddress, member: &PortAddress) -> Result<()> {
        let (block, target) = self.resolve_inlet(group)?;
        let InletTarget::Multi(group) = target else {
            return Err(EngineError::InvalidState(format!(
                "inlet {} of {} is not a multi-inlet",
                group.port,
                block.name()
            )));
        };
        let inlet = group
            .find_member(&member.port)
            .filter(|_| member.block == block.id())
            .ok_or_else(|| {
                EngineError::NotFound(format!("inlet {} not found in {}", member.port, block.name()))
            })?;
        {
            let mut links = self.links.lock();
            let address = PortAddress::new(block.id(), inlet.name());
            if let Some(key) = links.upstream_of(&address) {
                links.remove(&key);
            }
        }
        group.remove_member(&inlet);
        Ok(())
    }

    pub(crate) fn link_infos(&self) -> Vec<LinkInfo> {
        self.links.lock().iter().map(Link::info).collect()
    }

    pub(crate) fn upstream_of(&self, inlet: &PortAddress) -> Option<LinkKey> {
        self.links.lock().upstream_of(inlet)
    }

    pub(crate) fn links_snapshot(&self) -> Vec<(LinkKey, bool)> {
        self.links
            .lock()
            .iter()
            .map(|l| (l.key().clone(), l.uses_conversion()))
            .collect()
    }

    // ---- bulk ----

    pub(crate) fn clear_block_instances(&self) {
        let ids: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|e| !e.value().is_context())
            .map(|e| *e.key())
            .collect();
        for id in ids {
            self.shutdown_if_present(&id);
        }
        self.links.lock().clear();
    }

    pub(crate) fn clear_fully(&self) {
        self.clear_block_instances();
        for bundle in self.bundles.all() {
            if let Err(e) = self.unload_bundle(&bundle.id()) {
                tracing::warn!(bundle = %bundle.name(), error = %e, "unload failed");
            }
        }
    }
}

/// The block execution engine.
pub struct Engine {
    shared: Arc<EngineShared>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("bundles", &self.shared.bundles.len())
            .field("blocks", &self.shared.blocks.len())
            .field("links", &self.shared.links.lock().len())
            .finish()
    }
}

impl Engine {
    pub fn new(config: EngineConfig, loader: impl BundleLoader + 'static) -> Result<Self> {
        let exceptions = Arc::new(ExceptionRegistry::new());
        let clock = Arc::new(Clock::new());
        let pool = Arc::new(ThreadPool::new(
            config.worker_threads,
            config.join_timeout(),
            exceptions.clone(),
        )?);
        let scheduler = Scheduler::new(pool.clone(), clock.clone());
        if let Some(interval) = config.tick_interval() {
            scheduler.start_timer(interval)?;
        }
        tracing::info!(
            workers = config.worker_threads,
            tick_ms = ?config.tick_interval_ms,
            "engine started"
        );
        Ok(Self {
            shared: Arc::new(EngineShared {
                config: RwLock::new(config),
                clock,
                exceptions,
                pool,
                scheduler,
                conversions: RwLock::new(ConversionRegistry::with_defaults()),
                loader: Arc::new(loader),
                bundles: BundleCollection::new(),
                blocks: DashMap::new(),
                links: Mutex::new(LinkSet::new()),
            }),
        })
    }

    pub fn config(&self) -> EngineConfig {
        self.shared.config.read().clone()
    }

    pub fn set_base_directory(&self, dir: impl Into<PathBuf>) {
        self.shared.config.write().base_directory = Some(dir.into());
    }

    /// Load a bundle. Loading the same resolved path twice fails with `AlreadyExists`.
    pub fn load_bundle(&self, path: impl AsRef<Path>) -> Result<BundleHandle> {
        let id = self.shared.load_bundle(path.as_ref())?;
        Ok(BundleHandle::new(&self.shared, id))
    }

    pub fn bundles(&self) -> Vec<BundleHandle> {
        self.shared
            .bundles
            .all()
            .iter()
            .map(|b| BundleHandle::new(&self.shared, b.id()))
            .collect()
    }

    pub fn find_bundle_by_name(&self, name: &str) -> Result<BundleHandle> {
        self.shared
            .bundles
            .find_by_name(name)
            .map(|b| BundleHandle::new(&self.shared, b.id()))
            .ok_or_else(|| EngineError::NotFound(format!("bundle {} not found", name)))
    }

    pub fn find_bundle_by_path(&self, path: impl AsRef<Path>) -> Result<BundleHandle> {
        let resolved = self.shared.resolve_path(path.as_ref());
        self.shared
            .bundles
            .find_by_path(&resolved)
            .map(|b| BundleHandle::new(&self.shared, b.id()))
            .ok_or_else(|| {
                EngineError::NotFound(format!("bundle {} not found", resolved.display()))
            })
    }

    /// All live block instances, context blocks included.
    pub fn block_instances(&self) -> Vec<BlockHandle> {
        let mut blocks: Vec<Arc<BlockInstance>> =
            self.shared.blocks.iter().map(|e| e.value().clone()).collect();
        blocks.sort_by(|a, b| a.name().cmp(b.name()));
        blocks
            .iter()
            .map(|b| BlockHandle::new(&self.shared, b.id()))
            .collect()
    }

    pub fn find_block(&self, name: &str) -> Result<BlockHandle> {
        let block = self.shared.find_instance(name)?;
        Ok(BlockHandle::new(&self.shared, block.id()))
    }

    pub fn links(&self) -> Vec<LinkInfo> {
        self.shared.link_infos()
    }

    /// Shut down every non-context block and remove all links.
    pub fn clear_block_instances(&self) {
        self.shared.clear_block_instances();
    }

    /// Shut down everything and unload every bundle.
    pub fn clear_fully(&self) {
        self.shared.clear_fully();
    }

    /// Run one scheduling pass. Returns the number of updates submitted.
    pub fn step(&self) -> usize {
        self.shared.scheduler.tick()
    }

    /// Wait for all submitted work to finish. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.shared.pool.wait_all(timeout)
    }

    /// One scheduling pass followed by a wait for the submitted updates.
    pub fn step_and_wait(&self, timeout: Duration) -> usize {
        let submitted = self.step();
        self.wait_idle(timeout);
        submitted
    }

    pub fn register_exception_callback(
        &self,
        callback: impl Fn(&BlockException) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        self.shared.exceptions.register(callback)
    }

    pub fn register_exception_handler(&self, handler: Arc<ExceptionHandler>) -> SubscriptionToken {
        self.shared.exceptions.register_handler(handler)
    }

    pub fn unregister_exception_callback(&self, token: SubscriptionToken) -> bool {
        self.shared.exceptions.unregister(token)
    }

    pub fn unregister_exception_handler(&self, handler: &Arc<ExceptionHandler>) -> bool {
        self.shared.exceptions.unregister_handler(handler)
    }

    /// Add or replace a converter used by `link_with_conversion`.
    pub fn register_conversion(
        &self,
        from: TypeKind,
        to: TypeKind,
        converter: impl Fn(&TypedValue) -> Result<TypedValue> + Send + Sync + 'static,
    ) {
        self.shared.conversions.write().register(from, to, converter);
    }

    pub fn export_graph(&self) -> Result<GraphConfig> {
        persist::export_graph(&self.shared)
    }

    pub fn import_graph(&self, graph: &GraphConfig) -> Result<()> {
        persist::import_graph(&self.shared, graph)
    }

    pub fn save_config(&self, path: impl AsRef<Path>) -> Result<()> {
        self.export_graph()?.save(path.as_ref())
    }

    pub fn load_config(&self, path: impl AsRef<Path>) -> Result<()> {
        let graph = GraphConfig::load(path.as_ref())?;
        self.import_graph(&graph)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.scheduler.stop_timer();
        self.shared.clear_fully();
        self.shared.pool.shutdown();
        tracing::info!("engine stopped");
    }
}
