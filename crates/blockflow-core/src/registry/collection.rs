use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::bundle::Bundle;
use super::id::{BlockId, BundleId, instance_name};
use crate::block::SharedContext;

/// A bundle the engine has loaded, with the instances it has spawned.
pub struct LoadedBundle {
    id: BundleId,
    path: PathBuf,
    bundle: Arc<dyn Bundle>,
    counters: Mutex<HashMap<String, usize>>,
    instances: Mutex<Vec<BlockId>>,
    context: Mutex<Option<(SharedContext, BlockId)>>,
}

impl fmt::Debug for LoadedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedBundle")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("path", &self.path)
            .field("instances", &self.instances.lock().len())
            .finish()
    }
}

impl LoadedBundle {
    pub fn new(path: PathBuf, bundle: Arc<dyn Bundle>) -> Self {
        Self {
            id: BundleId::new(),
            path,
            bundle,
            counters: Mutex::new(HashMap::new()),
            instances: Mutex::new(Vec::new()),
            context: Mutex::new(None),
        }
    }

    pub fn id(&self) -> BundleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.bundle.metadata().name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bundle(&self) -> &Arc<dyn Bundle> {
        &self.bundle
    }

    /// Next instance name for a block type, counting from 0 per type.
    pub fn next_instance_name(&self, block_type: &str) -> String {
        let mut counters = self.counters.lock();
        let n = counters.entry(block_type.to_string()).or_insert(0);
        let name = instance_name(block_type, *n);
        *n += 1;
        name
    }

    pub fn add_instance(&self, id: BlockId) {
        self.instances.lock().push(id);
    }

    pub fn remove_instance(&self, id: &BlockId) {
        self.instances.lock().retain(|i| i != id);
    }

    pub fn instances(&self) -> Vec<BlockId> {
        self.instances.lock().clone()
    }

    pub fn context(&self) -> Option<SharedContext> {
        self.context.lock().as_ref().map(|(c, _)| c.clone())
    }

    pub fn context_block(&self) -> Option<BlockId> {
        self.context.lock().as_ref().map(|(_, id)| *id)
    }

    pub fn set_context(&self, context: SharedContext, block: BlockId) {
        *self.context.lock() = Some((context, block));
    }
}

/// Loaded bundles in load order.
#[derive(Debug, Default)]
pub struct BundleCollection {
    bundles: RwLock<Vec<Arc<LoadedBundle>>>,
}

impl BundleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bundle: Arc<LoadedBundle>) {
        self.bundles.write().push(bundle);
    }

    pub fn remove(&self, id: &BundleId) -> Option<Arc<LoadedBundle>> {
        let mut bundles = self.bundles.write();
        let index = bundles.iter().position(|b| b.id() == *id)?;
        Some(bundles.remove(index))
    }

    pub fn get(&self, id: &BundleId) -> Option<Arc<LoadedBundle>> {
        self.bundles.read().iter().find(|b| b.id() == *id).cloned()
    }

    pub fn find_by_path(&self, path: &Path) -> Option<Arc<LoadedBundle>> {
        self.bundles.read().iter().find(|b| b.path() == path).cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<LoadedBundle>> {
        self.bundles
            .read()
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn all(&self) -> Vec<Arc<LoadedBundle>> {
        self.bundles.read().clone()
    }

    pub fn clear(&self) -> Vec<Arc<LoadedBundle>> {
        std::mem::take(&mut *self.bundles.write())
    }

    pub fn len(&self) -> usize {
        self.bundles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
