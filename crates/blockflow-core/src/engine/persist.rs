//! Saving and restoring a block graph as JSON.
//!
//! The file lists loaded bundles (name and path), block instances with their policy, inlet
//! and parameter values, and the links between them. Context blocks are not written; they
//! come back with their bundle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::EngineShared;
use crate::block::{BlockInstance, BlockState};
use crate::error::{EngineError, Result};
use crate::link::PortAddress;
use crate::policy::{Gating, InletPolicy};
use crate::port::Inlet;
use crate::registry::{BlockId, BundleId};
use crate::value::TypedValue;

const fn default_version() -> u32 {
    1
}

const fn default_saved_state() -> BlockState {
    BlockState::SetUp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub bundles: Vec<BundleConfig>,
    #[serde(default)]
    pub blocks: Vec<BlockConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            bundles: Vec::new(),
            blocks: Vec::new(),
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockConfig {
    pub bundle: String,
    pub block_type: String,
    pub name: String,
    /// Lifecycle state at export time. Import runs setup unless this is `created` and
    /// starts the block again when it was `running`.
    #[serde(default = "default_saved_state")]
    pub state: BlockState,
    #[serde(default)]
    pub update_rate: f64,
    #[serde(default)]
    pub gating: Gating,
    #[serde(default)]
    pub default_inlet_policy: InletPolicy,
    #[serde(default)]
    pub inlets: Vec<InletConfig>,
    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
}

/// One inlet. A multi-inlet lists its members and carries no value of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InletConfig {
    pub name: String,
    /// Visible value as text, when it differs from the default and no link feeds the inlet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<InletPolicy>,
    pub buffer_size: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<InletConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterConfig {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkConfig {
    pub outlet_block: String,
    pub outlet: String,
    pub inlet_block: String,
    pub inlet: String,
    #[serde(default)]
    pub with_conversion: bool,
}

impl GraphConfig {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::Persistence(format!("failed to encode graph: {}", e)))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| EngineError::Persistence(format!("failed to decode graph: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_json()?;
        std::fs::write(path, text).map_err(|e| {
            EngineError::Persistence(format!("failed to write {}: {}", path.display(), e))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Persistence(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }
}

fn inlet_config(inlet: &Inlet, linked: bool) -> InletConfig {
    let value = inlet.value();
    InletConfig {
        name: inlet.name().to_string(),
        value: (!linked && value != inlet.default_value()).then(|| value.to_text()),
        policy: inlet.policy(),
        buffer_size: inlet.buffer_size(),
        members: Vec::new(),
    }
}

fn block_config(engine: &EngineShared, block: &BlockInstance) -> Result<BlockConfig> {
    let bundle = engine.bundle(&block.bundle())?;
    let policy = block.policy();
    let is_linked =
        |inlet: &Inlet| engine.upstream_of(&PortAddress::new(block.id(), inlet.name())).is_some();

    let mut inlets = Vec::new();
    for group in block.io().inlet_groups() {
        match group.single() {
            Some(inlet) => inlets.push(inlet_config(&inlet, is_linked(&inlet))),
            None => inlets.push(InletConfig {
                name: group.name().to_string(),
                value: None,
                policy: group.policy(),
                buffer_size: group.buffer_size(),
                members: group
                    .members()
                    .iter()
                    .map(|m| inlet_config(m, is_linked(m)))
                    .collect(),
            }),
        }
    }

    Ok(BlockConfig {
        bundle: bundle.name().to_string(),
        block_type: block.type_name().to_string(),
        name: block.name().to_string(),
        state: block.state(),
        update_rate: policy.rate_hz,
        gating: policy.gating,
        default_inlet_policy: policy.default_inlet_policy,
        inlets,
        parameters: block
            .io()
            .parameters()
            .iter()
            .map(|p| ParameterConfig {
                name: p.name().to_string(),
                value: p.latest().to_text(),
            })
            .collect(),
    })
}

pub(crate) fn export_graph(engine: &EngineShared) -> Result<GraphConfig> {
    let bundles = engine
        .bundles
        .all()
        .iter()
        .map(|b| BundleConfig {
            name: b.name().to_string(),
            path: b.path().to_path_buf(),
        })
        .collect();

    let mut instances: Vec<_> = engine
        .blocks
        .iter()
        .map(|e| e.value().clone())
        .filter(|b| !b.is_context())
        .collect();
    instances.sort_by(|a, b| a.name().cmp(b.name()));
    let blocks = instances
        .iter()
        .map(|b| block_config(engine, b))
        .collect::<Result<Vec<_>>>()?;

    let mut links = Vec::new();
    for (key, with_conversion) in engine.links_snapshot() {
        let inlet_block = engine.instance(&key.inlet.block)?;
        let outlet_block = engine.instance(&key.outlet.block)?;
        links.push(LinkConfig {
            outlet_block: outlet_block.name().to_string(),
            outlet: key.outlet.port,
            inlet_block: inlet_block.name().to_string(),
            inlet: key.inlet.port,
            with_conversion,
        });
    }

    Ok(GraphConfig {
        version: default_version(),
        bundles,
        blocks,
        links,
    })
}

fn apply_inlet(engine: &EngineShared, inlet: &Inlet, config: &InletConfig) -> Result<()> {
    inlet.set_policy(config.policy);
    inlet.set_buffer_size(config.buffer_size);
    if let Some(text) = &config.value {
        let value = TypedValue::from_text(inlet.kind(), text)?;
        inlet.set_data(value, engine.now())?;
    }
    Ok(())
}

/// Blocks and bundles an import created, so a failed import can take them back out.
#[derive(Default)]
struct Restored {
    bundles: Vec<BundleId>,
    blocks: Vec<BlockId>,
}

impl Restored {
    fn roll_back(self, engine: &EngineShared) {
        for id in self.blocks.iter().rev() {
            engine.shutdown_if_present(id);
        }
        for id in self.bundles.iter().rev() {
            if let Err(e) = engine.unload_bundle(id) {
                tracing::warn!(bundle = %id, error = %e, "unload during rollback failed");
            }
        }
    }
}

/// Recreate a saved graph on top of whatever is already loaded. Bundles already present by
/// name are reused; saved block names map to the names the new instances receive. On error
/// everything the import added is removed again.
pub(crate) fn import_graph(engine: &EngineShared, graph: &GraphConfig) -> Result<()> {
    let mut restored = Restored::default();
    match restore(engine, graph, &mut restored) {
        Ok(()) => {
            tracing::info!(
                blocks = graph.blocks.len(),
                links = graph.links.len(),
                "graph imported"
            );
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "graph import failed, rolling back");
            restored.roll_back(engine);
            Err(e)
        }
    }
}

fn restore(engine: &EngineShared, graph: &GraphConfig, restored: &mut Restored) -> Result<()> {
    for bundle in &graph.bundles {
        if engine.bundles.find_by_name(&bundle.name).is_none() {
            restored.bundles.push(engine.load_bundle(&bundle.path)?);
        }
    }

    let mut ids: HashMap<&str, BlockId> = HashMap::new();
    // (saved block, saved member name) -> new member name
    let mut members: HashMap<(&str, &str), String> = HashMap::new();

    for config in &graph.blocks {
        let bundle = engine.bundles.find_by_name(&config.bundle).ok_or_else(|| {
            EngineError::NotFound(format!("bundle {} not found", config.bundle))
        })?;
        let id = engine.create_block(&bundle.id(), &config.block_type)?;
        restored.blocks.push(id);
        ids.insert(config.name.as_str(), id);
        let block = engine.instance(&id)?;
        block.update_policy(|p| {
            p.set_rate(config.update_rate);
            p.gating = config.gating;
            p.default_inlet_policy = config.default_inlet_policy;
        });

        for parameter in &config.parameters {
            let port = block.io().parameter(&parameter.name)?;
            port.set(TypedValue::from_text(port.kind(), &parameter.value)?)?;
        }

        for inlet in &config.inlets {
            let group = block.io().inlet_group(&inlet.name)?;
            match group.single() {
                Some(port) => apply_inlet(engine, &port, inlet)?,
                None => {
                    group.set_policy(inlet.policy);
                    group.set_buffer_size(inlet.buffer_size);
                    for member in &inlet.members {
                        let port = group.add_member()?;
                        apply_inlet(engine, &port, member)?;
                        members.insert(
                            (config.name.as_str(), member.name.as_str()),
                            port.name().to_string(),
                        );
                    }
                }
            }
        }

        if config.state != BlockState::Created {
            engine.setup(&id)?;
        }
        tracing::debug!(saved = %config.name, block = %block.name(), "block restored");
    }

    let lookup = |name: &str| {
        ids.get(name)
            .copied()
            .ok_or_else(|| EngineError::NotFound(format!("block {} not found", name)))
    };
    for link in &graph.links {
        let inlet_port = members
            .get(&(link.inlet_block.as_str(), link.inlet.as_str()))
            .cloned()
            .unwrap_or_else(|| link.inlet.clone());
        let inlet = PortAddress::new(lookup(&link.inlet_block)?, inlet_port);
        let outlet = PortAddress::new(lookup(&link.outlet_block)?, link.outlet.clone());
        if !engine.link(&inlet, &outlet, link.with_conversion)? {
            return Err(EngineError::TypeMismatch(format!(
                "saved link {}.{} -> {}.{} no longer type-checks",
                link.outlet_block, link.outlet, link.inlet_block, link.inlet
            )));
        }
    }

    for config in graph.blocks.iter().filter(|b| b.state == BlockState::Running) {
        let id = lookup(&config.name)?;
        let block = engine.instance(&id)?;
        if block.state().can_start() {
            engine.start(&id)?;
        } else {
            tracing::warn!(block = %block.name(), state = %block.state(), "not restarted");
        }
    }
    Ok(())
}
