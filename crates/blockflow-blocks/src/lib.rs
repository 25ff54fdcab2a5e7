//! Built-in blocks for blockflow. Use with [`default_loader`] or [`new_engine`].

mod accumulator;
mod bundle;
mod clock;
mod context;
mod counter;
mod doubler;
mod printer;

use std::sync::Arc;

pub use accumulator::AccumulatorBlock;
pub use bundle::{BUNDLE_NAME, BasicBundle};
pub use clock::ClockBlock;
pub use context::BasicContext;
pub use counter::CounterBlock;
pub use doubler::DoublerBlock;
pub use printer::PrinterBlock;

pub use blockflow_core::{Engine, EngineConfig, EngineError, Result};
use blockflow_core::StaticBundleLoader;

/// Path under which the basic bundle is registered. Any path with the file stem `basic`
/// resolves to it, e.g. `plugins/basic.so`.
pub const BASIC_BUNDLE_PATH: &str = "basic";

/// A loader preloaded with the basic bundle.
pub fn default_loader() -> Result<StaticBundleLoader> {
    Ok(StaticBundleLoader::new().with(BASIC_BUNDLE_PATH, Arc::new(BasicBundle::new()?)))
}

/// An engine over [`default_loader`]. Bundles still need to be loaded explicitly.
pub fn new_engine(config: EngineConfig) -> Result<Engine> {
    Engine::new(config, default_loader()?)
}
