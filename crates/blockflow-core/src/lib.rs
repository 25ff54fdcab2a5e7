//! # blockflow-core
//!
//! A block execution engine. Blocks are units of user code with typed parameters, inlets and
//! outlets. Outlets are linked to inlets to form a dataflow graph; a tick-driven scheduler
//! runs every ready block on a fixed worker pool, at most one execution per block at a time.
//!
//! Start with [`Engine`]: load a bundle, create block instances, link their ports through the
//! returned handles, then set up and start the blocks.

pub mod block;
pub mod config;
pub mod engine;
pub mod error;
pub mod link;
pub mod observability;
pub mod policy;
pub mod port;
pub mod registry;
pub mod runtime;
pub mod value;

pub use block::{Block, BlockIo, BlockState, ContextBlock, NewBlockData, SharedContext};
pub use config::EngineConfig;
pub use engine::{
    BlockHandle, BundleHandle, Engine, GraphConfig, InletHandle, OutletHandle, ParameterHandle,
    UpdatePolicyHandle,
};
pub use error::{BlockError, EngineError, Result};
pub use link::LinkInfo;
pub use observability::init_observability;
pub use policy::{Gating, InletPolicy, UpdatePolicy};
pub use port::{
    BlockMetadata, EventHandler, InletMetadata, OutletMetadata, ParameterMetadata,
    SubscriptionToken, TimestampedValue,
};
pub use registry::{Bundle, BundleLoader, BundleMetadata, StaticBundleLoader, Version};
pub use runtime::{BlockException, Phase};
pub use value::{OptionSet, TypeKind, TypedValue, ValueType};
