//! Identity and bundle bookkeeping: ids, instance naming, bundle metadata, loaders and the
//! collection of loaded bundles.

mod bundle;
mod collection;
mod id;
mod loader;

pub use bundle::{Bundle, BundleInfo, BundleMetadata, CONTEXT_INSTANCE_NAME, Version};
pub use collection::{BundleCollection, LoadedBundle};
pub use id::{BlockId, BundleId, Identifier, instance_name};
pub use loader::{BundleLoader, StaticBundleLoader};
