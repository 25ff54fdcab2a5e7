use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::bundle::Bundle;
use crate::error::{EngineError, Result};

/// Resolves a bundle path to a bundle. Dynamic library loading lives behind this trait.
pub trait BundleLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<dyn Bundle>>;
}

/// Loader over bundles compiled into the host. A request matches an entry by its full path
/// or by file stem, so `plugins/basic.so` resolves an entry registered as `basic`.
#[derive(Clone, Default)]
pub struct StaticBundleLoader {
    entries: Vec<(PathBuf, Arc<dyn Bundle>)>,
}

impl fmt::Debug for StaticBundleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(p, _)| p))
            .finish()
    }
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

impl StaticBundleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, bundle: Arc<dyn Bundle>) -> Self {
        self.register(path, bundle);
        self
    }

    pub fn register(&mut self, path: impl Into<PathBuf>, bundle: Arc<dyn Bundle>) {
        self.entries.push((path.into(), bundle));
    }
}

impl BundleLoader for StaticBundleLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn Bundle>> {
        let wanted = stem(path);
        self.entries
            .iter()
            .find(|(p, _)| p == path || (wanted.is_some() && stem(p) == wanted))
            .map(|(_, b)| b.clone())
            .ok_or_else(|| EngineError::NotFound(format!("bundle {} not found", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, SharedContext};
    use crate::error::BlockError;
    use crate::registry::BundleMetadata;

    struct Empty(BundleMetadata);

    impl Bundle for Empty {
        fn metadata(&self) -> &BundleMetadata {
            &self.0
        }

        fn create_block(
            &self,
            name: &str,
            _context: Option<&SharedContext>,
        ) -> Result<Box<dyn Block>, BlockError> {
            Err(BlockError::Other(format!("no block {}", name)))
        }
    }

    #[test]
    fn resolves_by_path_or_stem() {
        let loader =
            StaticBundleLoader::new().with("basic", Arc::new(Empty(BundleMetadata::new("basic"))));
        assert!(loader.load(Path::new("basic")).is_ok());
        assert!(loader.load(Path::new("/opt/bundles/Basic.so")).is_ok());
        let err = loader.load(Path::new("other")).err().unwrap();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
