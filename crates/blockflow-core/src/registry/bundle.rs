use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::{Block, SharedContext};
use crate::error::{BlockError, EngineError, Result};
use crate::port::{BlockInfo, BlockMetadata};

/// Instance name given to a bundle's context block.
pub const CONTEXT_INSTANCE_NAME: &str = "bundle context";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What a bundle offers: descriptive fields plus the block types it can create.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BundleMetadata {
    pub name: String,
    pub description: String,
    pub author: String,
    pub contact: String,
    pub category: String,
    pub version: Version,
    pub blocks: Vec<BlockMetadata>,
    pub context: Option<BlockMetadata>,
}

impl BundleMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Add a block type. Names are unique per bundle, ignoring case.
    pub fn with_block(mut self, block: BlockMetadata) -> Result<Self> {
        if self.find_block(&block.name).is_some() {
            return Err(EngineError::AlreadyExists(format!(
                "block {} already exists in bundle {}",
                block.name, self.name
            )));
        }
        block.validate()?;
        self.blocks.push(block);
        Ok(self)
    }

    pub fn with_context(mut self, context: BlockMetadata) -> Result<Self> {
        if self.context.is_some() {
            return Err(EngineError::AlreadyExists(format!(
                "context already exists in bundle {}",
                self.name
            )));
        }
        context.validate()?;
        self.context = Some(context.context());
        Ok(self)
    }

    pub fn find_block(&self, name: &str) -> Option<&BlockMetadata> {
        self.blocks
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }

    pub fn info(&self) -> BundleInfo {
        BundleInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            author: self.author.clone(),
            contact: self.contact.clone(),
            category: self.category.clone(),
            version: self.version.to_string(),
            has_context: self.context.is_some(),
            blocks: self.blocks.iter().map(BlockMetadata::info).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleInfo {
    pub name: String,
    pub description: String,
    pub author: String,
    pub contact: String,
    pub category: String,
    pub version: String,
    pub has_context: bool,
    pub blocks: Vec<BlockInfo>,
}

/// A loadable unit of block types.
pub trait Bundle: Send + Sync {
    fn metadata(&self) -> &BundleMetadata;

    /// The bundle-wide context, if the bundle declares one.
    fn create_context(&self) -> Result<Option<SharedContext>, BlockError> {
        Ok(None)
    }

    fn create_block(
        &self,
        name: &str,
        context: Option<&SharedContext>,
    ) -> Result<Box<dyn Block>, BlockError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{InletMetadata, OutletMetadata};

    #[test]
    fn duplicate_block_names_are_rejected_ignoring_case() {
        let meta = BundleMetadata::new("basic")
            .with_block(BlockMetadata::new("Counter"))
            .unwrap();
        let err = meta.with_block(BlockMetadata::new("counter")).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyExists(_)));
    }

    #[test]
    fn info_lists_blocks_and_version() {
        let meta = BundleMetadata::new("basic")
            .author("blockflow")
            .version(Version::new(1, 2, 3))
            .with_block(
                BlockMetadata::new("Doubler")
                    .inlet(InletMetadata::new("number", 0i32))
                    .outlet(OutletMetadata::new("result", 0i32)),
            )
            .unwrap();
        let info = meta.info();
        assert_eq!(info.version, "1.2.3");
        assert_eq!(info.blocks[0].inlets[0].name, "number");
        assert!(!info.has_context);
    }
}
