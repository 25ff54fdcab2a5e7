use std::sync::Arc;

use blockflow_core::registry::{Bundle, BundleMetadata, Version};
use blockflow_core::{Block, BlockError, Result, SharedContext};

use crate::accumulator::{self, AccumulatorBlock};
use crate::clock::{self, ClockBlock};
use crate::context::{self, BasicContext};
use crate::counter::{self, CounterBlock};
use crate::doubler::{self, DoublerBlock};
use crate::printer::{self, PrinterBlock};

pub const BUNDLE_NAME: &str = "Basic";

/// The built-in bundle: Counter, Doubler, Accumulator, Printer and Clock, plus a context.
#[derive(Debug)]
pub struct BasicBundle {
    metadata: BundleMetadata,
}

impl BasicBundle {
    pub fn new() -> Result<Self> {
        let metadata = BundleMetadata::new(BUNDLE_NAME)
            .description("Sources, arithmetic and logging sinks")
            .author("blockflow")
            .category("basic")
            .version(Version::new(0, 1, 0))
            .with_context(context::metadata())?
            .with_block(counter::metadata())?
            .with_block(doubler::metadata())?
            .with_block(accumulator::metadata())?
            .with_block(printer::metadata())?
            .with_block(clock::metadata())?;
        Ok(Self { metadata })
    }
}

impl Bundle for BasicBundle {
    fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }

    fn create_context(&self) -> std::result::Result<Option<SharedContext>, BlockError> {
        let context: SharedContext = Arc::new(BasicContext::default());
        Ok(Some(context))
    }

    fn create_block(
        &self,
        name: &str,
        _context: Option<&SharedContext>,
    ) -> std::result::Result<Box<dyn Block>, BlockError> {
        let block: Box<dyn Block> = match name.to_ascii_lowercase().as_str() {
            "counter" => Box::new(CounterBlock::default()),
            "doubler" => Box::new(DoublerBlock),
            "accumulator" => Box::new(AccumulatorBlock),
            "printer" => Box::new(PrinterBlock::default()),
            "clock" => Box::new(ClockBlock),
            other => {
                return Err(BlockError::Other(format!(
                    "{} has no block type {}",
                    BUNDLE_NAME, other
                )));
            }
        };
        Ok(block)
    }
}
