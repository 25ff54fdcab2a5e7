//! Bundle context shared by every block of the basic bundle.

use std::sync::atomic::{AtomicU64, Ordering};

use blockflow_core::{BlockError, BlockIo, BlockMetadata, ContextBlock};

pub const CONTEXT_NAME: &str = "Basic Context";

pub fn metadata() -> BlockMetadata {
    BlockMetadata::new(CONTEXT_NAME)
        .description("Counts its own ticks and the values produced by counters of the bundle")
        .category("context")
}

#[derive(Debug, Default)]
pub struct BasicContext {
    ticks: AtomicU64,
    produced: AtomicU64,
}

impl BasicContext {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn produced(&self) -> u64 {
        self.produced.load(Ordering::SeqCst)
    }

    pub(crate) fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::SeqCst);
    }
}

impl ContextBlock for BasicContext {
    fn update(&self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        let ticks = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!("[{}] tick {}", io.block_name(), ticks);
        Ok(())
    }
}
