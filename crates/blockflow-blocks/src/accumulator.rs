//! Accumulator block: sums every member of the `values` multi-inlet.
//!
//! Each link into `values` adds a member, so one Accumulator can take any number of
//! upstream outlets. Members that have not received data yet contribute their default.

use blockflow_core::{Block, BlockError, BlockIo, BlockMetadata, InletMetadata, OutletMetadata};

pub const NAME: &str = "Accumulator";

pub fn metadata() -> BlockMetadata {
    BlockMetadata::new(NAME)
        .description("Sums all connected inputs")
        .category("math")
        .inlet(InletMetadata::new("values", 0i32).multi())
        .outlet(OutletMetadata::new("sum", 0i64))
        .outlet(OutletMetadata::new("inputs", 0u32))
}

#[derive(Debug, Default)]
pub struct AccumulatorBlock;

impl Block for AccumulatorBlock {
    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        let values: Vec<i32> = io.multi_inlet("values")?;
        let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
        io.set_output("sum", sum)?;
        io.set_output("inputs", values.len() as u32)?;
        Ok(())
    }
}
