//! Doubler block: `result = 2 * number`.

use blockflow_core::{Block, BlockError, BlockIo, BlockMetadata, InletMetadata, OutletMetadata};

pub const NAME: &str = "Doubler";

pub fn metadata() -> BlockMetadata {
    BlockMetadata::new(NAME)
        .description("Doubles its input")
        .category("math")
        .inlet(InletMetadata::new("number", 0i32).description("value to double"))
        .outlet(OutletMetadata::new("result", 0i32))
}

#[derive(Debug, Default)]
pub struct DoublerBlock;

impl Block for DoublerBlock {
    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        let n: i32 = io.inlet("number")?;
        io.set_output("result", n.wrapping_mul(2))?;
        Ok(())
    }
}
