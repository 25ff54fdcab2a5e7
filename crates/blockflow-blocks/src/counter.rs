//! Counter block: emits 1, 2, 3, ... on each update, advancing by the `step` parameter.

use blockflow_core::{
    Block, BlockError, BlockIo, BlockMetadata, OutletMetadata, ParameterMetadata,
};

use crate::context::BasicContext;

pub const NAME: &str = "Counter";

pub fn metadata() -> BlockMetadata {
    BlockMetadata::new(NAME)
        .description("Emits an increasing integer on every update")
        .category("source")
        .outlet(OutletMetadata::new("counter", 0i32).description("current count"))
        .parameter(ParameterMetadata::new("step", 1i32).description("increment per update"))
}

#[derive(Debug, Default)]
pub struct CounterBlock {
    count: i32,
}

impl Block for CounterBlock {
    fn setup(&mut self, _io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        self.count = 0;
        Ok(())
    }

    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        let step: i32 = io.parameter("step")?;
        self.count = self.count.wrapping_add(step);
        io.set_output("counter", self.count)?;
        if let Ok(context) = io.context::<BasicContext>() {
            context.record_produced();
        }
        Ok(())
    }
}
