//! Printer block: logs each new `text` value, prefixed by the `prefix` inlet.

use blockflow_core::{
    Block, BlockError, BlockIo, BlockMetadata, InletMetadata, InletPolicy, OutletMetadata,
};

pub const NAME: &str = "Printer";

pub fn metadata() -> BlockMetadata {
    BlockMetadata::new(NAME)
        .description("Logs incoming text")
        .category("sink")
        .inlet(InletMetadata::new("text", String::new()))
        .inlet(
            InletMetadata::new("prefix", String::new())
                .description("prepended to every line; never triggers an update")
                .policy(InletPolicy::Always),
        )
        .outlet(OutletMetadata::new("line", String::new()))
}

#[derive(Debug, Default)]
pub struct PrinterBlock {
    printed: u64,
}

impl Block for PrinterBlock {
    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        let text: String = io.inlet("text")?;
        let prefix: String = io.inlet("prefix")?;
        let line = format!("{}{}", prefix, text);
        self.printed += 1;
        tracing::info!("[{}] {}", io.block_name(), line);
        io.set_output("line", line)?;
        Ok(())
    }

    fn shutdown(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        tracing::debug!("[{}] printed {} lines", io.block_name(), self.printed);
        Ok(())
    }
}
