//! Clock block: emits the local wall-clock time as text, formatted by the `format` parameter.

use blockflow_core::{
    Block, BlockError, BlockIo, BlockMetadata, OptionSet, OutletMetadata, ParameterMetadata,
};

pub const NAME: &str = "Clock";

pub const DEFAULT_FORMAT: &str = "%H:%M:%S";

pub fn metadata() -> BlockMetadata {
    BlockMetadata::new(NAME)
        .description("Emits the current local time")
        .category("source")
        .outlet(OutletMetadata::new("time", String::new()))
        .outlet(OutletMetadata::new("epoch_ms", 0i64))
        .parameter(
            ParameterMetadata::new("format", DEFAULT_FORMAT.to_string()).options(
                OptionSet::of::<String>()
                    .with(DEFAULT_FORMAT.to_string(), "time of day")
                    .with("%Y-%m-%d %H:%M:%S".to_string(), "date and time")
                    .with("%+".to_string(), "RFC 3339"),
            ),
        )
}

#[derive(Debug, Default)]
pub struct ClockBlock;

impl Block for ClockBlock {
    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        let format: String = io.parameter("format")?;
        let now = chrono::Local::now();
        io.set_output("time", now.format(&format).to_string())?;
        io.set_output("epoch_ms", now.timestamp_millis())?;
        Ok(())
    }
}
