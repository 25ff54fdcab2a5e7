//! # Block SDK
//!
//! A block is user code implementing [`Block`]. The engine owns each instance in a
//! [`BlockInstance`] and calls into it only from pool workers, one call at a time:
//! `setup`, then any number of `update`s, then `shutdown`.
//!
//! ## IO access
//!
//! Block code reads inlets and parameters and writes outlets through [`BlockIo`]. Inlet reads
//! return the value made visible at the last synchronization; outlet writes are staged and
//! published only if the update returns `Ok`.
//!
//! ## Errors
//!
//! Returning `Err` abandons the current cycle. Reading a port with the wrong type or a name
//! the block never declared is a contract violation and makes the instance unusable until
//! it is set up again.
//!
//! ## Context blocks
//!
//! A bundle may provide a [`ContextBlock`]: one shared instance per loaded bundle, run by the
//! engine like any other block and reachable from every block of that bundle via
//! [`BlockIo::context`].

mod instance;
mod io;
mod state;

use std::any::Any;
use std::sync::Arc;

pub use instance::{BlockInstance, InFlight};
pub use io::{InletGroup, IoManager, NewBlockData};
pub use state::BlockState;

use crate::error::{BlockError, EngineError, Result};
use crate::value::{TypedValue, ValueType};

/// User block implementation.
pub trait Block: Send {
    fn setup(&mut self, _io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        Ok(())
    }

    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError>;

    fn shutdown(&mut self, _io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        Ok(())
    }
}

/// Bundle-wide shared block. Uses interior mutability since every block of the bundle holds it.
pub trait ContextBlock: Any + Send + Sync {
    fn setup(&self, _io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        Ok(())
    }

    fn update(&self, io: &mut BlockIo<'_>) -> Result<(), BlockError>;

    fn shutdown(&self, _io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        Ok(())
    }
}

pub type SharedContext = Arc<dyn ContextBlock>;

/// Runs a shared context through the regular block lifecycle.
pub(crate) struct ContextAdapter(pub(crate) SharedContext);

impl Block for ContextAdapter {
    fn setup(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        self.0.setup(io)
    }

    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        self.0.update(io)
    }

    fn shutdown(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        self.0.shutdown(io)
    }
}

/// Port access handed to block code for the duration of one call.
pub struct BlockIo<'a> {
    name: &'a str,
    io: &'a IoManager,
    context: Option<&'a SharedContext>,
}

impl<'a> BlockIo<'a> {
    pub fn new(name: &'a str, io: &'a IoManager, context: Option<&'a SharedContext>) -> Self {
        Self { name, io, context }
    }

    pub fn block_name(&self) -> &str {
        self.name
    }

    /// Visible value of a plain inlet.
    pub fn inlet<T: ValueType>(&self, name: &str) -> Result<T, BlockError> {
        Ok(self.inlet_value(name)?.extract::<T>()?)
    }

    pub fn inlet_value(&self, name: &str) -> Result<TypedValue, BlockError> {
        Ok(self.io.inlet(name)?.value())
    }

    /// Visible values of a multi-inlet, in member order as of the last synchronization.
    pub fn multi_inlet<T: ValueType>(&self, name: &str) -> Result<Vec<T>, BlockError> {
        let group = self.io.inlet_group(name)?;
        let values = group
            .visible()
            .iter()
            .map(|member| member.value().extract::<T>())
            .collect::<Result<Vec<T>>>()?;
        Ok(values)
    }

    pub fn parameter<T: ValueType>(&self, name: &str) -> Result<T, BlockError> {
        Ok(self.io.parameter(name)?.value().extract::<T>()?)
    }

    pub fn set_output<T: ValueType>(&mut self, name: &str, value: T) -> Result<(), BlockError> {
        self.set_output_value(name, value.into_value())
    }

    pub fn set_output_value(&mut self, name: &str, value: TypedValue) -> Result<(), BlockError> {
        self.io.outlet(name)?.write(value)?;
        Ok(())
    }

    /// The bundle context, downcast to its concrete type.
    pub fn context<C: ContextBlock>(&self) -> Result<&C, BlockError> {
        let context = self.context.ok_or_else(|| {
            BlockError::Engine(EngineError::NotFound(format!(
                "context not found for {}",
                self.name
            )))
        })?;
        let any: &dyn Any = &**context;
        any.downcast_ref::<C>().ok_or_else(|| {
            BlockError::Engine(EngineError::TypeMismatch(format!(
                "context of {} has a different type",
                self.name
            )))
        })
    }
}
