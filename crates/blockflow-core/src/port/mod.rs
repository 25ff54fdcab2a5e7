//! # Ports
//!
//! The typed endpoints attached to a block instance: [`Parameter`]s (setup configuration),
//! [`Inlet`]s (buffered, policy-gated input) and [`Outlet`]s (broadcast output with
//! listeners and link targets).
//!
//! Every port guards its value with a narrow lock around read/replace. Readers get copies;
//! no lock is held while block code or a listener runs.

mod buffer;
mod inlet;
mod listeners;
pub mod metadata;
mod outlet;
mod parameter;

pub use buffer::{DEFAULT_BUFFER_SIZE, InletBuffer, TimestampedValue};
pub use inlet::{Inlet, InletState, Validator};
pub use listeners::{Callback, EventHandler, Listeners, SubscriptionToken};
pub use metadata::{
    BlockInfo, BlockMetadata, InletInfo, InletMetadata, OutletInfo, OutletMetadata,
    ParameterInfo, ParameterMetadata,
};
pub use outlet::{LinkTarget, Outlet, OutletHandler, OutletUpdate};
pub use parameter::Parameter;
