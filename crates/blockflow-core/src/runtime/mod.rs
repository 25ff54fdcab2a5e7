//! Execution runtime: engine clock, worker pool, scheduler and exception delivery.

mod clock;
mod exceptions;
mod pool;
mod scheduler;

pub use clock::{Clock, Timestamp};
pub use exceptions::{BlockException, ExceptionHandler, ExceptionRegistry, Phase};
pub use pool::{SubmitError, Task, TaskHandle, TaskOutcome, ThreadPool};
pub use scheduler::Scheduler;
