use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::io::IoManager;
use super::state::BlockState;
use super::{Block, BlockIo, SharedContext};
use crate::error::{BlockError, Result};
use crate::policy::{FixedRateTimer, UpdatePolicy, evaluate};
use crate::port::BlockMetadata;
use crate::registry::{BlockId, BundleId};
use crate::runtime::Clock;

/// At-most-one-in-flight guard for a block instance.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: Mutex<bool>,
    idle: Condvar,
}

impl InFlight {
    pub fn try_acquire(&self) -> bool {
        let mut busy = self.busy.lock();
        if *busy {
            return false;
        }
        *busy = true;
        true
    }

    /// Wait up to `timeout` for the slot, then take it.
    pub fn acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut busy = self.busy.lock();
        while *busy {
            if self.idle.wait_until(&mut busy, deadline).timed_out() && *busy {
                return false;
            }
        }
        *busy = true;
        true
    }

    pub fn release(&self) {
        *self.busy.lock() = false;
        self.idle.notify_all();
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.lock()
    }

    /// Wait until no execution is in flight. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut busy = self.busy.lock();
        while *busy {
            if self.idle.wait_until(&mut busy, deadline).timed_out() {
                return !*busy;
            }
        }
        true
    }
}

/// A block instance owned by the engine: identity, ports, policy, lifecycle state and the
/// user implementation.
pub struct BlockInstance {
    id: BlockId,
    name: String,
    type_name: String,
    bundle: BundleId,
    is_context: bool,
    io: IoManager,
    policy: Mutex<UpdatePolicy>,
    timer: Mutex<FixedRateTimer>,
    state: Mutex<BlockState>,
    user: Mutex<Option<Box<dyn Block>>>,
    context: Option<SharedContext>,
    in_flight: InFlight,
}

impl fmt::Debug for BlockInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockInstance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("state", &*self.state.lock())
            .finish()
    }
}

fn panic_to_error(payload: Box<dyn std::any::Any + Send>) -> BlockError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    BlockError::Panicked(message)
}

impl BlockInstance {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BlockId,
        name: String,
        bundle: BundleId,
        meta: &BlockMetadata,
        user: Box<dyn Block>,
        context: Option<SharedContext>,
        is_context: bool,
        default_buffer_size: usize,
    ) -> Self {
        let io = IoManager::from_metadata(meta, &name, default_buffer_size);
        Self {
            id,
            type_name: meta.name.clone(),
            bundle,
            is_context,
            io,
            policy: Mutex::new(UpdatePolicy::default()),
            timer: Mutex::new(FixedRateTimer::new()),
            state: Mutex::new(BlockState::Created),
            user: Mutex::new(Some(user)),
            context,
            in_flight: InFlight::default(),
            name,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn bundle(&self) -> BundleId {
        self.bundle
    }

    pub fn is_context(&self) -> bool {
        self.is_context
    }

    pub fn io(&self) -> &IoManager {
        &self.io
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub fn state(&self) -> BlockState {
        *self.state.lock()
    }

    pub fn set_state(&self, state: BlockState) {
        let mut current = self.state.lock();
        if *current != state {
            tracing::debug!("[{}] {} -> {}", self.name, *current, state);
            *current = state;
        }
    }

    /// Check-and-set under one lock.
    pub fn transition(
        &self,
        allowed: impl FnOnce(&BlockState) -> bool,
        operation: &str,
        next: BlockState,
    ) -> Result<BlockState> {
        let mut current = self.state.lock();
        let previous = *current;
        previous.ensure(allowed(&previous), operation, &self.name)?;
        tracing::debug!("[{}] {} -> {}", self.name, previous, next);
        *current = next;
        Ok(previous)
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.policy.lock().clone()
    }

    pub fn update_policy(&self, change: impl FnOnce(&mut UpdatePolicy)) {
        change(&mut self.policy.lock());
        self.timer.lock().reset();
    }

    /// Readiness on this tick: fixed-rate timer combined with inlet triggers.
    pub fn is_ready(&self, now: Instant) -> bool {
        let policy = self.policy();
        let timer_due = self.timer.lock().is_due(&policy, now);
        let inlets_ready = self.io.inlets_ready(policy.default_inlet_policy);
        evaluate(&policy, timer_due, inlets_ready)
    }

    pub fn mark_scheduled(&self, now: Instant) {
        self.timer.lock().mark(now);
    }

    /// Run a user call with the implementation taken out of its slot, so no lock is held
    /// while user code runs. A panic is converted to an error and the slot restored.
    fn with_user(
        &self,
        call: impl FnOnce(&mut dyn Block, &mut BlockIo<'_>) -> Result<(), BlockError>,
    ) -> Result<(), BlockError> {
        let mut user = self.user.lock().take().ok_or_else(|| {
            BlockError::Other(format!("{} has no block implementation", self.name))
        })?;
        let result = {
            let mut io = BlockIo::new(&self.name, &self.io, self.context.as_ref());
            catch_unwind(AssertUnwindSafe(|| call(user.as_mut(), &mut io)))
                .unwrap_or_else(|payload| Err(panic_to_error(payload)))
        };
        *self.user.lock() = Some(user);
        result
    }

    pub fn run_setup(&self) -> Result<(), BlockError> {
        self.io.sync_parameters();
        self.with_user(|block, io| block.setup(io))
    }

    /// One execution cycle: sync inlets, run update, publish what the block wrote.
    /// A block that left Running after the task was queued is skipped.
    pub fn run_update(&self, clock: &Clock) -> Result<(), BlockError> {
        if self.state() != BlockState::Running {
            tracing::trace!("[{}] not running, update skipped", self.name);
            return Ok(());
        }
        self.io.sync_parameters();
        self.io.sync_inlets();
        match self.with_user(|block, io| block.update(io)) {
            Ok(()) => {
                self.io.publish_outlets(clock.now());
                Ok(())
            }
            Err(e) => {
                self.io.clear_staging();
                Err(e)
            }
        }
    }

    pub fn run_shutdown(&self) -> Result<(), BlockError> {
        self.with_user(|block, io| block.shutdown(io))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{InletMetadata, OutletMetadata};
    use crate::value::TypedValue;
    use std::sync::Arc;

    struct Doubler;

    impl Block for Doubler {
        fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
            let n: i32 = io.inlet("number")?;
            if n < 0 {
                panic!("negative");
            }
            io.set_output("result", n * 2)?;
            Ok(())
        }
    }

    fn instance() -> BlockInstance {
        let meta = BlockMetadata::new("Doubler")
            .inlet(InletMetadata::new("number", 0i32))
            .outlet(OutletMetadata::new("result", 0i32));
        BlockInstance::new(
            BlockId::new(),
            "Doubler # 0".into(),
            BundleId::new(),
            &meta,
            Box::new(Doubler),
            None,
            false,
            8,
        )
    }

    #[test]
    fn update_publishes_and_panics_become_errors() {
        let block = instance();
        block.set_state(BlockState::Running);
        let clock = Clock::new();
        let inlet = block.io().inlet("number").unwrap();
        inlet.set_data(TypedValue::Int(21), clock.now()).unwrap();
        assert!(block.is_ready(Instant::now()));
        block.run_update(&clock).unwrap();
        assert_eq!(block.io().outlet("result").unwrap().last().value, TypedValue::Int(42));

        inlet.set_data(TypedValue::Int(-1), clock.now()).unwrap();
        let err = block.run_update(&clock).unwrap_err();
        assert!(matches!(err, BlockError::Panicked(_)));
        inlet.set_data(TypedValue::Int(1), clock.now()).unwrap();
        assert!(block.run_update(&clock).is_ok());
    }

    #[test]
    fn update_is_skipped_unless_running() {
        let block = instance();
        let clock = Clock::new();
        let inlet = block.io().inlet("number").unwrap();
        inlet.set_data(TypedValue::Int(4), clock.now()).unwrap();
        block.set_state(BlockState::Stopped);
        block.run_update(&clock).unwrap();
        assert_eq!(block.io().outlet("result").unwrap().last().value, TypedValue::Int(0));
        // the pending value is still there for the next real update
        block.set_state(BlockState::Running);
        block.run_update(&clock).unwrap();
        assert_eq!(block.io().outlet("result").unwrap().last().value, TypedValue::Int(8));
    }

    #[test]
    fn transitions_are_checked() {
        let block = instance();
        assert!(block.transition(|s| s.can_start(), "start", BlockState::Running).is_err());
        block.transition(|s| s.can_setup(), "set up", BlockState::SetUp).unwrap();
        assert_eq!(block.state(), BlockState::SetUp);
    }

    #[test]
    fn in_flight_is_exclusive() {
        let flag = Arc::new(InFlight::default());
        assert!(flag.try_acquire());
        assert!(!flag.try_acquire());
        assert!(!flag.acquire(Duration::from_millis(10)));
        let releaser = flag.clone();
        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            releaser.release();
        });
        assert!(flag.wait_idle(Duration::from_secs(2)));
        t.join().unwrap();
        assert!(flag.acquire(Duration::from_millis(10)));
    }
}
