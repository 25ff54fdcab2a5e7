//! Tick-driven scheduler.
//!
//! Each tick walks the running blocks, evaluates their update policy and submits an update
//! task for every ready block that has nothing in flight. A busy block simply skips the tick.
//! The tick runs on a background timer thread, or from [`Scheduler::tick`] when the host
//! drives it manually.

use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, select};
use dashmap::DashMap;
use parking_lot::Mutex;

use super::clock::Clock;
use super::exceptions::Phase;
use super::pool::{SubmitError, Task, TaskOutcome, ThreadPool};
use crate::block::{BlockInstance, BlockState};
use crate::error::{EngineError, Result};
use crate::registry::BlockId;

struct SchedulerInner {
    blocks: DashMap<BlockId, Arc<BlockInstance>>,
    pool: Arc<ThreadPool>,
    clock: Arc<Clock>,
}

impl SchedulerInner {
    fn tick(self: &Arc<Self>) -> usize {
        let candidates: Vec<Arc<BlockInstance>> =
            self.blocks.iter().map(|e| e.value().clone()).collect();
        let now = Instant::now();
        let mut submitted = 0;
        for block in candidates {
            if block.state() != BlockState::Running || block.in_flight().is_busy() {
                continue;
            }
            if !block.is_ready(now) {
                continue;
            }
            if !block.in_flight().try_acquire() {
                continue;
            }
            // stop or shutdown may have won the race since the first check
            if block.state() != BlockState::Running {
                block.in_flight().release();
                continue;
            }
            block.mark_scheduled(now);
            match self.pool.submit(self.update_task(&block)) {
                Ok(_) => submitted += 1,
                Err(SubmitError::Saturated(_)) => {
                    tracing::trace!("[{}] pool saturated, skipping tick", block.name());
                    block.in_flight().release();
                }
                Err(SubmitError::ShutDown(_)) => {
                    block.in_flight().release();
                    break;
                }
            }
        }
        submitted
    }

    fn update_task(self: &Arc<Self>, block: &Arc<BlockInstance>) -> Task {
        let job_block = block.clone();
        let clock = self.clock.clone();
        let hook_block = block.clone();
        let scheduler: Weak<SchedulerInner> = Arc::downgrade(self);
        Task::new(block.id(), block.name(), Phase::Update, move || {
            job_block.run_update(&clock)
        })
        .on_complete(move |outcome| {
            if let TaskOutcome::Failed(error) = outcome
                && error.is_contract_violation()
            {
                if let Some(scheduler) = scheduler.upgrade() {
                    scheduler.blocks.remove(&hook_block.id());
                }
                // a concurrent stop or shutdown keeps its own state
                let marked = hook_block.transition(
                    |s| *s == BlockState::Running,
                    "mark unusable",
                    BlockState::Unusable,
                );
                if marked.is_ok() {
                    tracing::warn!("[{}] marked unusable: {}", hook_block.name(), error);
                }
            }
            hook_block.in_flight().release();
        })
    }
}

pub struct Scheduler {
    inner: Arc<SchedulerInner>,
    timer: Mutex<Option<(Sender<()>, JoinHandle<()>)>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("blocks", &self.inner.blocks.len())
            .field("timer", &self.timer.lock().is_some())
            .finish()
    }
}

impl Scheduler {
    pub fn new(pool: Arc<ThreadPool>, clock: Arc<Clock>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                blocks: DashMap::new(),
                pool,
                clock,
            }),
            timer: Mutex::new(None),
        }
    }

    /// Start the background timer thread ticking every `interval`.
    pub fn start_timer(&self, interval: Duration) -> Result<()> {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            return Ok(());
        }
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let inner = Arc::downgrade(&self.inner);
        let handle = std::thread::Builder::new()
            .name("blockflow-scheduler".into())
            .spawn(move || {
                tracing::debug!("[scheduler] timer started ({:?})", interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        default(interval) => {
                            match inner.upgrade() {
                                Some(inner) => {
                                    inner.tick();
                                }
                                None => break,
                            }
                        }
                    }
                }
                tracing::debug!("[scheduler] timer stopped");
            })
            .map_err(|e| EngineError::InvalidState(format!("failed to spawn scheduler: {}", e)))?;
        *timer = Some((stop_tx, handle));
        Ok(())
    }

    pub fn stop_timer(&self) {
        if let Some((stop, handle)) = self.timer.lock().take() {
            let _ = stop.send(());
            if handle.join().is_err() {
                tracing::error!("scheduler timer thread panicked");
            }
        }
    }

    /// One scheduling pass. Returns the number of update tasks submitted.
    pub fn tick(&self) -> usize {
        self.inner.tick()
    }

    pub fn register(&self, block: Arc<BlockInstance>) {
        self.inner.blocks.insert(block.id(), block);
    }

    pub fn deregister(&self, id: &BlockId) -> bool {
        self.inner.blocks.remove(id).is_some()
    }

    pub fn is_registered(&self, id: &BlockId) -> bool {
        self.inner.blocks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.blocks.is_empty()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockIo};
    use crate::error::BlockError;
    use crate::policy::InletPolicy;
    use crate::port::{BlockMetadata, InletMetadata, OutletMetadata};
    use crate::registry::BundleId;
    use crate::runtime::ExceptionRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Slow {
        running: Arc<AtomicUsize>,
        max: Arc<AtomicUsize>,
        runs: Arc<AtomicUsize>,
    }

    impl Block for Slow {
        fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.runs.fetch_add(1, Ordering::SeqCst);
            io.set_output("out", 1i32)?;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Misuse;

    impl Block for Misuse {
        fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
            let _: String = io.inlet("x")?;
            Ok(())
        }
    }

    fn running(meta: &BlockMetadata, user: Box<dyn Block>) -> Arc<BlockInstance> {
        let block = Arc::new(BlockInstance::new(
            BlockId::new(),
            format!("{} # 0", meta.name),
            BundleId::new(),
            meta,
            user,
            None,
            false,
            8,
        ));
        block.set_state(BlockState::Running);
        block
    }

    fn scheduler() -> Scheduler {
        let pool = Arc::new(
            ThreadPool::new(4, Duration::from_millis(500), Arc::new(ExceptionRegistry::new()))
                .unwrap(),
        );
        Scheduler::new(pool, Arc::new(Clock::new()))
    }

    #[test]
    fn never_runs_a_block_twice_concurrently() {
        let scheduler = scheduler();
        let running_now = Arc::new(AtomicUsize::new(0));
        let max = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));
        let meta = BlockMetadata::new("Slow").outlet(OutletMetadata::new("out", 0i32));
        let block = running(
            &meta,
            Box::new(Slow {
                running: running_now.clone(),
                max: max.clone(),
                runs: runs.clone(),
            }),
        );
        scheduler.register(block.clone());
        let deadline = Instant::now() + Duration::from_millis(200);
        while Instant::now() < deadline {
            scheduler.tick();
        }
        assert!(block.in_flight().wait_idle(Duration::from_secs(1)));
        assert_eq!(max.load(Ordering::SeqCst), 1);
        assert!(runs.load(Ordering::SeqCst) > 1);
    }

    #[test]
    fn contract_violation_marks_block_unusable() {
        let scheduler = scheduler();
        let meta = BlockMetadata::new("Misuse")
            .inlet(InletMetadata::new("x", 0i32).policy(InletPolicy::Always));
        let block = running(&meta, Box::new(Misuse));
        scheduler.register(block.clone());
        assert_eq!(scheduler.tick(), 1);
        assert!(block.in_flight().wait_idle(Duration::from_secs(1)));
        assert_eq!(block.state(), BlockState::Unusable);
        assert!(!scheduler.is_registered(&block.id()));
    }

    #[test]
    fn no_update_runs_after_stop_returns() {
        let scheduler = Arc::new(scheduler());
        let runs = Arc::new(AtomicUsize::new(0));
        let meta = BlockMetadata::new("Slow").outlet(OutletMetadata::new("out", 0i32));
        let block = running(
            &meta,
            Box::new(Slow {
                running: Arc::new(AtomicUsize::new(0)),
                max: Arc::new(AtomicUsize::new(0)),
                runs: runs.clone(),
            }),
        );
        scheduler.register(block.clone());
        let driver = {
            let scheduler = scheduler.clone();
            std::thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_millis(150);
                while Instant::now() < deadline {
                    scheduler.tick();
                }
            })
        };
        std::thread::sleep(Duration::from_millis(30));
        block
            .transition(|s| s.can_stop(), "stop", BlockState::Stopped)
            .unwrap();
        scheduler.deregister(&block.id());
        assert!(block.in_flight().wait_idle(Duration::from_secs(1)));
        let after_stop = runs.load(Ordering::SeqCst);
        driver.join().unwrap();
        assert!(block.in_flight().wait_idle(Duration::from_secs(1)));
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn timer_thread_drives_ticks() {
        let scheduler = scheduler();
        let runs = Arc::new(AtomicUsize::new(0));
        let meta = BlockMetadata::new("Slow").outlet(OutletMetadata::new("out", 0i32));
        let block = running(
            &meta,
            Box::new(Slow {
                running: Arc::new(AtomicUsize::new(0)),
                max: Arc::new(AtomicUsize::new(0)),
                runs: runs.clone(),
            }),
        );
        scheduler.register(block.clone());
        scheduler.start_timer(Duration::from_millis(1)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while runs.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        scheduler.stop_timer();
        assert!(runs.load(Ordering::SeqCst) >= 3);
    }
}
