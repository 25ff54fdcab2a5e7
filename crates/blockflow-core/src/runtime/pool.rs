//! Fixed-size pool of reusable worker threads.
//!
//! Each worker loops on a shared bounded queue: take a request, run it, signal completion,
//! go back to waiting. An [`Request::Exit`] request ends the loop. Errors and panics raised
//! by the job are caught on the worker, delivered to the [`ExceptionRegistry`] and never
//! kill the worker.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};

use super::exceptions::{BlockException, ExceptionRegistry, Phase};
use crate::error::{BlockError, EngineError, Result};
use crate::registry::BlockId;

pub type Job = Box<dyn FnOnce() -> Result<(), BlockError> + Send>;
pub type CompletionHook = Box<dyn FnOnce(&TaskOutcome) + Send>;

/// Outcome of one executed task.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed,
    Failed(BlockError),
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }

    pub fn error(&self) -> Option<&BlockError> {
        match self {
            TaskOutcome::Completed => None,
            TaskOutcome::Failed(e) => Some(e),
        }
    }
}

/// A block-bound unit of work.
pub struct Task {
    pub block_id: BlockId,
    pub block_name: String,
    pub phase: Phase,
    job: Job,
    on_complete: Option<CompletionHook>,
}

impl Task {
    pub fn new(
        block_id: BlockId,
        block_name: impl Into<String>,
        phase: Phase,
        job: impl FnOnce() -> Result<(), BlockError> + Send + 'static,
    ) -> Self {
        Self {
            block_id,
            block_name: block_name.into(),
            phase,
            job: Box::new(job),
            on_complete: None,
        }
    }

    /// Runs on the worker after the outcome is known, before waiters are released.
    pub fn on_complete(mut self, hook: impl FnOnce(&TaskOutcome) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }
}

#[derive(Default)]
struct Completion {
    outcome: Mutex<Option<TaskOutcome>>,
    done: Condvar,
}

impl Completion {
    fn finish(&self, outcome: TaskOutcome) {
        *self.outcome.lock() = Some(outcome);
        self.done.notify_all();
    }
}

/// Join handle for one submitted task.
#[derive(Clone)]
pub struct TaskHandle {
    completion: Arc<Completion>,
}

impl TaskHandle {
    pub fn is_finished(&self) -> bool {
        self.completion.outcome.lock().is_some()
    }

    /// Wait up to `timeout`. `None` if the task is still running.
    pub fn join(&self, timeout: Duration) -> Option<TaskOutcome> {
        let deadline = Instant::now() + timeout;
        let mut outcome = self.completion.outcome.lock();
        while outcome.is_none() {
            if self.completion.done.wait_until(&mut outcome, deadline).timed_out() {
                break;
            }
        }
        outcome.clone()
    }

    pub fn wait(&self) -> TaskOutcome {
        let mut outcome = self.completion.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.completion.done.wait(&mut outcome);
        }
    }
}

enum Request {
    Execute(Task, Arc<Completion>),
    Exit,
}

/// Why a task was not accepted. The task is handed back.
pub enum SubmitError {
    /// Every worker is busy and the queue is full.
    Saturated(Task),
    ShutDown(Task),
}

impl std::fmt::Debug for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Saturated(t) => write!(f, "Saturated({})", t.block_name),
            SubmitError::ShutDown(t) => write!(f, "ShutDown({})", t.block_name),
        }
    }
}

#[derive(Default)]
struct Outstanding {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Outstanding {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

pub struct ThreadPool {
    size: usize,
    sender: Sender<Request>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    outstanding: Arc<Outstanding>,
    join_timeout: Duration,
    /// Set once shutdown begins; detached workers may still hold the queue open.
    closed: AtomicBool,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("size", &self.size)
            .field("outstanding", &*self.outstanding.count.lock())
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_task(task: Task, completion: &Completion, exceptions: &ExceptionRegistry) {
    let Task {
        block_id,
        block_name,
        phase,
        job,
        on_complete,
    } = task;
    let outcome = match catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(())) => TaskOutcome::Completed,
        Ok(Err(e)) => TaskOutcome::Failed(e),
        Err(payload) => TaskOutcome::Failed(BlockError::Panicked(panic_message(payload))),
    };
    if let TaskOutcome::Failed(error) = &outcome {
        let exception = BlockException {
            block_id,
            block_name: block_name.clone(),
            phase,
            error: error.clone(),
        };
        if catch_unwind(AssertUnwindSafe(|| exceptions.deliver(&exception))).is_err() {
            tracing::error!("[{}] exception handler panicked", block_name);
        }
    }
    if let Some(hook) = on_complete
        && catch_unwind(AssertUnwindSafe(|| hook(&outcome))).is_err()
    {
        tracing::error!("[{}] completion hook panicked", block_name);
    }
    completion.finish(outcome);
}

fn worker_loop(
    index: usize,
    requests: Receiver<Request>,
    outstanding: Arc<Outstanding>,
    exceptions: Arc<ExceptionRegistry>,
) {
    tracing::debug!("[worker-{}] started", index);
    for request in requests.iter() {
        match request {
            Request::Execute(task, completion) => {
                run_task(task, &completion, &exceptions);
                outstanding.done();
            }
            Request::Exit => break,
        }
    }
    tracing::debug!("[worker-{}] exiting", index);
}

impl ThreadPool {
    pub fn new(
        size: usize,
        join_timeout: Duration,
        exceptions: Arc<ExceptionRegistry>,
    ) -> Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = crossbeam_channel::bounded(size);
        let outstanding = Arc::new(Outstanding::default());
        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let requests = receiver.clone();
            let outstanding = outstanding.clone();
            let exceptions = exceptions.clone();
            let handle = std::thread::Builder::new()
                .name(format!("blockflow-worker-{}", index))
                .spawn(move || worker_loop(index, requests, outstanding, exceptions))
                .map_err(|e| {
                    EngineError::InvalidState(format!("failed to spawn worker thread: {}", e))
                })?;
            workers.push(handle);
        }
        tracing::info!(workers = size, "thread pool started");
        Ok(Self {
            size,
            sender,
            workers: Mutex::new(workers),
            outstanding,
            join_timeout,
            closed: AtomicBool::new(false),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn outstanding(&self) -> usize {
        *self.outstanding.count.lock()
    }

    /// Queue a task without blocking. Fails when the queue is full or the pool is shut down.
    pub fn submit(&self, task: Task) -> std::result::Result<TaskHandle, SubmitError> {
        if self.is_shut_down() {
            return Err(SubmitError::ShutDown(task));
        }
        let completion = Arc::new(Completion::default());
        self.outstanding.add();
        match self
            .sender
            .try_send(Request::Execute(task, completion.clone()))
        {
            Ok(()) => Ok(TaskHandle { completion }),
            Err(err) => {
                self.outstanding.done();
                match err {
                    TrySendError::Full(Request::Execute(task, _)) => {
                        Err(SubmitError::Saturated(task))
                    }
                    TrySendError::Disconnected(Request::Execute(task, _)) => {
                        Err(SubmitError::ShutDown(task))
                    }
                    TrySendError::Full(Request::Exit)
                    | TrySendError::Disconnected(Request::Exit) => {
                        unreachable!("only execute requests are submitted here")
                    }
                }
            }
        }
    }

    /// Queue a task, waiting for queue space if needed.
    pub fn submit_blocking(&self, task: Task) -> Result<TaskHandle> {
        if self.is_shut_down() {
            return Err(EngineError::InvalidState("thread pool is shut down".into()));
        }
        let completion = Arc::new(Completion::default());
        self.outstanding.add();
        if self
            .sender
            .send(Request::Execute(task, completion.clone()))
            .is_err()
        {
            self.outstanding.done();
            return Err(EngineError::InvalidState("thread pool is shut down".into()));
        }
        Ok(TaskHandle { completion })
    }

    /// Wait until no task is queued or running. Returns `false` on timeout.
    pub fn wait_all(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.outstanding.count.lock();
        while *count > 0 {
            if self
                .outstanding
                .idle
                .wait_until(&mut count, deadline)
                .timed_out()
            {
                return *count == 0;
            }
        }
        true
    }

    /// Let queued work drain, then stop every worker. Workers still busy after the join
    /// timeout are detached.
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let mut workers = std::mem::take(&mut *self.workers.lock());
        if workers.is_empty() {
            return;
        }
        if !self.wait_all(self.join_timeout) {
            tracing::warn!(
                outstanding = self.outstanding(),
                "thread pool shutting down with work in flight"
            );
        }
        for _ in 0..workers.len() {
            if self.sender.send(Request::Exit).is_err() {
                break;
            }
        }
        let deadline = Instant::now() + self.join_timeout;
        while Instant::now() < deadline && workers.iter().any(|w| !w.is_finished()) {
            std::thread::sleep(Duration::from_millis(1));
        }
        let mut detached = 0;
        for handle in workers.drain(..) {
            if handle.is_finished() {
                if handle.join().is_err() {
                    tracing::error!("worker thread panicked");
                }
            } else {
                detached += 1;
            }
        }
        if detached > 0 {
            tracing::warn!(detached, "worker threads did not exit in time");
        }
        tracing::info!("thread pool stopped");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
