//! Thread-confined invoker
//!
//! Every read of and mutation to the world model runs on one owner thread.
//! Callers on any other thread hand work to the owner through a FIFO queue
//! and block (or await) until it has run:
//! - On the owner thread, `submit` runs the work inline, so work may submit
//!   more work without deadlocking
//! - Failures and panics inside work are captured on the owner thread and
//!   returned to the caller
//! - A caller whose wait times out cancels the task only if it has not started

mod owner;
mod task;

pub use owner::{OwnerBinding, OwnerLoop, OwnerThread, spawn_owner_thread};
pub use task::{InvocationHandle, TaskStatus};

use crate::config::BridgeConfig;
use botbridge_core::{BridgeError, Result};
use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;
use task::{InvocationTask, OwnerTask, TaskSlot};
use tokio::sync::mpsc;
use tracing::{debug, trace};

pub(crate) type QueuedTask<W> = Box<dyn OwnerTask<W> + Send>;

const UNINITIALIZED: u8 = 0;
const RUNNING: u8 = 1;
const SHUT_DOWN: u8 = 2;

static NEXT_INVOKER_ID: AtomicU64 = AtomicU64::new(1);

/// Owner thread lifecycle as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Running,
    ShutDown,
}

pub(crate) struct InvokerShared<W> {
    id: u64,
    queue: mpsc::UnboundedSender<QueuedTask<W>>,
    lifecycle: AtomicU8,
    owner: OnceLock<ThreadId>,
    next_task_id: AtomicU64,
    queued: AtomicUsize,
    config: BridgeConfig,
}

impl<W> InvokerShared<W> {
    fn lifecycle(&self) -> Lifecycle {
        match self.lifecycle.load(Ordering::Acquire) {
            UNINITIALIZED => Lifecycle::Uninitialized,
            RUNNING => Lifecycle::Running,
            _ => Lifecycle::ShutDown,
        }
    }

    fn ensure_running(&self) -> Result<()> {
        match self.lifecycle() {
            Lifecycle::Running => Ok(()),
            Lifecycle::Uninitialized => Err(BridgeError::OwnerThreadUnavailable(
                "owner thread not yet initialized".into(),
            )),
            Lifecycle::ShutDown => Err(BridgeError::OwnerThreadUnavailable(
                "owner thread has shut down".into(),
            )),
        }
    }
}

/// Caller-side handle to the owner thread's queue. Cheap to clone.
pub struct Invoker<W> {
    shared: Arc<InvokerShared<W>>,
}

impl<W> Clone for Invoker<W> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<W: 'static> Invoker<W> {
    /// Create an invoker and the binding its owner thread must claim
    pub fn new(config: BridgeConfig) -> (Self, OwnerBinding<W>) {
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(InvokerShared {
            id: NEXT_INVOKER_ID.fetch_add(1, Ordering::Relaxed),
            queue,
            lifecycle: AtomicU8::new(UNINITIALIZED),
            owner: OnceLock::new(),
            next_task_id: AtomicU64::new(1),
            queued: AtomicUsize::new(0),
            config,
        });
        let binding = OwnerBinding::new(Arc::clone(&shared), queue_rx);
        (Self { shared }, binding)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lifecycle()
    }

    /// True when called on the owner thread
    pub fn is_owner_thread(&self) -> bool {
        self.shared.owner.get() == Some(&thread::current().id())
    }

    /// Tasks queued but not yet picked up by the owner thread
    pub fn queue_depth(&self) -> usize {
        self.shared.queued.load(Ordering::Relaxed)
    }

    /// Run `work` on the owner thread and return its result, waiting at most
    /// the configured `submit_timeout`.
    pub fn submit<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        self.submit_inner(work, self.shared.config.submit_timeout())
    }

    /// Like `submit` with an explicit wait budget
    pub fn submit_with_timeout<T, F>(&self, work: F, timeout: Duration) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        self.submit_inner(work, Some(timeout))
    }

    /// Like `submit` but waits as long as it takes
    pub fn submit_untimed<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        self.submit_inner(work, None)
    }

    /// Queue `work` and return immediately with a handle.
    ///
    /// On the owner thread the work runs inline and the handle is already
    /// finished.
    pub fn submit_async<T, F>(&self, work: F) -> Result<InvocationHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        let task_id = self.next_task_id();
        if self.is_owner_thread() {
            let result = self.run_inline(task_id, work);
            return Ok(InvocationHandle::new(Arc::new(TaskSlot::finished(
                task_id, result,
            ))));
        }
        let slot = self.enqueue(task_id, work)?;
        Ok(InvocationHandle::new(slot))
    }

    fn submit_inner<T, F>(&self, work: F, timeout: Option<Duration>) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        let task_id = self.next_task_id();
        if self.is_owner_thread() {
            return self.run_inline(task_id, work);
        }
        let slot = self.enqueue(task_id, work)?;
        let handle = InvocationHandle::new(slot);
        match timeout {
            Some(timeout) => handle.wait_timeout(timeout),
            None => handle.wait(),
        }
    }

    fn run_inline<T, F>(&self, task_id: u64, work: F) -> Result<T>
    where
        F: FnOnce(&W) -> Result<T>,
    {
        trace!(task_id, "Running inline on owner thread");
        owner::with_bound_world(self.shared.id, |world: &W| {
            task::run_guarded(task_id, || work(world))
        })
        .unwrap_or_else(|| {
            Err(BridgeError::OwnerThreadUnavailable(
                "owner thread has no bound world".into(),
            ))
        })
    }

    fn enqueue<T, F>(&self, task_id: u64, work: F) -> Result<Arc<TaskSlot<T>>>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        self.shared.ensure_running()?;

        let slot = Arc::new(TaskSlot::pending(task_id));
        let task: QueuedTask<W> = Box::new(InvocationTask::new(Arc::clone(&slot), work));
        self.shared.queued.fetch_add(1, Ordering::Relaxed);
        if self.shared.queue.send(task).is_err() {
            self.shared.queued.fetch_sub(1, Ordering::Relaxed);
            return Err(BridgeError::OwnerThreadUnavailable(
                "owner queue is closed".into(),
            ));
        }
        debug!(task_id, "Queued task for owner thread");
        Ok(slot)
    }

    fn next_task_id(&self) -> u64 {
        self.shared.next_task_id.fetch_add(1, Ordering::Relaxed)
    }
}
