//! Invocation tasks and the caller-side handles that wait on them

use botbridge_core::{BridgeError, Result};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

/// Observable lifecycle of a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

enum TaskState<T> {
    Pending,
    Running,
    Finished(Result<T>),
    Cancelled,
    Collected,
}

struct SlotInner<T> {
    state: TaskState<T>,
    /// Caller stopped waiting while the task was running
    abandoned: bool,
}

/// Result slot plus completion signals shared by a task and its handle
pub(crate) struct TaskSlot<T> {
    id: u64,
    inner: Mutex<SlotInner<T>>,
    done: Condvar,
    notify: Notify,
}

impl<T> TaskSlot<T> {
    pub(crate) fn pending(id: u64) -> Self {
        Self::with_state(id, TaskState::Pending)
    }

    pub(crate) fn finished(id: u64, result: Result<T>) -> Self {
        Self::with_state(id, TaskState::Finished(result))
    }

    fn with_state(id: u64, state: TaskState<T>) -> Self {
        Self {
            id,
            inner: Mutex::new(SlotInner {
                state,
                abandoned: false,
            }),
            done: Condvar::new(),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn signal(&self) {
        self.done.notify_all();
        self.notify.notify_one();
    }

    fn status(&self) -> TaskStatus {
        match &self.lock().state {
            TaskState::Pending => TaskStatus::Pending,
            TaskState::Running => TaskStatus::Running,
            TaskState::Finished(Ok(_)) | TaskState::Collected => TaskStatus::Completed,
            TaskState::Finished(Err(_)) => TaskStatus::Failed,
            TaskState::Cancelled => TaskStatus::Cancelled,
        }
    }

    /// Pending -> Running. False if the task was cancelled first.
    fn begin(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            TaskState::Pending => {
                inner.state = TaskState::Running;
                true
            }
            _ => false,
        }
    }

    fn complete(&self, result: Result<T>) {
        let mut inner = self.lock();
        if inner.abandoned {
            debug!(task_id = self.id, "Caller stopped waiting, discarding result");
        }
        inner.state = TaskState::Finished(result);
        drop(inner);
        self.signal();
    }

    /// Fail a task that never started
    fn fail_if_pending(&self, err: BridgeError) {
        let mut inner = self.lock();
        if matches!(inner.state, TaskState::Pending) {
            inner.state = TaskState::Finished(Err(err));
            drop(inner);
            self.signal();
        }
    }

    /// Pending -> Cancelled
    fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if matches!(inner.state, TaskState::Pending) {
            inner.state = TaskState::Cancelled;
            true
        } else {
            false
        }
    }

    /// Caller's wait ran out: cancel if not started, otherwise let it finish
    /// unobserved.
    fn give_up(&self, waited: Duration) -> BridgeError {
        let mut inner = self.lock();
        match inner.state {
            TaskState::Pending => {
                inner.state = TaskState::Cancelled;
                debug!(task_id = self.id, "Wait timed out before start, task cancelled");
            }
            TaskState::Running => {
                inner.abandoned = true;
                debug!(task_id = self.id, "Wait timed out while running, task continues");
            }
            _ => {}
        }
        BridgeError::InvocationTimeout(waited)
    }

    fn take(inner: &mut SlotInner<T>) -> Option<Result<T>> {
        match std::mem::replace(&mut inner.state, TaskState::Collected) {
            TaskState::Finished(result) => Some(result),
            TaskState::Collected => Some(Err(BridgeError::InvalidArgument(
                "task result already collected".into(),
            ))),
            other => {
                inner.state = other;
                None
            }
        }
    }

    fn try_take(&self) -> Option<Result<T>> {
        Self::take(&mut self.lock())
    }

    /// Block until finished, or until `timeout` elapses. A timeout too large
    /// to represent as a deadline waits without one.
    fn wait(&self, timeout: Option<Duration>) -> Result<T> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut inner = self.lock();
        loop {
            if let Some(result) = Self::take(&mut inner) {
                return result;
            }
            match deadline {
                None => {
                    inner = self.done.wait(inner).unwrap_or_else(PoisonError::into_inner);
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        drop(inner);
                        let waited = timeout.unwrap_or_default();
                        // The task may have finished between unlock and give_up
                        return self.try_take().unwrap_or_else(|| Err(self.give_up(waited)));
                    }
                    inner = self
                        .done
                        .wait_timeout(inner, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
    }

    async fn join(&self) -> Result<T> {
        loop {
            if let Some(result) = self.try_take() {
                return result;
            }
            self.notify.notified().await;
        }
    }
}

/// Caller-side handle for a task submitted with `submit_async`.
///
/// Dropping the handle abandons interest in the result; the task still runs.
pub struct InvocationHandle<T> {
    slot: Arc<TaskSlot<T>>,
}

impl<T> InvocationHandle<T> {
    pub(crate) fn new(slot: Arc<TaskSlot<T>>) -> Self {
        Self { slot }
    }

    pub fn task_id(&self) -> u64 {
        self.slot.id
    }

    pub fn status(&self) -> TaskStatus {
        self.slot.status()
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status(),
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Cancel the task if it has not started. Returns false once it is
    /// running or finished; a running task is never interrupted.
    pub fn cancel(self) -> bool {
        self.slot.cancel()
    }

    /// Block the calling thread until the task finishes
    pub fn wait(self) -> Result<T> {
        self.slot.wait(None)
    }

    /// Block for at most `timeout`. A task that has not started by then is
    /// cancelled; one that has keeps running and its result is discarded.
    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        self.slot.wait(Some(timeout))
    }

    /// Await the task from async code
    pub async fn join(self) -> Result<T> {
        self.slot.join().await
    }

    /// Await with a budget, with the same cancellation rules as `wait_timeout`
    pub async fn join_timeout(self, timeout: Duration) -> Result<T> {
        match tokio::time::timeout(timeout, self.slot.join()).await {
            Ok(result) => result,
            Err(_) => self
                .slot
                .try_take()
                .unwrap_or_else(|| Err(self.slot.give_up(timeout))),
        }
    }
}

/// Work queued for the owner thread, type-erased over its result
pub(crate) trait OwnerTask<W>: Send {
    fn id(&self) -> u64;

    /// Run on the owner thread. Skips silently if cancelled.
    fn run(self: Box<Self>, world: &W);

    /// Fail without running (shutdown)
    fn abort(self: Box<Self>, reason: BridgeError);
}

pub(crate) struct InvocationTask<T, F> {
    slot: Arc<TaskSlot<T>>,
    work: Option<F>,
}

impl<T, F> InvocationTask<T, F> {
    pub(crate) fn new(slot: Arc<TaskSlot<T>>, work: F) -> Self {
        Self {
            slot,
            work: Some(work),
        }
    }
}

impl<W, T, F> OwnerTask<W> for InvocationTask<T, F>
where
    T: Send + 'static,
    F: FnOnce(&W) -> Result<T> + Send + 'static,
{
    fn id(&self) -> u64 {
        self.slot.id
    }

    fn run(mut self: Box<Self>, world: &W) {
        let Some(work) = self.work.take() else {
            return;
        };
        if !self.slot.begin() {
            debug!(task_id = self.slot.id, "Skipping cancelled task");
            return;
        }

        let result = run_guarded(self.slot.id, || work(world));
        if let Err(e) = &result {
            // Only the owner still holds the slot: nobody will see this failure
            if Arc::strong_count(&self.slot) == 1 {
                warn!(task_id = self.slot.id, error = %e, "Fire-and-forget task failed");
            }
        }
        self.slot.complete(result);
    }

    fn abort(mut self: Box<Self>, reason: BridgeError) {
        self.work = None;
        self.slot.fail_if_pending(reason);
    }
}

impl<T, F> Drop for InvocationTask<T, F> {
    fn drop(&mut self) {
        if self.work.take().is_some() {
            self.slot.fail_if_pending(BridgeError::OwnerThreadUnavailable(
                "task dropped before it could run".into(),
            ));
        }
    }
}

/// Run `work`, turning a panic into `WorkPanicked`
pub(crate) fn run_guarded<T>(task_id: u64, work: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(task_id, panic = %message, "Submitted work panicked");
            Err(BridgeError::WorkPanicked(message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
