//! Owner-thread side of the invoker

use super::{InvokerShared, QueuedTask, RUNNING, SHUT_DOWN};
use crate::config::BridgeConfig;
use crate::context::ClientContext;
use crate::world::WorldModel;
use botbridge_core::{BridgeError, Result};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

thread_local! {
    /// Worlds bound on this thread, keyed by invoker id
    static BOUND_WORLDS: RefCell<HashMap<u64, Rc<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Run `f` against the world bound to `invoker_id` on this thread
pub(crate) fn with_bound_world<W: 'static, R>(
    invoker_id: u64,
    f: impl FnOnce(&W) -> R,
) -> Option<R> {
    // Clone out of the map so nested calls can borrow it again
    let world = BOUND_WORLDS.with(|worlds| worlds.borrow().get(&invoker_id).cloned())?;
    let world = world.downcast::<W>().ok()?;
    Some(f(&world))
}

/// The owner thread's claim on an invoker. `Send`, so it can be moved to
/// the thread that will own the world before calling [`OwnerBinding::bind`].
pub struct OwnerBinding<W> {
    shared: Arc<InvokerShared<W>>,
    queue: mpsc::UnboundedReceiver<QueuedTask<W>>,
}

impl<W> OwnerBinding<W> {
    pub(crate) fn new(
        shared: Arc<InvokerShared<W>>,
        queue: mpsc::UnboundedReceiver<QueuedTask<W>>,
    ) -> Self {
        Self { shared, queue }
    }
}

impl<W: WorldModel> OwnerBinding<W> {

    /// Make the current thread the owner of `world` and open the queue
    pub fn bind(self, world: W) -> Result<OwnerLoop<W>> {
        let current = thread::current();
        self.shared.owner.set(current.id()).map_err(|_| {
            BridgeError::OwnerThreadUnavailable("invoker already has an owner thread".into())
        })?;

        let world = Rc::new(world);
        let erased: Rc<dyn Any> = world.clone();
        BOUND_WORLDS.with(|worlds| worlds.borrow_mut().insert(self.shared.id, erased));
        self.shared.lifecycle.store(RUNNING, Ordering::Release);

        info!(
            invoker_id = self.shared.id,
            thread = current.name().unwrap_or("<unnamed>"),
            tick = world.tick(),
            "Owner thread bound"
        );

        Ok(OwnerLoop {
            shared: self.shared,
            queue: self.queue,
            world,
            processed: 0,
            closed: false,
        })
    }
}

/// Drains the invoker queue against the world. Lives on the owner thread
/// and cannot leave it.
pub struct OwnerLoop<W: WorldModel> {
    shared: Arc<InvokerShared<W>>,
    queue: mpsc::UnboundedReceiver<QueuedTask<W>>,
    world: Rc<W>,
    processed: u64,
    closed: bool,
}

impl<W: WorldModel> OwnerLoop<W> {
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Tasks executed (or skipped as cancelled) so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Run queued tasks in arrival order, at most `drain_budget` of them.
    /// Returns how many were taken off the queue.
    pub fn drain(&mut self) -> usize {
        let budget = self.shared.config.drain_budget.unwrap_or(usize::MAX);
        let mut taken = 0;
        while taken < budget {
            match self.queue.try_recv() {
                Ok(task) => {
                    self.run_task(task);
                    taken += 1;
                }
                Err(_) => break,
            }
        }
        taken
    }

    fn run_task(&mut self, task: QueuedTask<W>) {
        self.shared.queued.fetch_sub(1, Ordering::Relaxed);
        let task_id = task.id();
        let started = Instant::now();
        task.run(&self.world);
        self.processed += 1;

        let elapsed = started.elapsed();
        if elapsed > self.shared.config.slow_task_threshold() {
            warn!(task_id, ?elapsed, "Slow task on owner thread");
        }
    }

    /// Continuous mode: advance the world once per tick, drain at each tick
    /// and run work that arrives between ticks straight away. Returns when
    /// `shutdown` fires or its sender is dropped.
    pub fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| {
                BridgeError::OwnerThreadUnavailable(format!("Failed to start owner runtime: {}", e))
            })?;

        let interval = self.shared.config.tick_interval();
        info!(?interval, "Owner loop running");

        runtime.block_on(async {
            let mut next_tick = tokio::time::Instant::now();
            loop {
                let now = tokio::time::Instant::now();
                if now >= next_tick {
                    self.world.advance();
                    self.drain();
                    // Skip missed ticks instead of bursting to catch up
                    next_tick = (next_tick + interval).max(now + interval / 2);
                }

                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        debug!("Shutdown requested");
                        break;
                    }
                    task = self.queue.recv() => match task {
                        Some(task) => self.run_task(task),
                        None => {
                            debug!("Owner queue closed");
                            break;
                        }
                    },
                    _ = tokio::time::sleep_until(next_tick) => {}
                }
            }
        });

        self.shutdown();
        Ok(())
    }

    /// Stop accepting work and fail everything still queued
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.shared.lifecycle.store(SHUT_DOWN, Ordering::Release);
        self.queue.close();

        let mut aborted = 0usize;
        while let Ok(task) = self.queue.try_recv() {
            self.shared.queued.fetch_sub(1, Ordering::Relaxed);
            task.abort(BridgeError::OwnerThreadUnavailable(
                "owner thread shut down before task ran".into(),
            ));
            aborted += 1;
        }

        BOUND_WORLDS.with(|worlds| worlds.borrow_mut().remove(&self.shared.id));
        info!(
            invoker_id = self.shared.id,
            processed = self.processed,
            aborted,
            "Owner thread shut down"
        );
    }
}

impl<W: WorldModel> Drop for OwnerLoop<W> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handle to an owner thread started by [`spawn_owner_thread`]
pub struct OwnerThread {
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<Result<()>>>,
}

impl OwnerThread {
    /// Signal the owner loop to stop and wait for the thread to exit
    pub fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.join.take() {
            Some(join) => join.join().map_err(|_| {
                error!("Owner thread panicked");
                BridgeError::OwnerThreadUnavailable("owner thread panicked".into())
            })?,
            None => Ok(()),
        }
    }
}

impl Drop for OwnerThread {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start a named owner thread running the continuous loop.
///
/// The world is built by `factory` on the new thread, so it never has to be
/// `Send`. Returns once the thread has bound, so submits succeed right away.
pub fn spawn_owner_thread<W, F>(
    config: BridgeConfig,
    factory: F,
) -> Result<(ClientContext<W>, OwnerThread)>
where
    W: WorldModel,
    F: FnOnce() -> W + Send + 'static,
{
    let (context, binding) = ClientContext::new(config);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<Result<()>>(1);

    let join = thread::Builder::new()
        .name("botbridge-owner".into())
        .spawn(move || {
            let owner = match binding.bind(factory()) {
                Ok(owner) => {
                    let _ = ready_tx.send(Ok(()));
                    owner
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.clone()));
                    return Err(e);
                }
            };
            owner.run(shutdown_rx)
        })
        .map_err(|e| {
            BridgeError::OwnerThreadUnavailable(format!("Failed to spawn owner thread: {}", e))
        })?;

    ready_rx.recv().map_err(|_| {
        BridgeError::OwnerThreadUnavailable("owner thread exited during startup".into())
    })??;

    Ok((
        context,
        OwnerThread {
            shutdown: Some(shutdown_tx),
            join: Some(join),
        },
    ))
}
