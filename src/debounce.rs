//! Debounce wrapper.
//!
//! A [`Debouncer`] coalesces a burst of calls into a single execution of its
//! action, run once the calls have stopped for the configured delay, with the
//! arguments of the last call. Each bound field owns its own instance.
//!
//! Timers run on the runtime handed to [`Debouncer::new`], so [`call`]
//! works from any thread, including ones outside a tokio runtime.
//!
//! [`call`]: Debouncer::call

use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

pub struct Debouncer<A, F> {
    delay: Duration,
    runtime: Handle,
    action: Arc<F>,
    pending: Mutex<Option<JoinHandle<()>>>,
    running: Arc<AtomicUsize>,
    _args: PhantomData<fn(A)>,
}

/// Counts an action as running until its task ends, even by panic
struct RunningGuard(Arc<AtomicUsize>);

impl RunningGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<A, F, Fut> Debouncer<A, F>
where
    A: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    pub fn new(delay: Duration, runtime: Handle, action: F) -> Self {
        Self {
            delay,
            runtime,
            action: Arc::new(action),
            pending: Mutex::new(None),
            running: Arc::new(AtomicUsize::new(0)),
            _args: PhantomData,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule the action with `args`, replacing any pending execution.
    ///
    /// Once the timer fires the action runs as its own task, so later calls
    /// only cancel the timer.
    pub fn call(&self, args: A) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            if !handle.is_finished() {
                trace!("Replacing pending debounced call");
            }
            handle.abort();
        }

        let action = Arc::clone(&self.action);
        let running = Arc::clone(&self.running);
        let delay = self.delay;
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let guard = RunningGuard::enter(running);
            let task = action(args);
            tokio::spawn(async move {
                let _guard = guard;
                task.await;
            });
        }));
    }

    /// Drop the pending execution, if any
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Number of fired actions that have not completed yet
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }
}

impl<A, F> Drop for Debouncer<A, F> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}
