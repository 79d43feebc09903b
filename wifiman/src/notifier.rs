//! Timer, deferral and process-liveness primitives.
//!
//! The manager never sleeps or spawns on its own. It asks a [`Notifier`] to
//! run closures later, which keeps it independent of any particular event
//! loop. [`TokioNotifier`] is the implementation for tokio hosts.

use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::Result;
use crate::api::models::WifiError;
use crate::util::utils::lock;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a scheduled timer so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Host event-loop services the manager depends on.
pub trait Notifier: Send + Sync {
    /// Runs `task` once after `after` has elapsed, unless cancelled first.
    fn schedule(&self, after: Duration, task: Task) -> TimerHandle;

    /// Cancels a scheduled timer. Cancelling a timer that already fired, or
    /// was already cancelled, does nothing.
    fn cancel(&self, handle: TimerHandle);

    /// Runs `task` on a later turn of the event loop, never inline.
    fn defer(&self, task: Task);

    /// Tells the host that the process must stay alive because a hardware
    /// operation may still complete. Called at most once per manager.
    fn keep_alive(&self);
}

/// A [`Notifier`] running timers and deferred tasks on a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use wifiman::TokioNotifier;
///
/// # async fn example() -> wifiman::Result<()> {
/// let notifier = TokioNotifier::current()?;
/// assert!(!notifier.lease_held());
/// # Ok(())
/// # }
/// ```
pub struct TokioNotifier {
    runtime: Handle,
    next_id: AtomicU64,
    timers: Arc<Mutex<HashMap<TimerHandle, AbortHandle>>>,
    lease: AtomicBool,
}

impl TokioNotifier {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            timers: Arc::new(Mutex::new(HashMap::new())),
            lease: AtomicBool::new(false),
        }
    }

    /// Creates a notifier on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns `NoRuntime` when called outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| WifiError::NoRuntime)
    }

    /// Whether the liveness lease has been taken.
    pub fn lease_held(&self) -> bool {
        self.lease.load(Ordering::SeqCst)
    }

    /// Number of timers scheduled but neither fired nor cancelled.
    pub fn pending_timers(&self) -> usize {
        lock(&self.timers).len()
    }
}

impl Notifier for TokioNotifier {
    fn schedule(&self, after: Duration, task: Task) -> TimerHandle {
        let handle = TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let timers = Arc::clone(&self.timers);

        // Held across the spawn so the timer cannot fire before it is registered.
        let mut registered = lock(&self.timers);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            // Whoever removes the entry owns the timer: a racing cancel wins or loses here.
            if lock(&timers).remove(&handle).is_some() {
                task();
            }
        });
        registered.insert(handle, join.abort_handle());

        debug!("Scheduled timer {} for {:?}", handle.id(), after);
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(abort) = lock(&self.timers).remove(&handle) {
            abort.abort();
            debug!("Cancelled timer {}", handle.id());
        }
    }

    fn defer(&self, task: Task) {
        self.runtime.spawn(async move { task() });
    }

    fn keep_alive(&self) {
        if !self.lease.swap(true, Ordering::SeqCst) {
            debug!("Liveness lease acquired");
        }
    }
}

impl Drop for TokioNotifier {
    fn drop(&mut self) {
        for (_, abort) in lock(&self.timers).drain() {
            abort.abort();
        }
    }
}
