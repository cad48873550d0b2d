//! Cooperative cancellation shared between the consumer and the worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Shared {
    requested: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// A cancellation flag that can be cloned freely across threads.
///
/// All clones observe the same flag. Requests are sticky until [`reset`].
///
/// [`reset`]: CancellationContext::reset
#[derive(Debug, Clone, Default)]
pub struct CancellationContext {
    shared: Arc<Shared>,
}

impl CancellationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_requested(&self) -> bool {
        self.shared.requested.load(Ordering::Acquire)
    }

    /// Ask everything holding this context to stop, and wake any sleeper.
    pub fn request(&self) {
        let _guard = self
            .shared
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.shared.requested.store(true, Ordering::Release);
        self.shared.wake.notify_all();
    }

    pub fn reset(&self) {
        self.shared.requested.store(false, Ordering::Release);
    }

    /// Sleep for up to `duration`, returning early if cancellation is requested.
    ///
    /// Returns `true` if cancellation was requested.
    pub fn wait_for(&self, duration: Duration) -> bool {
        let guard = self
            .shared
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (_guard, _timeout) = self
            .shared
            .wake
            .wait_timeout_while(guard, duration, |_| !self.is_requested())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_requested()
    }
}
