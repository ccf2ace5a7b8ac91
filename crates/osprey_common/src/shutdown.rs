//! Cooperative stop signal for the log-tail applier.
//!
//! The applier only ever observes cancellation between entries, so the
//! signal is a plain flag plus a condvar that lets an idle applier (one
//! blocked waiting for its next entry) wake promptly instead of sleeping
//! out its full poll interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Clonable handle to a shared stop flag.
///
/// `stop()` wakes every thread parked in [`ShutdownSignal::wait_timeout`]
/// immediately.
#[derive(Clone)]
pub struct ShutdownSignal {
    inner: Arc<SignalInner>,
}

struct SignalInner {
    stopped: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                stopped: AtomicBool::new(false),
                mutex: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Request stop and wake all waiters.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.condvar.notify_all();
    }

    /// Non-blocking check, used at entry boundaries.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Park for at most `duration`, waking early on `stop()`. Returns
    /// true when stop has been requested.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        let guard = self.inner.mutex.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, _timed_out) = self
            .inner
            .condvar
            .wait_timeout(guard, duration)
            .unwrap_or_else(|e| e.into_inner());
        self.is_stopped()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
