//! Cooperative shutdown signal.
//!
//! A watch-channel wrapper that lets the outer ctrl-c handler interrupt
//! the inner loops at their natural pause points: between captcha
//! polls, between items, between accounts, and during the long
//! inter-cycle countdown. Tests use `Shutdown::sleep` with near-zero
//! durations to drive the cycle loop without real waiting.

use std::time::Duration;
use tokio::sync::watch;

/// Sender half, held by whoever decides to stop the process.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Signal all observers to stop at their next pause point.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half, cloned into every component that waits.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Create a connected handle/observer pair.
    pub fn channel() -> (ShutdownHandle, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownHandle { tx }, Shutdown { rx })
    }

    /// A shutdown that never fires, for tests that don't exercise
    /// cancellation. Leaks the sender so the channel stays open.
    pub fn never() -> Shutdown {
        let (handle, shutdown) = Self::channel();
        std::mem::forget(handle);
        shutdown
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `dur`, waking early on shutdown.
    ///
    /// Returns `true` if the full duration elapsed, `false` if the
    /// sleep was interrupted (or the handle was dropped).
    pub async fn sleep(&self, dur: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        let mut rx = self.rx.clone();
        tokio::select! {
            _ = tokio::time::sleep(dur) => true,
            _ = rx.wait_for(|triggered| *triggered) => false,
        }
    }
}
