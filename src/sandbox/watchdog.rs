//! Wall-clock watchdog for a single run.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::warn;

/// Trips an abort flag once `limit` has passed, unless disarmed first.
///
/// The interpreter polls the flag on every operation, so a tripped watchdog
/// ends the run even inside a tight loop. Dropping the watchdog disarms it
/// and joins the timer thread.
pub(crate) struct Watchdog {
    disarm: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Start the timer thread.
    pub(crate) fn arm(limit: Duration, abort: Arc<AtomicBool>) -> io::Result<Self> {
        let (disarm, wait) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("sandbox-watchdog".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = wait.recv_timeout(limit) {
                    warn!(limit = ?limit, "script exceeded time budget");
                    abort.store(true, Ordering::Relaxed);
                }
            })?;
        Ok(Self {
            disarm: Some(disarm),
            handle: Some(handle),
        })
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        // Closing the channel wakes the timer thread immediately.
        drop(self.disarm.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
