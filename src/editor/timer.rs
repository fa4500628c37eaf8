use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background ticker that asks the GUI to repaint at a fixed rate.
///
/// The thread only counts ticks; the GUI drains them with
/// [`take_pending`](Self::take_pending) on its own thread. [`stop`](Self::stop)
/// wakes the ticker and joins it, so once it returns no further tick can
/// arrive. Dropping the timer stops it.
pub struct RepaintTimer {
    stop: Arc<AtomicBool>,
    pending: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl RepaintTimer {
    pub fn start(framerate: u32) -> io::Result<Self> {
        let interval = Duration::from_secs_f64(1.0 / f64::from(framerate.max(1)));
        let stop = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(AtomicU64::new(0));

        let handle = {
            let stop = Arc::clone(&stop);
            let pending = Arc::clone(&pending);
            thread::Builder::new().name("flux-repaint".into()).spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    thread::park_timeout(interval);
                    if stop.load(Ordering::Acquire) {
                        break;
                    }
                    pending.fetch_add(1, Ordering::AcqRel);
                }
            })?
        };

        log::debug!("repaint timer started at {framerate} fps");
        Ok(Self { stop, pending, handle: Some(handle), interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Ticks since the last call.
    pub fn take_pending(&self) -> u64 {
        self.pending.swap(0, Ordering::AcqRel)
    }

    /// Cancel the ticker and wait for its thread to exit.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        handle.thread().unpark();
        if handle.join().is_err() {
            log::warn!("repaint timer thread panicked");
        }
        self.pending.store(0, Ordering::Release);
        log::debug!("repaint timer stopped");
    }
}

impl Drop for RepaintTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
