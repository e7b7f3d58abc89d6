//! Background worker that drives the recognition pipeline.
//!
//! One dedicated thread runs the tick loop: recognition pass, presence
//! reconciliation, interruptible sleep. The loop never terminates on
//! error; the only way out is [`WorkerHandle::stop`].

use crate::context::Context;
use crate::enroll;
use crate::pipeline::RecognitionPipeline;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pause between recognition passes.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Cooperative shutdown flag shared with the worker thread.
///
/// Setting it more than once is a no-op; the worker observes it between
/// passes and during the tick sleep.
#[derive(Clone, Default)]
pub struct CancelSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent.
    pub fn set(&self) {
        let (flag, condvar) = &*self.inner;
        let mut cancelled = match flag.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cancelled = true;
        condvar.notify_all();
    }

    pub fn is_set(&self) -> bool {
        let (flag, _) = &*self.inner;
        match flag.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Sleep for `timeout` or until the signal is set, whichever comes
    /// first. Returns true once set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, condvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut cancelled = match flag.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        loop {
            if *cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = match condvar.wait_timeout(cancelled, deadline - now) {
                Ok(result) => result,
                Err(poisoned) => poisoned.into_inner(),
            };
            cancelled = guard;
        }
    }
}

/// Handle to a running worker. Lifecycle: spawn → [`stop`](Self::stop)
/// → [`join`](Self::join). Joining without stopping first blocks until
/// someone else stops the worker.
pub struct WorkerHandle {
    signal: CancelSignal,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Request shutdown. Does not interrupt a pass already in flight.
    pub fn stop(&self) {
        self.signal.set();
    }

    /// Wait for the worker to observe cancellation and exit.
    pub fn join(self) {
        if self.thread.join().is_err() {
            tracing::error!("worker thread panicked");
        }
    }
}

pub struct Worker;

impl Worker {
    /// Start the tick loop on a dedicated background thread.
    pub fn spawn(ctx: Arc<Context>) -> std::io::Result<WorkerHandle> {
        let signal = CancelSignal::new();
        let loop_signal = signal.clone();
        let thread = thread::Builder::new()
            .name("glance-worker".into())
            .spawn(move || run_loop(ctx, loop_signal))?;
        Ok(WorkerHandle { signal, thread })
    }
}

fn run_loop(ctx: Arc<Context>, signal: CancelSignal) {
    tracing::info!("worker started");
    let pipeline = RecognitionPipeline::new(Arc::clone(&ctx));

    while !signal.is_set() {
        if !ctx.store_path.exists() {
            tracing::info!(
                path = %ctx.store_path.display(),
                "no known-face store; learning from reference images"
            );
            if let Err(e) = enroll::relearn_all(&ctx) {
                tracing::warn!(error = %e, "bootstrap enrollment failed");
            }
        }

        let detected = match pipeline.run_once() {
            Ok(names) => Some(names),
            Err(e) => {
                tracing::warn!(error = %e, "recognition pass failed");
                None
            }
        };
        ctx.tracker.reconcile(detected);

        if signal.wait_timeout(ctx.tick_interval) {
            break;
        }
    }

    tracing::info!("worker exiting");
}
