//! External inference boundary and the bounded-call wrapper.
//!
//! Model calls may block for an unpredictable time and are not
//! cancellable. [`call_with_timeout`] runs each call on its own transient
//! thread and caps how long the caller waits; on timeout the thread is
//! abandoned. The closure owns its input and reports only through the
//! result channel, so an abandoned call cannot reach shared state.

use crate::capture::Frame;
use crate::types::{BoundingBox, Embedding};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Budget for one detection call.
pub const DETECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Budget for one recognition call.
pub const RECOGNIZE_TIMEOUT: Duration = Duration::from_secs(3);

/// Model-side failure, opaque to the tracking loop.
#[derive(Error, Debug, Clone)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);

/// Face detection model, called once per captured frame.
pub trait Detector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, InferenceError>;
}

/// Face recognition model, called once per cropped face.
pub trait Recognizer: Send + Sync {
    fn embed(&self, crop: &Frame) -> Result<Embedding, InferenceError>;
}

/// Failure modes of a bounded inference call.
#[derive(Error, Debug)]
pub enum CallError {
    #[error("inference call exceeded {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Failed(#[from] InferenceError),
}

/// Run `f` on a transient worker thread, waiting at most `timeout`.
///
/// On timeout the worker is not interrupted; it keeps running until the
/// underlying call returns, and its eventual result is discarded when the
/// send on the closed channel fails.
pub fn call_with_timeout<T, F>(f: F, timeout: Duration) -> Result<T, CallError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InferenceError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("glance-infer".into())
        .spawn(move || {
            let _ = tx.send(f());
        });
    if let Err(e) = spawned {
        return Err(CallError::Failed(InferenceError(format!(
            "failed to spawn inference thread: {e}"
        ))));
    }

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map_err(CallError::Failed),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::warn!(?timeout, "inference call timed out; abandoning worker");
            Err(CallError::TimedOut(timeout))
        }
        // Sender dropped without a result: the call panicked.
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(CallError::Failed(InferenceError(
            "inference worker exited before returning".into(),
        ))),
    }
}
