use crate::capture::FrameSource;
use crate::infer::{Detector, Recognizer};
use crate::tracker::PresenceTracker;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Everything the engine needs, wired explicitly at startup instead of
/// through process-wide singletons, and shared by the worker loop, the
/// enrollment pipeline, and whatever consumes presence snapshots.
pub struct Context {
    pub source: Arc<dyn FrameSource>,
    pub detector: Arc<dyn Detector>,
    pub recognizer: Arc<dyn Recognizer>,
    pub tracker: Arc<PresenceTracker>,
    /// JSON file holding the known-face store.
    pub store_path: PathBuf,
    /// Root of the per-person reference-image directories.
    pub faces_dir: PathBuf,
    /// Pause between recognition passes.
    pub tick_interval: Duration,
}
