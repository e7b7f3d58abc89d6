//! Shared mock collaborators for engine tests.

use crate::capture::{CaptureError, Frame, FrameSource};
use crate::context::Context;
use crate::infer::{Detector, InferenceError, Recognizer};
use crate::tracker::PresenceTracker;
use crate::types::{BoundingBox, Embedding};
use crate::worker::TICK_INTERVAL;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn uniform_frame(width: u32, height: u32, value: u8) -> Frame {
    Frame::new(vec![value; (width * height) as usize], width, height).expect("valid test frame")
}

/// Context over mock collaborators, with store and faces paths rooted
/// in `dir`.
pub fn context_with(
    dir: &Path,
    source: Arc<dyn FrameSource>,
    detector: Arc<dyn Detector>,
    recognizer: Arc<dyn Recognizer>,
) -> Context {
    Context {
        source,
        detector,
        recognizer,
        tracker: Arc::new(PresenceTracker::new()),
        store_path: dir.join("known_faces.json"),
        faces_dir: dir.join("known_faces"),
        tick_interval: TICK_INTERVAL,
    }
}

/// Frame source handing out one fixed result forever.
pub struct StaticFrameSource {
    result: Result<Frame, CaptureError>,
    pub calls: AtomicUsize,
}

impl StaticFrameSource {
    pub fn ok(frame: Frame) -> Self {
        Self {
            result: Ok(frame),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(CaptureError::Failed(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FrameSource for StaticFrameSource {
    fn capture_frame(&self) -> Result<Frame, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Detector returning a scripted result on every call.
pub struct ScriptedDetector {
    result: Result<Vec<BoundingBox>, InferenceError>,
    pub calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn boxes(boxes: Vec<BoundingBox>) -> Self {
        Self {
            result: Ok(boxes),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(InferenceError(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Detector for ScriptedDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<BoundingBox>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Detector reporting one full-frame face whenever the frame contains a
/// lit pixel, and nothing for an all-black frame.
pub struct BrightnessDetector;

impl Detector for BrightnessDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, InferenceError> {
        if frame.data.iter().any(|&p| p > 0) {
            Ok(vec![BoundingBox {
                x1: 0.0,
                y1: 0.0,
                x2: frame.width as f32,
                y2: frame.height as f32,
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Recognizer embedding a crop as its mean brightness, so a uniform
/// frame of value `v` lands at exactly `[v]`.
pub struct BrightnessRecognizer;

impl Recognizer for BrightnessRecognizer {
    fn embed(&self, crop: &Frame) -> Result<Embedding, InferenceError> {
        if crop.data.is_empty() {
            return Err(InferenceError("empty crop".into()));
        }
        let mean =
            crop.data.iter().map(|&p| p as f32).sum::<f32>() / crop.data.len() as f32;
        Ok(Embedding::new(vec![mean]))
    }
}
