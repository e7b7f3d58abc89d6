//! The per-tick recognition pass: capture → detect → crop → recognize
//! → match.

use crate::capture::{crop_face, CaptureError, FrameSource};
use crate::context::Context;
use crate::infer::{
    call_with_timeout, CallError, Detector, Recognizer, DETECT_TIMEOUT, RECOGNIZE_TIMEOUT,
};
use crate::matcher::{EuclideanMatcher, Matcher};
use crate::store::{FaceStore, StoreError};
use crate::types::UNKNOWN;
use std::sync::Arc;
use thiserror::Error;

/// A whole-pass failure: nothing usable came out of this tick.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("known-face store unavailable: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("face detection failed: {0}")]
    Detect(#[from] CallError),
}

pub struct RecognitionPipeline {
    ctx: Arc<Context>,
    matcher: EuclideanMatcher,
}

impl RecognitionPipeline {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            matcher: EuclideanMatcher,
        }
    }

    /// Run one full recognition pass and return the recognized names.
    ///
    /// `Ok(vec![])` means the pass worked but nobody known was seen.
    /// `Err` means the pass as a whole produced nothing: no frame, no
    /// detection result, or an unreadable store. A failed crop or
    /// recognition only skips that one face.
    pub fn run_once(&self) -> Result<Vec<String>, PipelineError> {
        let store = FaceStore::load(&self.ctx.store_path)?;

        let frame = self.ctx.source.capture_frame()?;

        let detector = Arc::clone(&self.ctx.detector);
        let detect_frame = frame.clone();
        let detections =
            call_with_timeout(move || detector.detect(&detect_frame), DETECT_TIMEOUT)?;
        tracing::debug!(faces = detections.len(), "detection pass complete");

        let mut names = Vec::new();
        for bbox in &detections {
            let crop = match crop_face(&frame, bbox) {
                Ok(crop) => crop,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping face: crop failed");
                    continue;
                }
            };

            let recognizer = Arc::clone(&self.ctx.recognizer);
            let embedding =
                match call_with_timeout(move || recognizer.embed(&crop), RECOGNIZE_TIMEOUT) {
                    Ok(embedding) => embedding,
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping face: recognition failed");
                        continue;
                    }
                };

            let name = self.matcher.name_for(&embedding, &store);
            if name != UNKNOWN {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        context_with, uniform_frame, BrightnessRecognizer, ScriptedDetector, StaticFrameSource,
    };
    use crate::types::{BoundingBox, Embedding, KnownFace};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn full_frame_box() -> BoundingBox {
        BoundingBox { x1: 0.0, y1: 0.0, x2: 64.0, y2: 64.0 }
    }

    fn save_store(path: &std::path::Path, pairs: &[(&str, f32)]) {
        FaceStore::from_faces(
            pairs
                .iter()
                .map(|(name, value)| KnownFace {
                    name: name.to_string(),
                    embedding: Embedding::new(vec![*value]),
                })
                .collect(),
        )
        .save(path)
        .unwrap();
    }

    #[test]
    fn test_matched_face_is_named() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            Arc::new(StaticFrameSource::ok(uniform_frame(64, 64, 100))),
            Arc::new(ScriptedDetector::boxes(vec![full_frame_box()])),
            Arc::new(BrightnessRecognizer),
        );
        save_store(&ctx.store_path, &[("alice", 100.0), ("bob", 200.0)]);

        let names = RecognitionPipeline::new(Arc::new(ctx)).run_once().unwrap();
        assert_eq!(names, vec!["alice".to_string()]);
    }

    #[test]
    fn test_unknown_faces_are_filtered() {
        let dir = tempdir().unwrap();
        // Frame brightness 100 is nowhere near the stored embedding.
        let ctx = context_with(
            dir.path(),
            Arc::new(StaticFrameSource::ok(uniform_frame(64, 64, 100))),
            Arc::new(ScriptedDetector::boxes(vec![full_frame_box()])),
            Arc::new(BrightnessRecognizer),
        );
        save_store(&ctx.store_path, &[("alice", 200.0)]);

        let names = RecognitionPipeline::new(Arc::new(ctx)).run_once().unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_no_detections_is_empty_not_error() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            Arc::new(StaticFrameSource::ok(uniform_frame(64, 64, 100))),
            Arc::new(ScriptedDetector::boxes(Vec::new())),
            Arc::new(BrightnessRecognizer),
        );
        save_store(&ctx.store_path, &[("alice", 100.0)]);

        let names = RecognitionPipeline::new(Arc::new(ctx)).run_once().unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_capture_failure_fails_the_pass() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            Arc::new(StaticFrameSource::failing("lens cap on")),
            Arc::new(ScriptedDetector::boxes(Vec::new())),
            Arc::new(BrightnessRecognizer),
        );
        save_store(&ctx.store_path, &[("alice", 100.0)]);

        let result = RecognitionPipeline::new(Arc::new(ctx)).run_once();
        assert!(matches!(result, Err(PipelineError::Capture(_))));
    }

    #[test]
    fn test_detection_failure_fails_the_pass() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            Arc::new(StaticFrameSource::ok(uniform_frame(64, 64, 100))),
            Arc::new(ScriptedDetector::failing("accelerator offline")),
            Arc::new(BrightnessRecognizer),
        );
        save_store(&ctx.store_path, &[("alice", 100.0)]);

        let result = RecognitionPipeline::new(Arc::new(ctx)).run_once();
        assert!(matches!(result, Err(PipelineError::Detect(_))));
    }

    #[test]
    fn test_missing_store_fails_the_pass() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            Arc::new(StaticFrameSource::ok(uniform_frame(64, 64, 100))),
            Arc::new(ScriptedDetector::boxes(Vec::new())),
            Arc::new(BrightnessRecognizer),
        );

        let result = RecognitionPipeline::new(Arc::new(ctx)).run_once();
        assert!(matches!(
            result,
            Err(PipelineError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn test_bad_crop_skips_that_face_only() {
        let dir = tempdir().unwrap();
        // First box lies entirely outside the frame; the second is fine.
        let outside = BoundingBox { x1: 500.0, y1: 500.0, x2: 600.0, y2: 600.0 };
        let ctx = context_with(
            dir.path(),
            Arc::new(StaticFrameSource::ok(uniform_frame(64, 64, 100))),
            Arc::new(ScriptedDetector::boxes(vec![outside, full_frame_box()])),
            Arc::new(BrightnessRecognizer),
        );
        save_store(&ctx.store_path, &[("alice", 100.0)]);

        let names = RecognitionPipeline::new(Arc::new(ctx)).run_once().unwrap();
        assert_eq!(names, vec!["alice".to_string()]);
    }
}
