//! Enrollment: capture reference images of a new identity and rebuild
//! the known-face store from everything on disk.

use crate::capture::{crop_face, CaptureError, Frame, FrameError, FrameSource};
use crate::context::Context;
use crate::infer::{call_with_timeout, CallError, Detector, Recognizer, DETECT_TIMEOUT, RECOGNIZE_TIMEOUT};
use crate::store::{FaceStore, StoreError};
use crate::types::{Embedding, KnownFace};
use image::GrayImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Reference images captured per enrollment.
pub const DEFAULT_CAPTURES: usize = 5;

const COUNTDOWN_FROM: u32 = 3;

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
}

/// Why a single reference image produced no embedding.
#[derive(Error, Debug)]
enum EncodeError {
    #[error("unreadable image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("no face detected")]
    NoFace,
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Capture `count` reference images of a new identity.
///
/// Interactive and fully blocking: a 3-2-1 countdown runs before each
/// shot so the subject can reposition. Must not run while the worker
/// loop is active; pause the worker first.
pub fn capture_identity(ctx: &Context, name: &str, count: usize) -> Result<(), EnrollError> {
    let person_dir = ctx.faces_dir.join(name);
    fs::create_dir_all(&person_dir)?;
    tracing::info!(dir = %person_dir.display(), "enrolling new identity");

    println!("Move your face a little for each picture.");
    for shot in 0..count {
        println!("Taking picture {} of {count} in...", shot + 1);
        for step in (1..=COUNTDOWN_FROM).rev() {
            println!("{step}");
            thread::sleep(Duration::from_secs(1));
        }

        let path = person_dir.join(format!("{name}_scan{shot}.jpg"));
        match capture_to_file(ctx.source.as_ref(), &path) {
            Ok(()) => tracing::info!(path = %path.display(), "reference image saved"),
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "failed to save reference image")
            }
        }
    }
    Ok(())
}

fn capture_to_file(source: &dyn FrameSource, path: &Path) -> Result<(), EnrollError> {
    let frame = source.capture_frame()?;
    let image = GrayImage::from_raw(frame.width, frame.height, frame.data).ok_or_else(|| {
        CaptureError::Failed("frame buffer does not match its dimensions".into())
    })?;
    image.save(path)?;
    Ok(())
}

/// Rebuild the known-face store from every reference image on disk.
///
/// The store is replaced wholesale, so identities whose images were
/// deleted disappear, and a person whose images all fail to encode ends
/// up with no entries at all. Per-image failures are logged and skipped;
/// only a failure to write the finished store is an error, in which case
/// the previous store file is left untouched.
pub fn relearn_all(ctx: &Context) -> Result<(), EnrollError> {
    tracing::info!(dir = %ctx.faces_dir.display(), "rebuilding known-face store");
    fs::create_dir_all(&ctx.faces_dir)?;

    let mut faces = Vec::new();
    for person_dir in sorted_children(&ctx.faces_dir, |path| path.is_dir())? {
        let person = match person_dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };

        let mut encoded = 0usize;
        for image_path in sorted_children(&person_dir, |path| is_reference_image(path))? {
            match encode_reference(ctx, &image_path) {
                Ok(embedding) => {
                    faces.push(KnownFace {
                        name: person.clone(),
                        embedding,
                    });
                    encoded += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        image = %image_path.display(),
                        person = %person,
                        "skipping reference image"
                    );
                }
            }
        }

        if encoded == 0 {
            tracing::warn!(person = %person, "no usable reference images; person gets no entries");
        }
    }

    let store = FaceStore::from_faces(faces);
    tracing::info!(entries = store.len(), "saving rebuilt store");
    if let Err(e) = store.save(&ctx.store_path) {
        tracing::error!(
            error = %e,
            path = %ctx.store_path.display(),
            "failed to save known-face store; previous contents kept"
        );
        return Err(e.into());
    }
    Ok(())
}

/// Encode one reference image: detect, take the first face, crop, embed.
///
/// Reference images are assumed to contain a single face; extra
/// detections are ignored.
fn encode_reference(ctx: &Context, path: &Path) -> Result<Embedding, EncodeError> {
    let image = image::open(path)?.to_luma8();
    let (width, height) = image.dimensions();
    let frame = Frame::new(image.into_raw(), width, height)?;

    let detector = Arc::clone(&ctx.detector);
    let detect_frame = frame.clone();
    let detections = call_with_timeout(move || detector.detect(&detect_frame), DETECT_TIMEOUT)?;
    let bbox = detections.first().copied().ok_or(EncodeError::NoFace)?;

    let crop = crop_face(&frame, &bbox)?;
    let recognizer = Arc::clone(&ctx.recognizer);
    let embedding = call_with_timeout(move || recognizer.embed(&crop), RECOGNIZE_TIMEOUT)?;
    Ok(embedding)
}

fn is_reference_image(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ext == "jpg" || ext == "jpeg" || ext == "png"
        })
        .unwrap_or(false)
}

/// Children of `dir` passing `keep`, sorted by name for deterministic
/// store ordering.
fn sorted_children(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| keep(path))
        .collect();
    children.sort();
    Ok(children)
}
