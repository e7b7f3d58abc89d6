//! Frame capture boundary and crop handling.

use crate::types::BoundingBox;
use image::imageops::{self, FilterType};
use image::GrayImage;
use thiserror::Error;

/// Side length of the normalized square crop fed to the recognition model.
pub const CROP_SIZE: u32 = 112;

#[derive(Error, Debug, Clone)]
pub enum CaptureError {
    #[error("frame capture failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("bounding box ({x1:.0},{y1:.0})-({x2:.0},{y2:.0}) lies outside the frame")]
    EmptyCrop { x1: f32, y1: f32, x2: f32, y2: f32 },
}

/// A captured grayscale frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }
}

/// Source of camera frames. Implementations live outside the engine.
pub trait FrameSource: Send + Sync {
    fn capture_frame(&self) -> Result<Frame, CaptureError>;
}

/// Crop a detected face out of `frame` and scale it to [`CROP_SIZE`]².
///
/// The box is clamped to the frame bounds first; a box with no area left
/// inside the frame is an error.
pub fn crop_face(frame: &Frame, bbox: &BoundingBox) -> Result<Frame, FrameError> {
    let x1 = bbox.x1.max(0.0).min(frame.width as f32) as u32;
    let y1 = bbox.y1.max(0.0).min(frame.height as f32) as u32;
    let x2 = bbox.x2.max(0.0).min(frame.width as f32) as u32;
    let y2 = bbox.y2.max(0.0).min(frame.height as f32) as u32;

    if x2 <= x1 || y2 <= y1 {
        return Err(FrameError::EmptyCrop {
            x1: bbox.x1,
            y1: bbox.y1,
            x2: bbox.x2,
            y2: bbox.y2,
        });
    }

    let image = GrayImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or(FrameError::InvalidLength {
            expected: (frame.width as usize) * (frame.height as usize),
            actual: frame.data.len(),
        })?;

    let cropped = imageops::crop_imm(&image, x1, y1, x2 - x1, y2 - y1).to_image();
    let scaled = imageops::resize(&cropped, CROP_SIZE, CROP_SIZE, FilterType::Triangle);

    Frame::new(scaled.into_raw(), CROP_SIZE, CROP_SIZE)
}
