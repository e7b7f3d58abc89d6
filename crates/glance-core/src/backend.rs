//! External collaborators as child processes.
//!
//! The capture stack and the detection/recognition models live outside
//! this process, served by whatever inference host the deployment uses.
//! Each adapter runs a configured command, feeds it the image as PNG on
//! stdin, and parses what comes back on stdout: PNG frame bytes for
//! capture, JSON `[[x1, y1, x2, y2], ...]` for detection, a JSON float
//! array for recognition.

use crate::capture::{CaptureError, Frame, FrameSource};
use crate::infer::{Detector, InferenceError, Recognizer};
use crate::types::{BoundingBox, Embedding};
use image::GrayImage;
use std::io::Write;
use std::process::{Command, Stdio};

/// A command line split into program and arguments.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    /// Parse a whitespace-separated command line. Returns `None` for an
    /// empty line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Run the command to completion, optionally feeding `input` to its
    /// stdin, and return its stdout.
    fn run(&self, input: Option<&[u8]>) -> Result<Vec<u8>, String> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| format!("failed to spawn {}: {e}", self.program))?;

        // Feed stdin from a separate thread so a child that fills its
        // stdout pipe before draining stdin cannot deadlock us.
        let writer = match (input, child.stdin.take()) {
            (Some(bytes), Some(mut stdin)) => {
                let bytes = bytes.to_vec();
                Some(std::thread::spawn(move || {
                    let _ = stdin.write_all(&bytes);
                }))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| format!("failed to read output of {}: {e}", self.program))?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        if !output.status.success() {
            return Err(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(output.stdout)
    }
}

fn encode_png(frame: &Frame) -> Result<Vec<u8>, String> {
    let image = GrayImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| "frame buffer does not match its dimensions".to_string())?;
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| format!("png encode failed: {e}"))?;
    Ok(bytes)
}

/// Frame source backed by an external capture command printing one
/// image to stdout per invocation.
pub struct CommandFrameSource {
    spec: CommandSpec,
}

impl CommandFrameSource {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl FrameSource for CommandFrameSource {
    fn capture_frame(&self) -> Result<Frame, CaptureError> {
        let bytes = self.spec.run(None).map_err(CaptureError::Failed)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| CaptureError::Failed(format!("capture output is not an image: {e}")))?
            .to_luma8();
        let (width, height) = image.dimensions();
        Frame::new(image.into_raw(), width, height)
            .map_err(|e| CaptureError::Failed(e.to_string()))
    }
}

/// Detector backed by an external command reading PNG on stdin and
/// printing bounding boxes as JSON.
pub struct CommandDetector {
    spec: CommandSpec,
}

impl CommandDetector {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl Detector for CommandDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, InferenceError> {
        let png = encode_png(frame).map_err(InferenceError)?;
        let stdout = self.spec.run(Some(&png)).map_err(InferenceError)?;

        let boxes: Vec<[f32; 4]> = serde_json::from_slice(&stdout)
            .map_err(|e| InferenceError(format!("bad detection output: {e}")))?;
        Ok(boxes
            .into_iter()
            .map(|[x1, y1, x2, y2]| BoundingBox { x1, y1, x2, y2 })
            .collect())
    }
}

/// Recognizer backed by an external command reading a PNG crop on stdin
/// and printing the embedding as a JSON float array.
pub struct CommandRecognizer {
    spec: CommandSpec,
}

impl CommandRecognizer {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl Recognizer for CommandRecognizer {
    fn embed(&self, crop: &Frame) -> Result<Embedding, InferenceError> {
        let png = encode_png(crop).map_err(InferenceError)?;
        let stdout = self.spec.run(Some(&png)).map_err(InferenceError)?;

        let values: Vec<f32> = serde_json::from_slice(&stdout)
            .map_err(|e| InferenceError(format!("bad embedding output: {e}")))?;
        if values.is_empty() {
            return Err(InferenceError("empty embedding".into()));
        }
        Ok(Embedding::new(values))
    }
}
