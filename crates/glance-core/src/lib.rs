//! glance-core — presence tracking around external face inference.
//!
//! A background worker captures frames, runs bounded detection and
//! recognition calls, matches the resulting embeddings against a
//! persisted store of known faces, and maintains a shared set of
//! currently-present names for consumers to snapshot.

pub mod backend;
pub mod capture;
pub mod config;
pub mod context;
pub mod enroll;
pub mod infer;
pub mod matcher;
pub mod pipeline;
pub mod store;
pub mod tracker;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_utils;

pub use capture::{Frame, FrameSource};
pub use config::Config;
pub use context::Context;
pub use infer::{Detector, Recognizer};
pub use matcher::{EuclideanMatcher, Matcher, MATCH_THRESHOLD};
pub use store::FaceStore;
pub use tracker::PresenceTracker;
pub use types::{BoundingBox, Embedding, KnownFace, UNKNOWN};
pub use worker::{Worker, WorkerHandle};
