//! Persisted store of known-face embeddings.
//!
//! A single JSON document with two index-aligned sequences,
//! `known_encodings` and `known_names`. The store is only ever replaced
//! wholesale: enrollment rebuilds it from the reference images on disk,
//! so entries whose images were removed disappear on the next relearn.

use crate::types::{Embedding, KnownFace};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store file not found: {0}")]
    NotFound(PathBuf),
    #[error("store file is corrupt: {0}")]
    Corrupt(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk layout of the store file.
#[derive(Deserialize)]
struct StoreFile {
    known_encodings: Vec<Embedding>,
    known_names: Vec<String>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    known_encodings: &'a [Embedding],
    known_names: &'a [String],
}

/// In-memory set of known faces: embeddings and names, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceStore {
    encodings: Vec<Embedding>,
    names: Vec<String>,
}

impl FaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from accumulated (name, embedding) pairs.
    pub fn from_faces(faces: Vec<KnownFace>) -> Self {
        let mut store = Self::new();
        for face in faces {
            store.push(face);
        }
        store
    }

    pub fn push(&mut self, face: KnownFace) {
        self.encodings.push(face.embedding);
        self.names.push(face.name);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate (name, embedding) pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Embedding)> + '_ {
        self.names.iter().map(String::as_str).zip(&self.encodings)
    }

    /// Load the store from `path`.
    ///
    /// A missing file is [`StoreError::NotFound`] so the caller can decide
    /// whether to bootstrap via enrollment. Malformed JSON or misaligned
    /// sequences are [`StoreError::Corrupt`].
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let file: StoreFile =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if file.known_encodings.len() != file.known_names.len() {
            return Err(StoreError::Corrupt(format!(
                "{} encodings but {} names",
                file.known_encodings.len(),
                file.known_names.len()
            )));
        }

        Ok(Self {
            encodings: file.known_encodings,
            names: file.known_names,
        })
    }

    /// Persist the store to `path`, replacing any previous contents.
    ///
    /// Writes a temporary file in the target directory and renames it over
    /// the destination, so a concurrent `load` sees either the old or the
    /// new store, never a partial write.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let file = StoreFileRef {
            known_encodings: &self.encodings,
            known_names: &self.names,
        };
        let json =
            serde_json::to_vec_pretty(&file).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut out = fs::File::create(&tmp)?;
            out.write_all(&json)?;
            out.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
