use crate::store::FaceStore;
use crate::types::{Embedding, UNKNOWN};

/// Maximum Euclidean distance at which a probe embedding still counts as
/// a match. Chosen empirically for the reference recognition model.
pub const MATCH_THRESHOLD: f32 = 6.0;

/// Strategy for naming a probe embedding from the known-face store.
pub trait Matcher {
    /// Name of the closest stored face, or [`UNKNOWN`] when nothing is
    /// close enough. An empty store always yields [`UNKNOWN`].
    fn name_for<'a>(&self, probe: &Embedding, store: &'a FaceStore) -> &'a str;
}

/// Nearest-neighbor matcher over Euclidean distance.
///
/// Scans every entry; ties go to the earliest stored entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanMatcher;

impl Matcher for EuclideanMatcher {
    fn name_for<'a>(&self, probe: &Embedding, store: &'a FaceStore) -> &'a str {
        let mut best: Option<(&str, f32)> = None;

        for (name, embedding) in store.entries() {
            let dist = probe.euclidean_distance(embedding);
            // Strict comparison keeps the first occurrence on ties.
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((name, dist));
            }
        }

        match best {
            Some((name, dist)) if dist < MATCH_THRESHOLD => name,
            _ => UNKNOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownFace;

    fn store_of(pairs: &[(&str, &[f32])]) -> FaceStore {
        FaceStore::from_faces(
            pairs
                .iter()
                .map(|(name, values)| KnownFace {
                    name: name.to_string(),
                    embedding: Embedding::new(values.to_vec()),
                })
                .collect(),
        )
    }

    #[test]
    fn test_minimum_distance_wins() {
        let store = store_of(&[
            ("alice", &[0.0, 0.0]),
            ("bob", &[3.0, 0.0]),
            ("carol", &[0.5, 0.0]),
        ]);
        let probe = Embedding::new(vec![0.6, 0.0]);
        assert_eq!(EuclideanMatcher.name_for(&probe, &store), "carol");
    }

    #[test]
    fn test_tie_breaks_to_first_entry() {
        let store = store_of(&[("alice", &[1.0, 0.0]), ("bob", &[-1.0, 0.0])]);
        let probe = Embedding::new(vec![0.0, 0.0]);
        assert_eq!(EuclideanMatcher.name_for(&probe, &store), "alice");
    }

    #[test]
    fn test_distance_at_threshold_is_unknown() {
        let store = store_of(&[("alice", &[0.0])]);
        let probe = Embedding::new(vec![MATCH_THRESHOLD]);
        assert_eq!(EuclideanMatcher.name_for(&probe, &store), UNKNOWN);
    }

    #[test]
    fn test_distance_just_under_threshold_matches() {
        let store = store_of(&[("alice", &[0.0])]);
        let probe = Embedding::new(vec![MATCH_THRESHOLD - 0.001]);
        assert_eq!(EuclideanMatcher.name_for(&probe, &store), "alice");
    }

    #[test]
    fn test_far_probe_is_unknown() {
        let store = store_of(&[("alice", &[0.0, 0.0]), ("bob", &[100.0, 100.0])]);
        let probe = Embedding::new(vec![50.0, 50.0]);
        assert_eq!(EuclideanMatcher.name_for(&probe, &store), UNKNOWN);
    }

    #[test]
    fn test_empty_store_is_unknown() {
        let store = FaceStore::new();
        let probe = Embedding::new(vec![1.0, 2.0]);
        assert_eq!(EuclideanMatcher.name_for(&probe, &store), UNKNOWN);
    }

    #[test]
    fn test_multiple_entries_per_name() {
        // Two reference embeddings for alice; the closer one carries the match.
        let store = store_of(&[
            ("alice", &[10.0, 0.0]),
            ("alice", &[0.0, 0.0]),
            ("bob", &[5.0, 0.0]),
        ]);
        let probe = Embedding::new(vec![1.0, 0.0]);
        assert_eq!(EuclideanMatcher.name_for(&probe, &store), "alice");
    }
}
