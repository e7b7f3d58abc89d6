use std::sync::{Mutex, MutexGuard};

/// Thread-safe owner of the set of identities currently in front of the
/// camera.
///
/// The set only changes through [`reconcile`](Self::reconcile): a failed
/// recognition pass clears it, a pass against an empty set adopts the
/// detected names verbatim, and otherwise names absent from the latest
/// pass are removed. Names are never added to a non-empty set, so a
/// newcomer only shows up once the set has emptied out.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    present: Mutex<Vec<String>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one recognition pass into the presence set.
    ///
    /// `None` marks a failed pass; `Some` carries the recognized names,
    /// possibly empty. The whole replacement happens under the lock, so
    /// readers observe the set before or after a pass, never mid-update.
    pub fn reconcile(&self, detected: Option<Vec<String>>) {
        let mut present = self.lock();
        match detected {
            None => present.clear(),
            Some(names) => {
                if present.is_empty() {
                    *present = names;
                } else {
                    present.retain(|name| names.contains(name));
                }
            }
        }
        tracing::trace!(present = ?*present, "presence reconciled");
    }

    /// Copy of the presence set at this instant. Never hands out the
    /// live structure.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        match self.present.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
