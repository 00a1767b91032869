use crate::model::Snapshot;
use tokio::sync::watch;

/// Holder of the last accepted snapshot and the two transient UI flags.
///
/// Readers get copies; writes are crate-private and come from the projector.
#[derive(Debug)]
pub struct SnapshotStore {
    snapshot: watch::Sender<Option<Snapshot>>,
    /// Saves in flight; busy while non-zero
    busy: watch::Sender<usize>,
    highlighted: watch::Sender<Option<String>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshot: watch::Sender::new(None),
            busy: watch::Sender::new(0),
            highlighted: watch::Sender::new(None),
        }
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow() > 0
    }

    /// Address currently being pinged.
    pub fn highlighted(&self) -> Option<String> {
        self.highlighted.borrow().clone()
    }

    pub(crate) fn replace(&self, snapshot: Snapshot) {
        self.snapshot.send_replace(Some(snapshot));
    }

    /// Applies `patch` to the current snapshot and returns the result.
    /// `None` when nothing has been loaded yet.
    pub(crate) fn patch<F>(&self, patch: F) -> Option<Snapshot>
    where
        F: FnOnce(&Snapshot) -> Snapshot,
    {
        let mut patched = None;
        self.snapshot.send_if_modified(|current| {
            let Some(snapshot) = current.as_ref() else {
                return false;
            };
            let next = patch(snapshot);
            *current = Some(next.clone());
            patched = Some(next);
            true
        });
        patched
    }

    /// Like `patch`, but starts from `seed` when nothing is loaded.
    pub(crate) fn patch_or_seed<F, S>(&self, patch: F, seed: S) -> Snapshot
    where
        F: FnOnce(&Snapshot) -> Snapshot,
        S: FnOnce() -> Snapshot,
    {
        let mut result = None;
        self.snapshot.send_modify(|current| {
            let next = match current.as_ref() {
                Some(snapshot) => patch(snapshot),
                None => seed(),
            };
            *current = Some(next.clone());
            result = Some(next);
        });
        // send_modify always runs the closure
        result.unwrap_or_else(|| Snapshot::from_envelope(Default::default()))
    }

    pub(crate) fn begin_busy(&self) {
        self.busy.send_modify(|n| *n += 1);
    }

    pub(crate) fn end_busy(&self) {
        self.busy.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub(crate) fn set_highlighted(&self, address: &str) {
        self.highlighted.send_replace(Some(address.to_string()));
    }

    /// Clears the highlight unless a later ping already took it over.
    pub(crate) fn clear_highlighted(&self, address: &str) {
        self.highlighted.send_if_modified(|current| {
            if current.as_deref() == Some(address) {
                *current = None;
                true
            } else {
                false
            }
        });
    }
}
